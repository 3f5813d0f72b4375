use std::fmt;

pub use kurbo::{Point, Vec2};

/// Field position in steps: `x` from the south end zone, `y` from the west sideline.
pub type Coordinate = Point;

/// Whole-beat count used for segment and sheet durations.
pub type Beats = u32;

/// Maximum distance (in steps) at which two positions are considered the same.
pub const POSITION_EPSILON: f64 = 1e-3;

/// Minimum spacing (in steps) two dots must keep to avoid a collision.
pub const COLLISION_SPACING: f64 = 1.0;

/// Stable identifier (label) of a marcher, shared across all sheets.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct DotId(String);

impl DotId {
    /// Create an identifier from a label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Borrow the label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DotId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DotId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for DotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bearing in Calchart degrees, normalized to `[0, 360)`.
///
/// 0° faces east (+y), 90° north (+x), 180° west (−y) and 270° south (−x).
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Angle(f64);

impl Angle {
    /// Facing the east sideline.
    pub const EAST: Angle = Angle(0.0);
    /// Facing the north end zone.
    pub const NORTH: Angle = Angle(90.0);
    /// Facing the west sideline.
    pub const WEST: Angle = Angle(180.0);
    /// Facing the south end zone.
    pub const SOUTH: Angle = Angle(270.0);

    /// Normalize an arbitrary degree value into `[0, 360)`.
    pub fn new(degrees: f64) -> Self {
        let d = degrees.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative inputs.
        if d >= 360.0 { Self(0.0) } else { Self(d) }
    }

    /// Value in Calchart degrees.
    pub fn degrees(self) -> f64 {
        self.0
    }

    /// Unit step vector pointing along this bearing.
    pub fn unit_vector(self) -> Vec2 {
        let (sin, cos) = self.0.to_radians().sin_cos();
        // Drop the rounding residue so cardinal bearings stay on grid lines.
        let snap = |v: f64| if v.abs() < 1e-12 { 0.0 } else { v };
        Vec2::new(snap(sin), snap(cos))
    }

    /// Bearing of a displacement, or `None` for a zero-length vector.
    pub fn of_displacement(v: Vec2) -> Option<Self> {
        if v.hypot() <= f64::EPSILON {
            return None;
        }
        Some(Self::new(v.x.atan2(v.y).to_degrees()))
    }

    /// Rotate by a signed number of degrees.
    pub fn rotated(self, degrees: f64) -> Self {
        Self::new(self.0 + degrees)
    }

    /// Smallest absolute difference to `other`, in `[0, 180]`.
    pub fn separation(self, other: Angle) -> f64 {
        let d = (self.0 - other.0).rem_euclid(360.0);
        d.min(360.0 - d)
    }
}

impl From<f64> for Angle {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Angle> for f64 {
    fn from(value: Angle) -> Self {
        value.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

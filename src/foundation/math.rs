use crate::foundation::core::{Coordinate, POSITION_EPSILON};

pub(crate) fn points_close(a: Coordinate, b: Coordinate) -> bool {
    a.distance(b) <= POSITION_EPSILON
}

/// Linear interpolation between two positions.
pub(crate) fn lerp_point(a: Coordinate, b: Coordinate, t: f64) -> Coordinate {
    Coordinate::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

/// Fraction `num / den`, treating an empty span as already complete.
pub(crate) fn progress(num: f64, den: f64) -> f64 {
    if den <= 0.0 {
        1.0
    } else {
        (num / den).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;

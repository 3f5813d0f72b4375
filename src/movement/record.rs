use crate::{
    continuity::settings::StepType,
    foundation::core::{Angle, Beats, Coordinate},
    foundation::error::DrillError,
    foundation::math::points_close,
    movement::segment::{ArcSegment, EvenSegment, MoveSegment, MovementSegment, StopSegment},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Discriminator of a serialized movement record.
pub enum SegmentKind {
    /// [`MovementSegment::Move`].
    Move,
    /// [`MovementSegment::Even`].
    Even,
    /// [`MovementSegment::Stop`].
    Stop,
    /// [`MovementSegment::Arc`].
    Arc,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Flat, self-describing wire form of a [`MovementSegment`].
///
/// Endpoints are always written; variant fields are only present for the
/// variants that use them.
pub struct SegmentRecord {
    /// Segment variant.
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    /// Start x in steps.
    pub start_x: f64,
    /// Start y in steps.
    pub start_y: f64,
    /// End x in steps.
    pub end_x: f64,
    /// End y in steps.
    pub end_y: f64,
    /// Length in beats.
    pub duration: Beats,
    /// Bearing of travel (`Move`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Angle>,
    /// Distance per step (`Move`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_size: Option<f64>,
    /// Beats per step (`Move`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beats_per_step: Option<Beats>,
    /// Held facing (`Move`, `Even`, `Stop`, fixed-facing `Arc`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facing: Option<Angle>,
    /// Mark time (`true`) or close (`false`) (`Stop`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_time: Option<bool>,
    /// Rotation center x (`Arc`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_x: Option<f64>,
    /// Rotation center y (`Arc`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_y: Option<f64>,
    /// Signed sweep in degrees (`Arc`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degrees: Option<f64>,
    /// Step style (`Move`, `Even`, `Arc`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_type: Option<StepType>,
}

impl SegmentRecord {
    fn bare(kind: SegmentKind, start: Coordinate, end: Coordinate, duration: Beats) -> Self {
        Self {
            kind,
            start_x: start.x,
            start_y: start.y,
            end_x: end.x,
            end_y: end.y,
            duration,
            direction: None,
            step_size: None,
            beats_per_step: None,
            facing: None,
            mark_time: None,
            center_x: None,
            center_y: None,
            degrees: None,
            step_type: None,
        }
    }

    fn start(&self) -> Coordinate {
        Coordinate::new(self.start_x, self.start_y)
    }

    fn end(&self) -> Coordinate {
        Coordinate::new(self.end_x, self.end_y)
    }
}

impl From<MovementSegment> for SegmentRecord {
    fn from(seg: MovementSegment) -> Self {
        let (start, end, duration) = (seg.start(), seg.end(), seg.duration());
        match &seg {
            MovementSegment::Move(m) => Self {
                direction: Some(m.direction()),
                step_size: Some(m.step_size()),
                beats_per_step: Some(m.beats_per_step()),
                facing: Some(m.facing()),
                step_type: Some(m.step_type()),
                ..Self::bare(SegmentKind::Move, start, end, duration)
            },
            MovementSegment::Even(e) => Self {
                facing: Some(e.facing()),
                step_type: Some(e.step_type()),
                ..Self::bare(SegmentKind::Even, start, end, duration)
            },
            MovementSegment::Stop(s) => Self {
                facing: Some(s.facing()),
                mark_time: Some(s.is_mark_time()),
                ..Self::bare(SegmentKind::Stop, start, end, duration)
            },
            MovementSegment::Arc(a) => Self {
                center_x: Some(a.center().x),
                center_y: Some(a.center().y),
                degrees: Some(a.sweep_degrees()),
                facing: a.facing_override(),
                step_type: Some(a.step_type()),
                ..Self::bare(SegmentKind::Arc, start, end, duration)
            },
        }
    }
}

impl TryFrom<SegmentRecord> for MovementSegment {
    type Error = DrillError;

    fn try_from(r: SegmentRecord) -> Result<Self, Self::Error> {
        let step_type = r.step_type.unwrap_or_default();
        let seg: MovementSegment = match r.kind {
            SegmentKind::Move => {
                let direction = r
                    .direction
                    .ok_or_else(|| DrillError::serde("Move record requires 'direction'"))?;
                let bps = r
                    .beats_per_step
                    .ok_or_else(|| DrillError::serde("Move record requires 'beatsPerStep'"))?;
                let mut m = MoveSegment::new(r.start(), direction, 0, bps, step_type)?
                    .with_step_size(r.step_size.unwrap_or(1.0))?
                    .with_duration(r.duration);
                if let Some(facing) = r.facing {
                    m = m.with_facing(facing);
                }
                m.into()
            }
            SegmentKind::Even => {
                let facing = r
                    .facing
                    .or_else(|| Angle::of_displacement(r.end() - r.start()))
                    .unwrap_or(Angle::EAST);
                EvenSegment::new(r.start(), r.end(), r.duration, facing, step_type).into()
            }
            SegmentKind::Stop => {
                let facing = r.facing.unwrap_or(Angle::EAST);
                if r.mark_time.unwrap_or(true) {
                    StopSegment::mark_time(r.start(), r.duration, facing).into()
                } else {
                    StopSegment::close(r.start(), r.duration, facing).into()
                }
            }
            SegmentKind::Arc => {
                let (Some(cx), Some(cy), Some(degrees)) = (r.center_x, r.center_y, r.degrees)
                else {
                    return Err(DrillError::serde(
                        "Arc record requires 'centerX', 'centerY' and 'degrees'",
                    ));
                };
                let mut a = ArcSegment::new(
                    Coordinate::new(cx, cy),
                    r.start(),
                    degrees,
                    r.duration,
                    step_type,
                )?;
                if let Some(facing) = r.facing {
                    a = a.with_facing(facing);
                }
                a.into()
            }
        };

        if !points_close(seg.end(), r.end()) {
            return Err(DrillError::serde(format!(
                "{} record end ({}, {}) does not match its computed end ({}, {})",
                seg.kind(),
                r.end_x,
                r.end_y,
                seg.end().x,
                seg.end().y
            )));
        }
        Ok(seg)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/movement/record.rs"]
mod tests;

use crate::{
    continuity::settings::StepType,
    foundation::core::{Angle, Beats, Coordinate},
    foundation::error::{DrillError, DrillResult},
    foundation::math::{lerp_point, progress},
};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Position and facing of a dot at one instant.
pub struct AnimationState {
    /// Field position in steps.
    #[serde(flatten)]
    pub position: Coordinate,
    /// Facing direction in Calchart degrees.
    pub angle: Angle,
}

impl AnimationState {
    /// Bundle a position with a facing angle.
    pub fn new(position: Coordinate, angle: Angle) -> Self {
        Self { position, angle }
    }
}

/// One computed motion primitive of a dot's timeline.
///
/// Segments are immutable once built. `state_at` expects a local beat in
/// `[0, duration]`; the resolver never asks outside that range.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(
    into = "crate::movement::record::SegmentRecord",
    try_from = "crate::movement::record::SegmentRecord"
)]
pub enum MovementSegment {
    /// Whole-step translation along a fixed bearing.
    Move(MoveSegment),
    /// Constant-velocity glide between two known points.
    Even(EvenSegment),
    /// Stationary mark time or close.
    Stop(StopSegment),
    /// Rotation around a fixed center.
    Arc(ArcSegment),
}

impl MovementSegment {
    /// Position where the segment begins.
    pub fn start(&self) -> Coordinate {
        match self {
            Self::Move(m) => m.start,
            Self::Even(e) => e.start,
            Self::Stop(s) => s.position,
            Self::Arc(a) => a.start,
        }
    }

    /// Position where the segment ends.
    pub fn end(&self) -> Coordinate {
        match self {
            Self::Move(m) => m.end(),
            Self::Even(e) => e.end,
            Self::Stop(s) => s.position,
            Self::Arc(a) => a.end(),
        }
    }

    /// Length in beats.
    pub fn duration(&self) -> Beats {
        match self {
            Self::Move(m) => m.duration,
            Self::Even(e) => e.duration,
            Self::Stop(s) => s.duration,
            Self::Arc(a) => a.duration,
        }
    }

    /// Interpolated state `local_beat` beats into the segment.
    pub fn state_at(&self, local_beat: f64) -> AnimationState {
        match self {
            Self::Move(m) => m.state_at(local_beat),
            Self::Even(e) => e.state_at(local_beat),
            Self::Stop(s) => s.state_at(),
            Self::Arc(a) => a.state_at(local_beat),
        }
    }

    /// Facing held at the segment's last beat.
    pub fn final_facing(&self) -> Angle {
        self.state_at(f64::from(self.duration())).angle
    }

    /// Discriminator used in serialized records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Move(_) => "Move",
            Self::Even(_) => "Even",
            Self::Stop(_) => "Stop",
            Self::Arc(_) => "Arc",
        }
    }

    /// Copy of this segment cut down to `beats`; longer requests return it unchanged.
    pub fn truncated(&self, beats: Beats) -> Self {
        if beats >= self.duration() {
            return self.clone();
        }
        match self {
            Self::Move(m) => Self::Move(MoveSegment {
                duration: beats,
                ..m.clone()
            }),
            Self::Even(e) => Self::Even(EvenSegment {
                end: e.state_at(f64::from(beats)).position,
                duration: beats,
                ..e.clone()
            }),
            Self::Stop(s) => Self::Stop(StopSegment {
                duration: beats,
                ..s.clone()
            }),
            Self::Arc(a) => Self::Arc(ArcSegment {
                sweep_degrees: a.sweep_degrees * progress(f64::from(beats), f64::from(a.duration)),
                duration: beats,
                ..a.clone()
            }),
        }
    }
}

impl From<MoveSegment> for MovementSegment {
    fn from(value: MoveSegment) -> Self {
        Self::Move(value)
    }
}

impl From<EvenSegment> for MovementSegment {
    fn from(value: EvenSegment) -> Self {
        Self::Even(value)
    }
}

impl From<StopSegment> for MovementSegment {
    fn from(value: StopSegment) -> Self {
        Self::Stop(value)
    }
}

impl From<ArcSegment> for MovementSegment {
    fn from(value: ArcSegment) -> Self {
        Self::Arc(value)
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Translation in whole steps along `direction`.
pub struct MoveSegment {
    start: Coordinate,
    direction: Angle,
    step_size: f64,
    beats_per_step: Beats,
    duration: Beats,
    facing: Angle,
    step_type: StepType,
}

impl MoveSegment {
    /// March `steps` unit steps along `direction`, facing the direction of travel.
    pub fn new(
        start: Coordinate,
        direction: Angle,
        steps: u32,
        beats_per_step: Beats,
        step_type: StepType,
    ) -> DrillResult<Self> {
        if beats_per_step == 0 {
            return Err(DrillError::validation("move beats_per_step must be > 0"));
        }
        Ok(Self {
            start,
            direction,
            step_size: 1.0,
            beats_per_step,
            duration: steps.saturating_mul(beats_per_step),
            facing: direction,
            step_type,
        })
    }

    /// Override the distance covered by each step (diagonals use √2).
    pub fn with_step_size(mut self, step_size: f64) -> DrillResult<Self> {
        if !step_size.is_finite() || step_size < 0.0 {
            return Err(DrillError::validation(
                "move step_size must be finite and >= 0",
            ));
        }
        self.step_size = step_size;
        Ok(self)
    }

    /// Set the length in beats directly; a trailing partial step holds position.
    pub fn with_duration(mut self, duration: Beats) -> Self {
        self.duration = duration;
        self
    }

    /// Override the facing angle held during the move.
    pub fn with_facing(mut self, facing: Angle) -> Self {
        self.facing = facing;
        self
    }

    /// Bearing of travel.
    pub fn direction(&self) -> Angle {
        self.direction
    }

    /// Distance covered per step.
    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// Beats taken by one step.
    pub fn beats_per_step(&self) -> Beats {
        self.beats_per_step
    }

    /// Facing held during the move.
    pub fn facing(&self) -> Angle {
        self.facing
    }

    /// Step style shown by the renderer.
    pub fn step_type(&self) -> StepType {
        self.step_type
    }

    /// Length in beats.
    pub fn duration(&self) -> Beats {
        self.duration
    }

    /// Whole steps completed by the end of the segment.
    pub fn steps(&self) -> u32 {
        self.duration / self.beats_per_step
    }

    /// Position after the final step.
    pub fn end(&self) -> Coordinate {
        self.position_after(self.steps())
    }

    fn position_after(&self, steps: u32) -> Coordinate {
        self.start + self.direction.unit_vector() * (self.step_size * f64::from(steps))
    }

    fn state_at(&self, local_beat: f64) -> AnimationState {
        let taken = (local_beat / f64::from(self.beats_per_step))
            .floor()
            .clamp(0.0, f64::from(self.steps()));
        AnimationState::new(self.position_after(taken as u32), self.facing)
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Constant-velocity movement whose speed is derived from its endpoints.
pub struct EvenSegment {
    start: Coordinate,
    end: Coordinate,
    duration: Beats,
    facing: Angle,
    step_type: StepType,
}

impl EvenSegment {
    /// Glide from `start` to `end` over `duration` beats.
    ///
    /// `facing` is held throughout; callers pass the travel bearing unless an
    /// orientation override is active.
    pub fn new(
        start: Coordinate,
        end: Coordinate,
        duration: Beats,
        facing: Angle,
        step_type: StepType,
    ) -> Self {
        Self {
            start,
            end,
            duration,
            facing,
            step_type,
        }
    }

    /// Facing held during the glide.
    pub fn facing(&self) -> Angle {
        self.facing
    }

    /// Step style shown by the renderer.
    pub fn step_type(&self) -> StepType {
        self.step_type
    }

    fn state_at(&self, local_beat: f64) -> AnimationState {
        let t = progress(local_beat, f64::from(self.duration));
        AnimationState::new(lerp_point(self.start, self.end, t), self.facing)
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Stationary segment: mark time in place, or a closed halt.
pub struct StopSegment {
    position: Coordinate,
    duration: Beats,
    facing: Angle,
    mark_time: bool,
}

impl StopSegment {
    /// Mark time in place (animated, positionally static).
    pub fn mark_time(position: Coordinate, duration: Beats, facing: Angle) -> Self {
        Self {
            position,
            duration,
            facing,
            mark_time: true,
        }
    }

    /// Halt and hold `facing`.
    pub fn close(position: Coordinate, duration: Beats, facing: Angle) -> Self {
        Self {
            position,
            duration,
            facing,
            mark_time: false,
        }
    }

    /// Held facing.
    pub fn facing(&self) -> Angle {
        self.facing
    }

    /// `true` for mark time, `false` for close.
    pub fn is_mark_time(&self) -> bool {
        self.mark_time
    }

    fn state_at(&self) -> AnimationState {
        AnimationState::new(self.position, self.facing)
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Rotation around `center` at constant angular velocity.
pub struct ArcSegment {
    center: Coordinate,
    start: Coordinate,
    sweep_degrees: f64,
    duration: Beats,
    facing: Option<Angle>,
    step_type: StepType,
}

impl ArcSegment {
    /// Sweep `sweep_degrees` (signed, positive increases the bearing from the
    /// center) over `duration` beats.
    pub fn new(
        center: Coordinate,
        start: Coordinate,
        sweep_degrees: f64,
        duration: Beats,
        step_type: StepType,
    ) -> DrillResult<Self> {
        if !sweep_degrees.is_finite() {
            return Err(DrillError::validation("arc sweep must be finite"));
        }
        Ok(Self {
            center,
            start,
            sweep_degrees,
            duration,
            facing: None,
            step_type,
        })
    }

    /// Hold a fixed facing instead of facing along the tangent.
    pub fn with_facing(mut self, facing: Angle) -> Self {
        self.facing = Some(facing);
        self
    }

    /// Rotation center.
    pub fn center(&self) -> Coordinate {
        self.center
    }

    /// Signed sweep in degrees.
    pub fn sweep_degrees(&self) -> f64 {
        self.sweep_degrees
    }

    /// Fixed facing override, if any.
    pub fn facing_override(&self) -> Option<Angle> {
        self.facing
    }

    /// Step style shown by the renderer.
    pub fn step_type(&self) -> StepType {
        self.step_type
    }

    /// Distance from the center.
    pub fn radius(&self) -> f64 {
        self.start.distance(self.center)
    }

    /// Position once the full sweep has completed.
    pub fn end(&self) -> Coordinate {
        self.state_at(f64::from(self.duration)).position
    }

    fn state_at(&self, local_beat: f64) -> AnimationState {
        let swept = self.sweep_degrees * progress(local_beat, f64::from(self.duration));
        let Some(initial) = Angle::of_displacement(self.start - self.center) else {
            // Zero radius: pivot in place.
            let facing = self.facing.unwrap_or(Angle::EAST.rotated(swept));
            return AnimationState::new(self.center, facing);
        };
        let bearing = initial.rotated(swept);
        let position = self.center + bearing.unit_vector() * self.radius();
        let tangent = if self.sweep_degrees >= 0.0 {
            bearing.rotated(90.0)
        } else {
            bearing.rotated(-90.0)
        };
        AnimationState::new(position, self.facing.unwrap_or(tangent))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/movement/segment.rs"]
mod tests;

use std::collections::BTreeMap;

use crate::{
    continuity::grid::{Diagonal, FountainGrid, Grapevine},
    continuity::line::LineRule,
    continuity::settings::{Overrides, ResolvedSettings},
    foundation::core::{Angle, Beats, Coordinate, DotId},
    foundation::error::{DrillError, DrillResult},
    movement::segment::{ArcSegment, EvenSegment, MoveSegment, MovementSegment, StopSegment},
};

/// Lookup of where each dot stands at the start of a sheet.
///
/// Line rules (follow-the-leader, counter march) trace the positions of the
/// dots ahead of them, so they need the whole formation, not just their own dot.
pub trait Formation {
    /// Start position of `dot`, if it is on the field.
    fn position_of(&self, dot: &DotId) -> Option<Coordinate>;
}

impl Formation for BTreeMap<DotId, Coordinate> {
    fn position_of(&self, dot: &DotId) -> Option<Coordinate> {
        self.get(dot).copied()
    }
}

/// Everything a rule needs to produce movements for one dot.
pub struct RuleContext<'a> {
    /// Dot being moved.
    pub dot: &'a DotId,
    /// Where the dot is when this rule begins.
    pub start: Coordinate,
    /// Facing the dot holds when this rule begins.
    pub facing: Angle,
    /// Beats left on the sheet.
    pub remaining: Beats,
    /// The dot's declared position on the next sheet, if there is one.
    pub next_position: Option<Coordinate>,
    /// Start positions of every dot on the sheet.
    pub formation: &'a dyn Formation,
    /// Rule settings after resolving defaults.
    pub settings: ResolvedSettings,
}

impl RuleContext<'_> {
    /// Target position for destination rules; stays put on the final sheet.
    pub(crate) fn destination(&self) -> Coordinate {
        self.next_position.unwrap_or(self.start)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
/// Declarative movement instruction attached to a dot type on a sheet.
pub enum ContinuityRule {
    /// March a fixed number of steps in one direction.
    ForwardMarch(ForwardMarch),
    /// Glide evenly to the next formation over the remaining beats.
    EvenStep(EvenStep),
    /// Mark time in place.
    MarkTime(StopRule),
    /// Close (halt) in place.
    Close(StopRule),
    /// Move along one field axis, then the other.
    FountainGrid(FountainGrid),
    /// Diagonal then straight (or the reverse).
    Diagonal(Diagonal),
    /// Cyclic line following.
    CounterMarch(LineRule),
    /// Terminal line following.
    FollowLeader(LineRule),
    /// Rotate around a fixed point.
    GateTurn(GateTurn),
    /// Alternate axes one step at a time.
    Grapevine(Grapevine),
    /// Alternate axes two steps at a time.
    TwoStep(Grapevine),
}

impl ContinuityRule {
    /// Overrides carried by this rule.
    pub fn overrides(&self) -> &Overrides {
        match self {
            Self::ForwardMarch(r) => &r.settings,
            Self::EvenStep(r) => &r.settings,
            Self::MarkTime(r) | Self::Close(r) => &r.settings,
            Self::FountainGrid(r) => &r.settings,
            Self::Diagonal(r) => &r.settings,
            Self::CounterMarch(r) | Self::FollowLeader(r) => &r.settings,
            Self::GateTurn(r) => &r.settings,
            Self::Grapevine(r) | Self::TwoStep(r) => &r.settings,
        }
    }

    /// Type discriminator as written in JSON.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ForwardMarch(_) => "ForwardMarch",
            Self::EvenStep(_) => "EvenStep",
            Self::MarkTime(_) => "MarkTime",
            Self::Close(_) => "Close",
            Self::FountainGrid(_) => "FountainGrid",
            Self::Diagonal(_) => "Diagonal",
            Self::CounterMarch(_) => "CounterMarch",
            Self::FollowLeader(_) => "FollowLeader",
            Self::GateTurn(_) => "GateTurn",
            Self::Grapevine(_) => "Grapevine",
            Self::TwoStep(_) => "TwoStep",
        }
    }

    /// Structural checks done when a rule enters a show.
    pub fn validate(&self) -> DrillResult<()> {
        self.overrides().validate(self.kind())?;
        match self {
            Self::CounterMarch(r) | Self::FollowLeader(r) => r.validate(self.kind()),
            Self::GateTurn(r) => r.validate(),
            _ => Ok(()),
        }
    }

    /// Movements for one dot, in order.
    ///
    /// Rules may return more beats than `ctx.remaining`; the timeline builder
    /// clamps them.
    pub fn movements(&self, ctx: &RuleContext<'_>) -> DrillResult<Vec<MovementSegment>> {
        match self {
            Self::ForwardMarch(r) => r.movements(ctx),
            Self::EvenStep(_) => Ok(even_step(ctx)),
            Self::MarkTime(r) => Ok(r.movements(ctx, true)),
            Self::Close(r) => Ok(r.movements(ctx, false)),
            Self::FountainGrid(r) => r.movements(ctx),
            Self::Diagonal(r) => r.movements(ctx),
            Self::CounterMarch(r) => r.movements(ctx, true),
            Self::FollowLeader(r) => r.movements(ctx, false),
            Self::GateTurn(r) => r.movements(ctx),
            Self::Grapevine(r) => r.movements(ctx, 1),
            Self::TwoStep(r) => r.movements(ctx, 2),
        }
    }
}

pub(crate) fn is_default_overrides(o: &Overrides) -> bool {
    *o == Overrides::default()
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Fixed-direction march.
pub struct ForwardMarch {
    /// Number of steps.
    pub steps: u32,
    /// Bearing of travel.
    pub direction: Angle,
    /// Rule-level overrides.
    #[serde(default, skip_serializing_if = "is_default_overrides")]
    pub settings: Overrides,
}

impl ForwardMarch {
    fn movements(&self, ctx: &RuleContext<'_>) -> DrillResult<Vec<MovementSegment>> {
        if self.steps == 0 {
            return Ok(Vec::new());
        }
        let s = ctx.settings;
        let m = MoveSegment::new(ctx.start, self.direction, self.steps, s.cadence(), s.step_type)?
            .with_facing(s.orientation.facing_for(self.direction));
        Ok(vec![m.into()])
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// Even step to the next formation.
pub struct EvenStep {
    /// Rule-level overrides.
    #[serde(default, skip_serializing_if = "is_default_overrides")]
    pub settings: Overrides,
}

fn even_step(ctx: &RuleContext<'_>) -> Vec<MovementSegment> {
    if ctx.remaining == 0 {
        return Vec::new();
    }
    let end = ctx.destination();
    let facing = match Angle::of_displacement(end - ctx.start) {
        Some(travel) => ctx.settings.orientation.facing_for(travel),
        None => ctx.settings.orientation.fixed_angle().unwrap_or(ctx.facing),
    };
    vec![EvenSegment::new(ctx.start, end, ctx.remaining, facing, ctx.settings.step_type).into()]
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// Stationary continuity (mark time or close).
pub struct StopRule {
    /// Explicit length; `None` takes all remaining beats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Beats>,
    /// Rule-level overrides.
    #[serde(default, skip_serializing_if = "is_default_overrides")]
    pub settings: Overrides,
}

impl StopRule {
    fn movements(&self, ctx: &RuleContext<'_>, mark_time: bool) -> Vec<MovementSegment> {
        let duration = self.duration.unwrap_or(ctx.remaining);
        let facing = ctx.settings.orientation.fixed_angle().unwrap_or(ctx.facing);
        let seg = if mark_time {
            StopSegment::mark_time(ctx.start, duration, facing)
        } else {
            StopSegment::close(ctx.start, duration, facing)
        };
        vec![seg.into()]
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Rotation around a fixed reference point over the remaining beats.
pub struct GateTurn {
    /// Pivot point.
    pub center: Coordinate,
    /// Signed sweep in degrees.
    pub degrees: f64,
    /// Rule-level overrides.
    #[serde(default, skip_serializing_if = "is_default_overrides")]
    pub settings: Overrides,
}

impl GateTurn {
    fn validate(&self) -> DrillResult<()> {
        if !self.degrees.is_finite() || !self.center.x.is_finite() || !self.center.y.is_finite() {
            return Err(DrillError::validation(
                "GateTurn: center and degrees must be finite",
            ));
        }
        Ok(())
    }

    fn movements(&self, ctx: &RuleContext<'_>) -> DrillResult<Vec<MovementSegment>> {
        if ctx.remaining == 0 {
            return Ok(Vec::new());
        }
        let mut arc = ArcSegment::new(
            self.center,
            ctx.start,
            self.degrees,
            ctx.remaining,
            ctx.settings.step_type,
        )?;
        if let Some(fixed) = ctx.settings.orientation.fixed_angle() {
            arc = arc.with_facing(fixed);
        }
        Ok(vec![arc.into()])
    }
}

#[cfg(test)]
#[path = "../../tests/unit/continuity/rule.rs"]
mod tests;

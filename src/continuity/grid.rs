//! Destination rules that decompose the displacement to the next formation
//! into axis-aligned and diagonal legs.

use crate::{
    continuity::rule::{RuleContext, is_default_overrides},
    continuity::settings::Overrides,
    foundation::core::{Angle, Beats, Coordinate, POSITION_EPSILON, Vec2},
    foundation::error::DrillResult,
    movement::segment::{MoveSegment, MovementSegment, StopSegment},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Which field axis is travelled first.
pub enum AxisOrder {
    /// East/west leg first, then north/south.
    #[default]
    #[serde(rename = "EWNS")]
    EastWestFirst,
    /// North/south leg first, then east/west.
    #[serde(rename = "NSEW")]
    NorthSouthFirst,
}

impl AxisOrder {
    fn axes(self) -> [Axis; 2] {
        match self {
            Self::EastWestFirst => [Axis::EastWest, Axis::NorthSouth],
            Self::NorthSouthFirst => [Axis::NorthSouth, Axis::EastWest],
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Whether the diagonal leg comes before or after the straight leg.
pub enum DiagonalOrder {
    /// Diagonal march, then high step straight (DMHS).
    #[default]
    #[serde(rename = "DMHS")]
    DiagonalFirst,
    /// High step straight, then diagonal march (HSDM).
    #[serde(rename = "HSDM")]
    StraightFirst,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    NorthSouth,
    EastWest,
}

impl Axis {
    fn component(self, v: Vec2) -> f64 {
        match self {
            Self::NorthSouth => v.x,
            Self::EastWest => v.y,
        }
    }

    fn bearing(self, signed: f64) -> Angle {
        match (self, signed >= 0.0) {
            (Self::NorthSouth, true) => Angle::NORTH,
            (Self::NorthSouth, false) => Angle::SOUTH,
            (Self::EastWest, true) => Angle::EAST,
            (Self::EastWest, false) => Angle::WEST,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// Fountain grid (EWNS / NSEW) to the next formation.
pub struct FountainGrid {
    /// Axis order.
    #[serde(default)]
    pub order: AxisOrder,
    /// Rule-level overrides.
    #[serde(default, skip_serializing_if = "is_default_overrides")]
    pub settings: Overrides,
}

impl FountainGrid {
    pub(crate) fn movements(&self, ctx: &RuleContext<'_>) -> DrillResult<Vec<MovementSegment>> {
        let delta = ctx.destination() - ctx.start;
        let mut legs = Legs::new(ctx);
        for axis in self.order.axes() {
            let d = axis.component(delta);
            legs.straight(axis.bearing(d), d.abs(), 1.0)?;
        }
        Ok(legs.finish_with_end_fill())
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// Diagonal march combined with a straight leg (DMHS / HSDM).
pub struct Diagonal {
    /// Leg order.
    #[serde(default)]
    pub order: DiagonalOrder,
    /// Rule-level overrides.
    #[serde(default, skip_serializing_if = "is_default_overrides")]
    pub settings: Overrides,
}

impl Diagonal {
    pub(crate) fn movements(&self, ctx: &RuleContext<'_>) -> DrillResult<Vec<MovementSegment>> {
        let delta = ctx.destination() - ctx.start;
        let diag_steps = delta.x.abs().min(delta.y.abs());
        let diag_bearing = Angle::of_displacement(Vec2::new(delta.x.signum(), delta.y.signum()))
            .unwrap_or(Angle::EAST);

        let (straight_axis, straight) = if delta.x.abs() > delta.y.abs() {
            (Axis::NorthSouth, delta.x - delta.x.signum() * diag_steps)
        } else {
            (Axis::EastWest, delta.y - delta.y.signum() * diag_steps)
        };

        let mut legs = Legs::new(ctx);
        match self.order {
            DiagonalOrder::DiagonalFirst => {
                legs.straight(diag_bearing, diag_steps, std::f64::consts::SQRT_2)?;
                legs.straight(straight_axis.bearing(straight), straight.abs(), 1.0)?;
            }
            DiagonalOrder::StraightFirst => {
                legs.straight(straight_axis.bearing(straight), straight.abs(), 1.0)?;
                legs.straight(diag_bearing, diag_steps, std::f64::consts::SQRT_2)?;
            }
        }
        Ok(legs.finish_with_end_fill())
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// Axis-interleaved travel to the next formation (grapevine, two-step).
///
/// The dot keeps the facing it entered with unless a fixed orientation is set,
/// so the alternating legs read as lateral steps.
pub struct Grapevine {
    /// Axis taken on the first interval.
    #[serde(default)]
    pub order: AxisOrder,
    /// Rule-level overrides.
    #[serde(default, skip_serializing_if = "is_default_overrides")]
    pub settings: Overrides,
}

impl Grapevine {
    pub(crate) fn movements(
        &self,
        ctx: &RuleContext<'_>,
        steps_per_interval: u32,
    ) -> DrillResult<Vec<MovementSegment>> {
        let delta = ctx.destination() - ctx.start;
        let facing = ctx.settings.orientation.fixed_angle().unwrap_or(ctx.facing);

        let plan = self.order.axes().map(|axis| {
            let d = axis.component(delta);
            let steps = whole_steps(d.abs());
            let size = if steps == 0 { 0.0 } else { d.abs() / f64::from(steps) };
            (axis.bearing(d), steps, size)
        });
        let mut left = [plan[0].1, plan[1].1];
        let interval = steps_per_interval.max(1);

        let mut legs = Legs::new(ctx);
        let mut turn = 0usize;
        while (left[0] > 0 || left[1] > 0) && !legs.exhausted() {
            let i = turn % 2;
            let other = 1 - i;
            if left[i] > 0 {
                let take = if left[other] == 0 {
                    left[i]
                } else {
                    left[i].min(interval)
                };
                let (bearing, _, size) = plan[i];
                legs.steps(bearing, take, size, Some(facing))?;
                left[i] -= take;
            }
            turn += 1;
        }
        Ok(legs.finish_with_end_fill())
    }
}

/// Whole steps needed to cover `distance`, rounding partial steps up.
pub(crate) fn whole_steps(distance: f64) -> u32 {
    if distance <= POSITION_EPSILON {
        return 0;
    }
    (distance - POSITION_EPSILON).ceil().max(1.0) as u32
}

/// Accumulates consecutive legs, each starting where the previous ended.
///
/// Legs past the sheet's remaining beats are dropped.
struct Legs<'c, 'a> {
    ctx: &'c RuleContext<'a>,
    cursor: Coordinate,
    used: Beats,
    out: Vec<MovementSegment>,
}

impl<'c, 'a> Legs<'c, 'a> {
    fn new(ctx: &'c RuleContext<'a>) -> Self {
        Self {
            ctx,
            cursor: ctx.start,
            used: 0,
            out: Vec::new(),
        }
    }

    fn exhausted(&self) -> bool {
        self.used >= self.ctx.remaining
    }

    /// Straight leg covering `units` grid units, each step spanning `unit_len`.
    fn straight(&mut self, bearing: Angle, units: f64, unit_len: f64) -> DrillResult<()> {
        let steps = whole_steps(units);
        if steps == 0 {
            return Ok(());
        }
        let size = units * unit_len / f64::from(steps);
        self.steps(bearing, steps, size, None)
    }

    fn steps(
        &mut self,
        bearing: Angle,
        steps: u32,
        step_size: f64,
        facing: Option<Angle>,
    ) -> DrillResult<()> {
        if self.exhausted() {
            return Ok(());
        }
        let s = self.ctx.settings;
        let facing = facing.unwrap_or_else(|| s.orientation.facing_for(bearing));
        let m = MoveSegment::new(self.cursor, bearing, steps, s.cadence(), s.step_type)?
            .with_step_size(step_size)?
            .with_facing(facing);
        self.used = self.used.saturating_add(m.duration());
        self.cursor = m.end();
        self.out.push(m.into());
        Ok(())
    }

    fn finish_with_end_fill(mut self) -> Vec<MovementSegment> {
        push_end_fill(&mut self.out, self.ctx);
        self.out
    }
}

/// Append a mark time covering whatever beats the legs left unused.
pub(crate) fn push_end_fill(out: &mut Vec<MovementSegment>, ctx: &RuleContext<'_>) {
    let used = out
        .iter()
        .fold(0, |acc: Beats, seg| acc.saturating_add(seg.duration()));
    let leftover = ctx.remaining.saturating_sub(used);
    if leftover == 0 {
        return;
    }
    let (position, last_facing) = out
        .last()
        .map(|seg| (seg.end(), seg.final_facing()))
        .unwrap_or((ctx.start, ctx.facing));
    let facing = ctx.settings.orientation.fixed_angle().unwrap_or(last_facing);
    out.push(StopSegment::mark_time(position, leftover, facing).into());
}

#[cfg(test)]
#[path = "../../tests/unit/continuity/grid.rs"]
mod tests;

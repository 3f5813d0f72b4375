use std::collections::BTreeSet;

use crate::{
    continuity::grid::whole_steps,
    continuity::rule::{RuleContext, is_default_overrides},
    continuity::settings::Overrides,
    foundation::core::{Angle, Beats, Coordinate, DotId, POSITION_EPSILON},
    foundation::error::{DrillError, DrillResult},
    movement::segment::{MoveSegment, MovementSegment, StopSegment},
};

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// A line of dots where each dot traces the path of the dots ahead of it.
///
/// `order` lists the line leader first. The leader continues through `path`
/// once it has no dots ahead. For a counter march the route is closed: after
/// `path` it wraps back through the tail of the line to where the dot started,
/// and repeats until the beats run out.
///
/// A follow-the-leader route that ends before the sheet does gets no end
/// fill; the timeline stays short and is reported as lacked movement.
pub struct LineRule {
    /// Dots in the line, leader first.
    pub order: Vec<DotId>,
    /// Extra waypoints visited after the leader's position.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Coordinate>,
    /// Optional cap on beats consumed; `None` is bounded only by the sheet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Beats>,
    /// Rule-level overrides.
    #[serde(default, skip_serializing_if = "is_default_overrides")]
    pub settings: Overrides,
}

impl LineRule {
    pub(crate) fn validate(&self, kind: &str) -> DrillResult<()> {
        if self.order.is_empty() {
            return Err(DrillError::validation(format!("{kind}: line is empty")));
        }
        let mut seen = BTreeSet::new();
        for dot in &self.order {
            if !seen.insert(dot) {
                return Err(DrillError::validation(format!(
                    "{kind}: dot '{dot}' appears twice in the line"
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn movements(
        &self,
        ctx: &RuleContext<'_>,
        cyclic: bool,
    ) -> DrillResult<Vec<MovementSegment>> {
        let Some(idx) = self.order.iter().position(|d| d == ctx.dot) else {
            tracing::warn!(dot = %ctx.dot, "dot is not part of the line; no movement produced");
            return Ok(Vec::new());
        };

        let route = self.route(ctx, idx, cyclic)?;
        let budget = ctx.remaining.min(self.duration.unwrap_or(Beats::MAX));
        let bps = ctx.settings.cadence();

        let mut out = Vec::<MovementSegment>::new();
        let mut cursor = ctx.start;
        let mut used: Beats = 0;
        let mut facing = ctx.facing;

        'walk: loop {
            let mut progressed = false;
            for &waypoint in &route {
                let leg = waypoint - cursor;
                let len = leg.hypot();
                let steps = whole_steps(len);
                let Some(bearing) = Angle::of_displacement(leg).filter(|_| steps > 0) else {
                    continue;
                };
                let avail = budget - used;
                let take = steps.min(avail / bps);
                if take > 0 {
                    facing = ctx.settings.orientation.facing_for(bearing);
                    let m = MoveSegment::new(cursor, bearing, take, bps, ctx.settings.step_type)?
                        .with_step_size(len / f64::from(steps))?
                        .with_facing(facing);
                    used += m.duration();
                    cursor = m.end();
                    out.push(m.into());
                    progressed = true;
                }
                if take < steps {
                    let partial = budget - used;
                    if partial > 0 {
                        out.push(StopSegment::mark_time(cursor, partial, facing).into());
                    }
                    break 'walk;
                }
            }
            if !cyclic || !progressed {
                break;
            }
        }
        Ok(out)
    }

    /// Waypoints for the dot at `idx`, in visiting order.
    fn route(&self, ctx: &RuleContext<'_>, idx: usize, cyclic: bool) -> DrillResult<Vec<Coordinate>> {
        let lookup = |dot: &DotId| {
            ctx.formation.position_of(dot).ok_or_else(|| {
                DrillError::evaluation(format!("line dot '{dot}' is not on the sheet"))
            })
        };

        let mut route = Vec::with_capacity(self.order.len() + self.path.len());
        for dot in self.order[..idx].iter().rev() {
            route.push(lookup(dot)?);
        }
        route.extend(self.path.iter().copied());
        if cyclic {
            for dot in self.order[idx + 1..].iter().rev() {
                route.push(lookup(dot)?);
            }
            route.push(ctx.start);
        }
        route.dedup_by(|a, b| a.distance(*b) <= POSITION_EPSILON);
        Ok(route)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/continuity/line.rs"]
mod tests;

//! Drillmotion turns marching-band drill continuities into per-dot motion.
//!
//! A [`Show`] is an ordered list of [`Sheet`]s. Each sheet declares where
//! every dot starts, how many beats it lasts, and which [`ContinuityRule`]s
//! each dot type runs. From that the engine:
//!
//! - builds a gap-free [`DotTimeline`] of [`MovementSegment`]s per dot
//! - answers "where is this dot at beat `b`" queries
//! - checks that each sheet ends where the next one begins
//! - finds dots that come within one step of each other
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod continuity;
mod foundation;
mod movement;
mod show;
mod timeline;
mod validate;

pub use crate::foundation::core::{
    Angle, Beats, COLLISION_SPACING, Coordinate, DotId, POSITION_EPSILON, Point, Vec2,
};
pub use crate::foundation::error::{AnimationStateError, DrillError, DrillResult};

pub use crate::continuity::grid::{AxisOrder, Diagonal, DiagonalOrder, FountainGrid, Grapevine};
pub use crate::continuity::line::LineRule;
pub use crate::continuity::rule::{
    ContinuityRule, EvenStep, ForwardMarch, Formation, GateTurn, RuleContext, StopRule,
};
pub use crate::continuity::settings::{
    DefaultChain, Orientation, Overrides, ResolvedSettings, ShowDefaults, StepType,
};
pub use crate::movement::record::{SegmentKind, SegmentRecord};
pub use crate::movement::segment::{
    AnimationState, ArcSegment, EvenSegment, MoveSegment, MovementSegment, StopSegment,
};
pub use crate::show::dsl::{
    SheetBuilder, ShowBuilder, close, counter_march, diagonal, even_step, follow_leader,
    forward_march, fountain_grid, gate_turn, grapevine, mark_time, two_step, with_overrides,
};
pub use crate::show::model::{DotType, Sheet, SheetDot, Show, Song};
pub use crate::timeline::builder::{DotTimeline, TimelineBuilder};
pub use crate::validate::collision::{
    CollisionHandle, CollisionOutcome, CollisionPass, CollisionScheduler, CollisionSet,
    detect_collisions,
};
pub use crate::validate::consistency::{ConsistencyReport, SheetIssues, check_sheet};

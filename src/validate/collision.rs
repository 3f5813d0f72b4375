//! Pairwise spacing checks sampled once per beat.
//!
//! A pass is `O(beats × dots²)`, so it runs on a snapshot taken from the
//! sheet and can be deferred. The snapshot carries the sheet's generation;
//! a result computed from an older generation is discarded on arrival.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::mpsc;

use rayon::prelude::*;

use crate::{
    foundation::core::{Beats, COLLISION_SPACING, Coordinate, DotId},
    foundation::error::{DrillError, DrillResult},
    show::model::Show,
    timeline::builder::DotTimeline,
};

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
/// Dots closer than the collision spacing, per beat. Beats without
/// collisions are absent.
pub struct CollisionSet {
    by_beat: BTreeMap<Beats, BTreeSet<DotId>>,
}

impl CollisionSet {
    /// `true` when no beat has a collision.
    pub fn is_empty(&self) -> bool {
        self.by_beat.is_empty()
    }

    /// Dots colliding at `beat`.
    pub fn at(&self, beat: Beats) -> Option<&BTreeSet<DotId>> {
        self.by_beat.get(&beat)
    }

    /// Whether `dot` collides at `beat`.
    pub fn contains(&self, beat: Beats, dot: &DotId) -> bool {
        self.at(beat).is_some_and(|s| s.contains(dot))
    }

    /// Beats with at least one collision, ascending.
    pub fn beats(&self) -> impl Iterator<Item = Beats> + '_ {
        self.by_beat.keys().copied()
    }

    /// `(beat, dots)` pairs in beat order.
    pub fn iter(&self) -> impl Iterator<Item = (Beats, &BTreeSet<DotId>)> + '_ {
        self.by_beat.iter().map(|(b, s)| (*b, s))
    }
}

/// Sample every dot at beats `0..num_beats` and flag pairs closer than `spacing`.
///
/// Dots without movements stand at their start position. A dot whose
/// timeline ends early is left out of the beats it cannot answer.
pub fn detect_collisions(
    num_beats: Beats,
    start_positions: &BTreeMap<DotId, Coordinate>,
    timelines: &BTreeMap<DotId, DotTimeline>,
    spacing: f64,
) -> CollisionSet {
    let by_beat = (0..num_beats)
        .into_par_iter()
        .filter_map(|beat| {
            let at = f64::from(beat);
            let placed: Vec<(&DotId, Coordinate)> = start_positions
                .iter()
                .filter_map(|(dot, start)| match timelines.get(dot) {
                    Some(t) if !t.is_empty() => t.state_at(at).ok().map(|s| (dot, s.position)),
                    _ => Some((dot, *start)),
                })
                .collect();

            let mut hit = BTreeSet::new();
            for (i, (a, pa)) in placed.iter().enumerate() {
                for (b, pb) in &placed[i + 1..] {
                    if pa.distance(*pb) < spacing {
                        hit.insert((*a).clone());
                        hit.insert((*b).clone());
                    }
                }
            }
            (!hit.is_empty()).then_some((beat, hit))
        })
        .collect::<Vec<_>>();

    CollisionSet {
        by_beat: by_beat.into_iter().collect(),
    }
}

/// Snapshot of a sheet taken when a collision pass is scheduled.
#[derive(Clone, Debug)]
pub struct CollisionPass {
    generation: u64,
    num_beats: Beats,
    start_positions: BTreeMap<DotId, Coordinate>,
    timelines: BTreeMap<DotId, DotTimeline>,
}

/// Result of a pass, tagged with the generation it was computed from.
#[derive(Clone, Debug, PartialEq)]
pub struct CollisionOutcome {
    /// Sheet generation at scheduling time.
    pub generation: u64,
    /// Collisions found.
    pub set: CollisionSet,
}

impl CollisionPass {
    pub(crate) fn new(
        generation: u64,
        num_beats: Beats,
        start_positions: BTreeMap<DotId, Coordinate>,
        timelines: BTreeMap<DotId, DotTimeline>,
    ) -> Self {
        Self {
            generation,
            num_beats,
            start_positions,
            timelines,
        }
    }

    /// Generation of the sheet when the snapshot was taken.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Compute collisions for the snapshot.
    #[tracing::instrument(skip(self), fields(generation = self.generation, num_beats = self.num_beats))]
    pub fn run(&self) -> CollisionOutcome {
        let set = detect_collisions(
            self.num_beats,
            &self.start_positions,
            &self.timelines,
            COLLISION_SPACING,
        );
        CollisionOutcome {
            generation: self.generation,
            set,
        }
    }

    /// Run the pass on the rayon global pool.
    pub fn spawn(self) -> CollisionHandle {
        let (tx, rx) = mpsc::channel();
        rayon::spawn(move || {
            // The receiver may already be gone if the caller lost interest.
            let _ = tx.send(self.run());
        });
        CollisionHandle { rx }
    }
}

/// Receiving end of a spawned [`CollisionPass`].
pub struct CollisionHandle {
    rx: mpsc::Receiver<CollisionOutcome>,
}

impl CollisionHandle {
    /// Outcome if the pass has finished, without blocking.
    pub fn try_take(&self) -> Option<CollisionOutcome> {
        self.rx.try_recv().ok()
    }

    /// Block until the pass finishes.
    pub fn wait(self) -> DrillResult<CollisionOutcome> {
        self.rx
            .recv()
            .map_err(|_| DrillError::evaluation("collision worker exited without a result"))
    }
}

impl Show {
    /// Run a collision pass for one sheet right away and store the result.
    #[tracing::instrument(skip(self), fields(title = %self.title()))]
    pub fn update_collisions(&mut self, sheet: usize) -> DrillResult<&CollisionSet> {
        let outcome = self.sheet(sheet)?.schedule_collisions()?.run();
        let s = self.sheet_mut(sheet)?;
        s.accept_collisions(outcome);
        s.collisions()
            .ok_or_else(|| DrillError::evaluation("collision result was not stored"))
    }
}

/// Queue of deferred collision passes, at most one per sheet.
///
/// Scheduling a sheet again replaces its pending pass. Passes run when the
/// caller drains the queue after finishing its synchronous work.
#[derive(Debug, Default)]
pub struct CollisionScheduler {
    pending: BTreeMap<usize, CollisionPass>,
}

impl CollisionScheduler {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot `sheet` and queue a pass for it.
    pub fn schedule(&mut self, show: &Show, sheet: usize) -> DrillResult<()> {
        let pass = show.sheet(sheet)?.schedule_collisions()?;
        if self.pending.insert(sheet, pass).is_some() {
            tracing::debug!(sheet, "superseded pending collision pass");
        }
        Ok(())
    }

    /// Number of queued passes.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Run every queued pass and hand results to their sheets.
    ///
    /// Returns how many results were accepted; the rest were stale.
    pub fn run_pending(&mut self, show: &mut Show) -> usize {
        let mut accepted = 0;
        for (index, pass) in std::mem::take(&mut self.pending) {
            let outcome = pass.run();
            match show.sheet_mut(index) {
                Ok(sheet) => {
                    if sheet.accept_collisions(outcome) {
                        accepted += 1;
                    }
                }
                Err(err) => tracing::debug!(sheet = index, %err, "dropping collision pass"),
            }
        }
        accepted
    }
}

#[cfg(test)]
#[path = "../../tests/unit/validate/collision.rs"]
mod tests;

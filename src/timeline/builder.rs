use std::collections::BTreeMap;

use crate::{
    continuity::rule::{ContinuityRule, Formation, RuleContext},
    continuity::settings::DefaultChain,
    foundation::core::{Angle, Beats, Coordinate, DotId},
    foundation::error::DrillResult,
    movement::record::SegmentRecord,
    movement::segment::MovementSegment,
    show::model::DotType,
};

/// Ordered movements of one dot on one sheet.
///
/// Consecutive segments join end to start. A timeline whose durations add up
/// to less than the sheet's beat count is *incomplete*; it is kept as-is so
/// the gap can be reported instead of padded.
#[derive(Clone, Debug, PartialEq)]
pub struct DotTimeline {
    pub(crate) dot: DotId,
    pub(crate) num_beats: Beats,
    pub(crate) segments: Vec<MovementSegment>,
}

impl DotTimeline {
    /// Wrap already-built segments for `dot` on a sheet of `num_beats` beats.
    pub fn new(dot: DotId, num_beats: Beats, segments: Vec<MovementSegment>) -> Self {
        Self {
            dot,
            num_beats,
            segments,
        }
    }

    /// Dot this timeline belongs to.
    pub fn dot(&self) -> &DotId {
        &self.dot
    }

    /// Beat count of the owning sheet.
    pub fn num_beats(&self) -> Beats {
        self.num_beats
    }

    /// Segments in playback order.
    pub fn segments(&self) -> &[MovementSegment] {
        &self.segments
    }

    /// `true` when the dot has no movements at all.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Sum of segment durations.
    pub fn beats_covered(&self) -> Beats {
        self.segments.iter().map(MovementSegment::duration).sum()
    }

    /// Whether the segments span the whole sheet.
    pub fn is_complete(&self) -> bool {
        self.beats_covered() >= self.num_beats
    }

    /// Beats the timeline falls short of the sheet by.
    pub fn deficit(&self) -> Beats {
        self.num_beats.saturating_sub(self.beats_covered())
    }

    /// Position at the start of the first segment.
    pub fn start(&self) -> Option<Coordinate> {
        self.segments.first().map(MovementSegment::start)
    }

    /// Position at the end of the last segment.
    pub fn end(&self) -> Option<Coordinate> {
        self.segments.last().map(MovementSegment::end)
    }

    /// Flat tagged records, as exported to the editor.
    pub fn records(&self) -> Vec<SegmentRecord> {
        self.segments.iter().cloned().map(SegmentRecord::from).collect()
    }
}

impl serde::Serialize for DotTimeline {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.segments.serialize(serializer)
    }
}

/// Assembles per-dot timelines for one sheet.
///
/// Each dot runs the `all-before` rules, then the rules of its own dot type,
/// then the `all-after` rules. Every rule sees the beats still left and
/// starts where the previous segment ended.
pub struct TimelineBuilder<'a> {
    num_beats: Beats,
    continuities: &'a BTreeMap<DotType, Vec<ContinuityRule>>,
    chain: DefaultChain<'a>,
    formation: &'a dyn Formation,
}

impl<'a> TimelineBuilder<'a> {
    /// Builder for a sheet of `num_beats` beats.
    pub fn new(
        num_beats: Beats,
        continuities: &'a BTreeMap<DotType, Vec<ContinuityRule>>,
        chain: DefaultChain<'a>,
        formation: &'a dyn Formation,
    ) -> Self {
        Self {
            num_beats,
            continuities,
            chain,
            formation,
        }
    }

    /// Rules a dot of `dot_type` runs, in order.
    pub fn rules_for(&self, dot_type: DotType) -> impl Iterator<Item = &'a ContinuityRule> + 'a {
        let continuities = self.continuities;
        let list = move |t: DotType| continuities.get(&t).map(Vec::as_slice).unwrap_or(&[]);
        let specific = if dot_type.is_pseudo() {
            &[][..]
        } else {
            list(dot_type)
        };
        list(DotType::AllBefore)
            .iter()
            .chain(specific)
            .chain(list(DotType::AllAfter))
    }

    /// Build the timeline of one dot.
    ///
    /// `next` is the dot's declared position on the following sheet; rules
    /// that travel to the next formation stay put when it is `None`.
    pub fn build(
        &self,
        dot: &DotId,
        dot_type: DotType,
        start: Coordinate,
        next: Option<Coordinate>,
    ) -> DrillResult<DotTimeline> {
        let mut segments = Vec::new();
        let mut cursor = start;
        let mut facing = Angle::EAST;
        let mut used: Beats = 0;

        'rules: for rule in self.rules_for(dot_type) {
            let ctx = RuleContext {
                dot,
                start: cursor,
                facing,
                remaining: self.num_beats - used,
                next_position: next,
                formation: self.formation,
                settings: self.chain.resolve(rule.overrides()),
            };
            for seg in rule.movements(&ctx)? {
                let left = self.num_beats - used;
                if left == 0 {
                    tracing::debug!(%dot, rule = rule.kind(), "sheet beats exhausted; dropping movements");
                    break 'rules;
                }
                let seg = if seg.duration() > left {
                    tracing::debug!(%dot, rule = rule.kind(), requested = seg.duration(), left, "clamping movement");
                    seg.truncated(left)
                } else {
                    seg
                };
                used += seg.duration();
                cursor = seg.end();
                facing = seg.final_facing();
                segments.push(seg);
            }
        }

        if used < self.num_beats {
            tracing::debug!(
                %dot,
                covered = used,
                num_beats = self.num_beats,
                "timeline is incomplete"
            );
        }
        Ok(DotTimeline::new(dot.clone(), self.num_beats, segments))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/builder.rs"]
mod tests;

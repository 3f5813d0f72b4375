use crate::{
    foundation::error::{AnimationStateError, DrillError, DrillResult},
    movement::segment::{AnimationState, MovementSegment},
    timeline::builder::DotTimeline,
};

impl DotTimeline {
    /// State of the dot `beat` beats into the sheet.
    ///
    /// Walks the segments in order and answers from the first one whose
    /// cumulative end reaches `beat`. A beat past the last segment, or a
    /// timeline without segments, is an [`AnimationStateError`]; nothing is
    /// extrapolated.
    pub fn state_at(&self, beat: f64) -> DrillResult<AnimationState> {
        if !beat.is_finite() || beat < 0.0 {
            return Err(DrillError::evaluation(format!(
                "beat must be finite and >= 0, got {beat}"
            )));
        }
        if self.segments.is_empty() {
            return Err(AnimationStateError::NoMovements {
                dot: self.dot.clone(),
            }
            .into());
        }

        match self.segment_at(beat) {
            Some((seg, local)) => Ok(seg.state_at(local)),
            None => Err(AnimationStateError::Underrun {
                dot: self.dot.clone(),
                beat,
                available: f64::from(self.beats_covered()),
            }
            .into()),
        }
    }

    /// Segment active at `beat`, with the beat local to it.
    pub fn segment_at(&self, beat: f64) -> Option<(&MovementSegment, f64)> {
        let mut before = 0.0;
        for seg in &self.segments {
            let end = before + f64::from(seg.duration());
            if end >= beat {
                return Some((seg, beat - before));
            }
            before = end;
        }
        None
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/resolver.rs"]
mod tests;

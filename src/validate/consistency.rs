use std::collections::BTreeMap;

use crate::{
    continuity::rule::Formation,
    foundation::core::DotId,
    foundation::error::{AnimationStateError, DrillError, DrillResult},
    foundation::math::points_close,
    show::model::{Sheet, Show},
};

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Defects found on one sheet.
pub struct SheetIssues {
    /// Dots whose movements stop before the end of the sheet.
    pub lacked_movement: Vec<DotId>,
    /// Dots that end somewhere other than their next-sheet position.
    pub wrong_position: Vec<DotId>,
}

impl SheetIssues {
    /// `true` when nothing was found.
    pub fn is_empty(&self) -> bool {
        self.lacked_movement.is_empty() && self.wrong_position.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Consistency defects keyed by sheet index. Clean sheets are omitted.
pub struct ConsistencyReport {
    /// Issues per sheet index.
    pub sheets: BTreeMap<usize, SheetIssues>,
}

impl ConsistencyReport {
    /// `true` when no sheet has issues.
    pub fn is_clean(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Issues of one sheet, if any.
    pub fn issues(&self, sheet: usize) -> Option<&SheetIssues> {
        self.sheets.get(&sheet)
    }
}

/// Check one sheet's cached timelines against the following sheet.
///
/// Each dot is resolved at the final beat. Without a following sheet only
/// running out of movement is reported.
pub fn check_sheet(sheet: &Sheet, next: Option<&Sheet>) -> DrillResult<SheetIssues> {
    let timelines = sheet.timelines().ok_or_else(|| {
        DrillError::evaluation(format!(
            "sheet '{}' has no movements; update movements first",
            sheet.label()
        ))
    })?;
    let end = f64::from(sheet.num_beats());
    let mut issues = SheetIssues::default();

    for (dot, timeline) in timelines {
        let expected = next.and_then(|n| n.position_of(dot));
        match timeline.state_at(end) {
            Ok(state) => {
                if expected.is_some_and(|p| !points_close(state.position, p)) {
                    issues.wrong_position.push(dot.clone());
                }
            }
            Err(DrillError::AnimationState(AnimationStateError::NoMovements { .. })) => {
                // No continuity means the dot holds still; that only matters
                // if the next sheet expects it elsewhere.
                let start = sheet.position_of(dot);
                if let (Some(start), Some(expected)) = (start, expected)
                    && !points_close(start, expected)
                {
                    issues.lacked_movement.push(dot.clone());
                }
            }
            Err(DrillError::AnimationState(AnimationStateError::Underrun { .. })) => {
                issues.lacked_movement.push(dot.clone());
            }
            Err(err) => return Err(err),
        }
    }
    Ok(issues)
}

impl Show {
    /// Check every sheet. Sheets must have up-to-date movements.
    #[tracing::instrument(skip(self), fields(title = %self.title()))]
    pub fn check_consistency(&self) -> DrillResult<ConsistencyReport> {
        let mut report = ConsistencyReport::default();
        let sheets = self.sheets();
        for (i, sheet) in sheets.iter().enumerate() {
            let issues = check_sheet(sheet, sheets.get(i + 1))?;
            if !issues.is_empty() {
                report.sheets.insert(i, issues);
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/validate/consistency.rs"]
mod tests;

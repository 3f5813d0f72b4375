use std::collections::{BTreeMap, BTreeSet};

use crate::{
    continuity::rule::{ContinuityRule, Formation, is_default_overrides},
    continuity::settings::{DefaultChain, Overrides, ShowDefaults},
    foundation::core::{Beats, Coordinate, DotId},
    foundation::error::{DrillError, DrillResult},
    movement::segment::AnimationState,
    timeline::builder::{DotTimeline, TimelineBuilder},
    validate::collision::{CollisionOutcome, CollisionPass, CollisionSet},
};

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
/// Marcher symbol; continuities are assigned per symbol.
pub enum DotType {
    /// Open circle.
    #[default]
    Plain,
    /// Filled circle.
    Solid,
    /// Open circle with a forward slash.
    PlainForwardslash,
    /// Filled circle with a forward slash.
    SolidForwardslash,
    /// Open circle with a backslash.
    PlainBackslash,
    /// Filled circle with a backslash.
    SolidBackslash,
    /// Open circle with an x.
    PlainX,
    /// Filled circle with an x.
    SolidX,
    /// Rules run by every dot before its own dot type's rules.
    AllBefore,
    /// Rules run by every dot after its own dot type's rules.
    AllAfter,
}

impl DotType {
    /// `true` for the `all-before` / `all-after` pseudo types.
    pub fn is_pseudo(self) -> bool {
        matches!(self, Self::AllBefore | Self::AllAfter)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// A dot's declared start position and symbol on one sheet.
pub struct SheetDot {
    /// Start position.
    pub position: Coordinate,
    /// Symbol selecting which continuities the dot runs.
    #[serde(default)]
    pub dot_type: DotType,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Named group of sheets sharing setting overrides.
pub struct Song {
    /// Song name, referenced by sheets.
    pub name: String,
    /// Overrides applied to every sheet of the song.
    #[serde(default, skip_serializing_if = "is_default_overrides")]
    pub overrides: Overrides,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// One formation: start positions, beat count and continuities.
///
/// Timelines and collisions are derived caches owned by the sheet. Every
/// edit bumps [`Sheet::generation`] and drops them.
pub struct Sheet {
    pub(crate) label: String,
    pub(crate) num_beats: Beats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) song: Option<String>,
    #[serde(default, skip_serializing_if = "is_default_overrides")]
    pub(crate) overrides: Overrides,
    pub(crate) dots: BTreeMap<DotId, SheetDot>,
    #[serde(default)]
    pub(crate) continuities: BTreeMap<DotType, Vec<ContinuityRule>>,
    #[serde(skip)]
    generation: u64,
    #[serde(skip)]
    timelines: Option<BTreeMap<DotId, DotTimeline>>,
    #[serde(skip)]
    collisions: Option<CollisionSet>,
}

impl PartialEq for Sheet {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
            && self.num_beats == other.num_beats
            && self.song == other.song
            && self.overrides == other.overrides
            && self.dots == other.dots
            && self.continuities == other.continuities
    }
}

impl Sheet {
    pub(crate) fn new(label: String, num_beats: Beats) -> Self {
        Self {
            label,
            num_beats,
            song: None,
            overrides: Overrides::default(),
            dots: BTreeMap::new(),
            continuities: BTreeMap::new(),
            generation: 0,
            timelines: None,
            collisions: None,
        }
    }

    /// Sheet label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Beat count.
    pub fn num_beats(&self) -> Beats {
        self.num_beats
    }

    /// Song the sheet belongs to.
    pub fn song(&self) -> Option<&str> {
        self.song.as_deref()
    }

    /// Sheet-level overrides.
    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    /// Dots on this sheet.
    pub fn dots(&self) -> &BTreeMap<DotId, SheetDot> {
        &self.dots
    }

    /// Continuities per dot type.
    pub fn continuities(&self) -> &BTreeMap<DotType, Vec<ContinuityRule>> {
        &self.continuities
    }

    /// Rules assigned to one dot type (empty when none are).
    pub fn rules(&self, dot_type: DotType) -> &[ContinuityRule] {
        self.continuities
            .get(&dot_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Declared start positions of every dot.
    pub fn start_positions(&self) -> BTreeMap<DotId, Coordinate> {
        self.dots
            .iter()
            .map(|(id, d)| (id.clone(), d.position))
            .collect()
    }

    /// Counter advanced by every edit and every timeline update.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cached timelines, if movements have been updated since the last edit.
    pub fn timelines(&self) -> Option<&BTreeMap<DotId, DotTimeline>> {
        self.timelines.as_ref()
    }

    /// Cached timeline of one dot.
    pub fn timeline(&self, dot: &DotId) -> DrillResult<&DotTimeline> {
        let timelines = self.timelines.as_ref().ok_or_else(|| {
            DrillError::evaluation(format!(
                "sheet '{}' has no movements; update movements first",
                self.label
            ))
        })?;
        timelines.get(dot).ok_or_else(|| {
            DrillError::evaluation(format!("dot '{dot}' is not on sheet '{}'", self.label))
        })
    }

    /// Latest accepted collision set.
    pub fn collisions(&self) -> Option<&CollisionSet> {
        self.collisions.as_ref()
    }

    /// Snapshot the current timelines for a deferred collision pass.
    pub fn schedule_collisions(&self) -> DrillResult<CollisionPass> {
        let timelines = self.timelines.clone().ok_or_else(|| {
            DrillError::evaluation(format!(
                "sheet '{}' has no movements; update movements first",
                self.label
            ))
        })?;
        Ok(CollisionPass::new(
            self.generation,
            self.num_beats,
            self.start_positions(),
            timelines,
        ))
    }

    /// Store a finished collision pass unless the sheet has changed since it
    /// was scheduled. Returns whether the result was kept.
    pub fn accept_collisions(&mut self, outcome: CollisionOutcome) -> bool {
        if outcome.generation != self.generation {
            tracing::debug!(
                sheet = %self.label,
                scheduled = outcome.generation,
                current = self.generation,
                "discarding stale collision result"
            );
            return false;
        }
        self.collisions = Some(outcome.set);
        true
    }

    pub(crate) fn invalidate(&mut self) {
        self.generation += 1;
        self.timelines = None;
        self.collisions = None;
    }

    fn store_timelines(&mut self, timelines: BTreeMap<DotId, DotTimeline>) {
        self.invalidate();
        self.timelines = Some(timelines);
    }
}

/// Line rules may only name dots placed on the sheet they belong to.
fn check_line_dots(sheet: &Sheet, rule: &ContinuityRule) -> DrillResult<()> {
    if let ContinuityRule::CounterMarch(line) | ContinuityRule::FollowLeader(line) = rule
        && let Some(dot) = line.order.iter().find(|d| !sheet.dots.contains_key(*d))
    {
        return Err(DrillError::validation(format!(
            "sheet '{}': line dot '{dot}' is not on the sheet",
            sheet.label
        )));
    }
    Ok(())
}

impl Formation for Sheet {
    fn position_of(&self, dot: &DotId) -> Option<Coordinate> {
        self.dots.get(dot).map(|d| d.position)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// A complete drill: roster, songs and the ordered sheets.
pub struct Show {
    #[serde(default)]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) defaults: ShowDefaults,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) songs: Vec<Song>,
    pub(crate) dots: Vec<DotId>,
    pub(crate) sheets: Vec<Sheet>,
}

impl Show {
    /// Parse and validate a show from JSON.
    pub fn from_json_str(s: &str) -> DrillResult<Self> {
        let show: Self = serde_json::from_str(s).map_err(|e| DrillError::serde(e.to_string()))?;
        show.validate()?;
        Ok(show)
    }

    /// Pretty-printed JSON without derived caches.
    pub fn to_json_string_pretty(&self) -> DrillResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| DrillError::serde(e.to_string()))
    }

    /// Show title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Show-wide defaults.
    pub fn defaults(&self) -> &ShowDefaults {
        &self.defaults
    }

    /// Songs in declaration order.
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    /// Every dot in the show.
    pub fn dots(&self) -> &[DotId] {
        &self.dots
    }

    /// Sheets in performance order.
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// Sheet by index.
    pub fn sheet(&self, index: usize) -> DrillResult<&Sheet> {
        self.sheets.get(index).ok_or_else(|| {
            DrillError::evaluation(format!(
                "sheet index {index} out of range (show has {} sheets)",
                self.sheets.len()
            ))
        })
    }

    /// Mutable sheet by index, for accepting collision results.
    pub fn sheet_mut(&mut self, index: usize) -> DrillResult<&mut Sheet> {
        let len = self.sheets.len();
        self.sheets.get_mut(index).ok_or_else(|| {
            DrillError::evaluation(format!(
                "sheet index {index} out of range (show has {len} sheets)"
            ))
        })
    }

    /// Sum of every sheet's beat count.
    pub fn total_beats(&self) -> Beats {
        self.sheets
            .iter()
            .fold(0, |acc: Beats, s| acc.saturating_add(s.num_beats))
    }

    /// Structural checks run on load and by the builders.
    pub fn validate(&self) -> DrillResult<()> {
        self.defaults.validate()?;

        let mut roster = BTreeSet::new();
        for dot in &self.dots {
            if !roster.insert(dot) {
                return Err(DrillError::validation(format!("duplicate dot '{dot}'")));
            }
        }

        let mut song_names = BTreeSet::new();
        for song in &self.songs {
            if !song_names.insert(song.name.as_str()) {
                return Err(DrillError::validation(format!(
                    "duplicate song '{}'",
                    song.name
                )));
            }
            song.overrides.validate(&format!("song '{}'", song.name))?;
        }

        for sheet in &self.sheets {
            let owner = format!("sheet '{}'", sheet.label);
            if let Some(song) = sheet.song.as_deref()
                && !song_names.contains(song)
            {
                return Err(DrillError::validation(format!(
                    "{owner}: unknown song '{song}'"
                )));
            }
            sheet.overrides.validate(&owner)?;
            for (dot, placed) in &sheet.dots {
                if !roster.contains(dot) {
                    return Err(DrillError::validation(format!(
                        "{owner}: dot '{dot}' is not in the show"
                    )));
                }
                if placed.dot_type.is_pseudo() {
                    return Err(DrillError::validation(format!(
                        "{owner}: dot '{dot}' cannot use pseudo type {:?}",
                        placed.dot_type
                    )));
                }
            }
            for rules in sheet.continuities.values() {
                for rule in rules {
                    rule.validate()
                        .map_err(|e| DrillError::validation(format!("{owner}: {e}")))?;
                    check_line_dots(sheet, rule)?;
                }
            }
        }
        Ok(())
    }

    fn chain_for<'a>(&'a self, sheet: &'a Sheet) -> DrillResult<DefaultChain<'a>> {
        let song = match sheet.song.as_deref() {
            Some(name) => Some(
                self.songs
                    .iter()
                    .find(|s| s.name == name)
                    .map(|s| &s.overrides)
                    .ok_or_else(|| {
                        DrillError::validation(format!(
                            "sheet '{}': unknown song '{name}'",
                            sheet.label
                        ))
                    })?,
            ),
            None => None,
        };
        Ok(DefaultChain {
            sheet: &sheet.overrides,
            song,
            show: &self.defaults,
        })
    }

    /// Rebuild every dot's timeline on one sheet.
    ///
    /// Destination rules aim at the dot's position on the following sheet,
    /// so this must be re-run when that sheet changes too.
    #[tracing::instrument(skip(self), fields(title = %self.title))]
    pub fn update_movements(&mut self, sheet: usize) -> DrillResult<()> {
        let timelines = {
            let current = self.sheet(sheet)?;
            let next = self.sheets.get(sheet + 1);
            let builder = TimelineBuilder::new(
                current.num_beats,
                &current.continuities,
                self.chain_for(current)?,
                current,
            );
            current
                .dots
                .iter()
                .map(|(id, d)| {
                    let target = next.and_then(|n| n.position_of(id));
                    builder
                        .build(id, d.dot_type, d.position, target)
                        .map(|t| (id.clone(), t))
                })
                .collect::<DrillResult<BTreeMap<_, _>>>()?
        };
        let incomplete = timelines.values().filter(|t| !t.is_complete()).count();
        if incomplete > 0 {
            tracing::debug!(sheet, incomplete, "sheet has incomplete timelines");
        }
        self.sheets[sheet].store_timelines(timelines);
        Ok(())
    }

    /// Rebuild timelines on every sheet.
    pub fn update_all_movements(&mut self) -> DrillResult<()> {
        for i in 0..self.sheets.len() {
            self.update_movements(i)?;
        }
        Ok(())
    }

    /// Move a dot's declared start position.
    ///
    /// Invalidates the sheet and its predecessor, whose destination rules
    /// target this position.
    pub fn set_dot_position(
        &mut self,
        sheet: usize,
        dot: &DotId,
        position: Coordinate,
    ) -> DrillResult<()> {
        let s = self.sheet_mut(sheet)?;
        let entry = s.dots.get_mut(dot).ok_or_else(|| {
            DrillError::evaluation(format!("dot '{dot}' is not on sheet '{}'", s.label))
        })?;
        entry.position = position;
        s.invalidate();
        if sheet > 0 {
            self.sheets[sheet - 1].invalidate();
        }
        Ok(())
    }

    /// Replace the rules assigned to a dot type on one sheet.
    pub fn set_continuities(
        &mut self,
        sheet: usize,
        dot_type: DotType,
        rules: Vec<ContinuityRule>,
    ) -> DrillResult<()> {
        let s = self.sheet_mut(sheet)?;
        for rule in &rules {
            rule.validate()?;
            check_line_dots(s, rule)?;
        }
        if rules.is_empty() {
            s.continuities.remove(&dot_type);
        } else {
            s.continuities.insert(dot_type, rules);
        }
        s.invalidate();
        Ok(())
    }

    /// Change a sheet's beat count.
    pub fn set_num_beats(&mut self, sheet: usize, num_beats: Beats) -> DrillResult<()> {
        let s = self.sheet_mut(sheet)?;
        s.num_beats = num_beats;
        s.invalidate();
        Ok(())
    }

    /// Replace the show-wide defaults; every sheet is invalidated.
    pub fn set_defaults(&mut self, defaults: ShowDefaults) -> DrillResult<()> {
        defaults.validate()?;
        self.defaults = defaults;
        for s in &mut self.sheets {
            s.invalidate();
        }
        Ok(())
    }

    /// State of `dot` at a sheet-local beat.
    pub fn sheet_state_at(
        &self,
        sheet: usize,
        dot: &DotId,
        beat: f64,
    ) -> DrillResult<AnimationState> {
        self.sheet(sheet)?.timeline(dot)?.state_at(beat)
    }

    /// Map a show-global beat to `(sheet index, local beat)`.
    ///
    /// A beat equal to the total length resolves to the end of the last sheet.
    pub fn locate_beat(&self, beat: f64) -> DrillResult<(usize, f64)> {
        if !beat.is_finite() || beat < 0.0 {
            return Err(DrillError::evaluation(format!(
                "beat must be finite and >= 0, got {beat}"
            )));
        }
        let Some(last) = self.sheets.len().checked_sub(1) else {
            return Err(DrillError::evaluation("show has no sheets"));
        };
        let mut local = beat;
        for (i, s) in self.sheets.iter().enumerate() {
            let len = f64::from(s.num_beats);
            if local < len {
                return Ok((i, local));
            }
            local -= len;
        }
        if local <= 0.0 {
            return Ok((last, f64::from(self.sheets[last].num_beats)));
        }
        Err(DrillError::evaluation(format!(
            "beat {beat} is past the end of the show ({} beats)",
            self.total_beats()
        )))
    }

    /// State of `dot` at a show-global beat.
    pub fn state_at(&self, dot: &DotId, beat: f64) -> DrillResult<AnimationState> {
        let (sheet, local) = self.locate_beat(beat)?;
        self.sheet_state_at(sheet, dot, local)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/show/model.rs"]
mod tests;

use crate::{
    continuity::grid::{AxisOrder, Diagonal, DiagonalOrder, FountainGrid, Grapevine},
    continuity::line::LineRule,
    continuity::rule::{ContinuityRule, EvenStep, ForwardMarch, GateTurn, StopRule},
    continuity::settings::{Overrides, ShowDefaults},
    foundation::core::{Angle, Beats, Coordinate, DotId},
    foundation::error::{DrillError, DrillResult},
    show::model::{DotType, Sheet, SheetDot, Show, Song},
};

/// Fluent construction of a [`Show`], validated on [`ShowBuilder::build`].
pub struct ShowBuilder {
    title: String,
    defaults: ShowDefaults,
    songs: Vec<Song>,
    dots: Vec<DotId>,
    sheets: Vec<Sheet>,
}

impl ShowBuilder {
    /// Start an empty show.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            defaults: ShowDefaults::default(),
            songs: Vec::new(),
            dots: Vec::new(),
            sheets: Vec::new(),
        }
    }

    /// Show-wide defaults.
    pub fn defaults(mut self, defaults: ShowDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Declare a song.
    pub fn song(mut self, name: impl Into<String>, overrides: Overrides) -> DrillResult<Self> {
        let name = name.into();
        if self.songs.iter().any(|s| s.name == name) {
            return Err(DrillError::validation(format!("duplicate song '{name}'")));
        }
        self.songs.push(Song { name, overrides });
        Ok(self)
    }

    /// Add one dot to the roster.
    pub fn dot(mut self, id: impl Into<DotId>) -> DrillResult<Self> {
        let id = id.into();
        if self.dots.contains(&id) {
            return Err(DrillError::validation(format!("duplicate dot '{id}'")));
        }
        self.dots.push(id);
        Ok(self)
    }

    /// Add several dots to the roster.
    pub fn dots<I, D>(self, ids: I) -> DrillResult<Self>
    where
        I: IntoIterator<Item = D>,
        D: Into<DotId>,
    {
        ids.into_iter().try_fold(self, |b, id| b.dot(id))
    }

    /// Append a sheet.
    pub fn sheet(mut self, sheet: Sheet) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Validate and produce the show.
    pub fn build(self) -> DrillResult<Show> {
        let show = Show {
            title: self.title,
            defaults: self.defaults,
            songs: self.songs,
            dots: self.dots,
            sheets: self.sheets,
        };
        show.validate()?;
        Ok(show)
    }
}

/// Fluent construction of a [`Sheet`].
pub struct SheetBuilder {
    sheet: Sheet,
}

impl SheetBuilder {
    /// Start a sheet of `num_beats` beats.
    pub fn new(label: impl Into<String>, num_beats: Beats) -> Self {
        Self {
            sheet: Sheet::new(label.into(), num_beats),
        }
    }

    /// Assign the sheet to a song.
    pub fn song(mut self, name: impl Into<String>) -> Self {
        self.sheet.song = Some(name.into());
        self
    }

    /// Sheet-level overrides.
    pub fn overrides(mut self, overrides: Overrides) -> Self {
        self.sheet.overrides = overrides;
        self
    }

    /// Place a dot.
    pub fn dot(
        mut self,
        id: impl Into<DotId>,
        position: Coordinate,
        dot_type: DotType,
    ) -> DrillResult<Self> {
        let id = id.into();
        if self.sheet.dots.contains_key(&id) {
            return Err(DrillError::validation(format!(
                "sheet '{}': duplicate dot '{id}'",
                self.sheet.label
            )));
        }
        if dot_type.is_pseudo() {
            return Err(DrillError::validation(format!(
                "sheet '{}': dot '{id}' cannot use pseudo type {dot_type:?}",
                self.sheet.label
            )));
        }
        self.sheet
            .dots
            .insert(id, SheetDot { position, dot_type });
        Ok(self)
    }

    /// Append a rule to a dot type's list.
    pub fn continuity(mut self, dot_type: DotType, rule: ContinuityRule) -> Self {
        self.sheet
            .continuities
            .entry(dot_type)
            .or_default()
            .push(rule);
        self
    }

    /// Finish the sheet.
    pub fn build(self) -> DrillResult<Sheet> {
        if self.sheet.label.trim().is_empty() {
            return Err(DrillError::validation("sheet label must be non-empty"));
        }
        for rule in self.sheet.continuities.values().flatten() {
            rule.validate()?;
        }
        Ok(self.sheet)
    }
}

/// March `steps` steps along `direction`.
pub fn forward_march(steps: u32, direction: Angle) -> ContinuityRule {
    ContinuityRule::ForwardMarch(ForwardMarch {
        steps,
        direction,
        settings: Overrides::default(),
    })
}

/// Even step to the next formation.
pub fn even_step() -> ContinuityRule {
    ContinuityRule::EvenStep(EvenStep::default())
}

/// Mark time; `None` fills the rest of the sheet.
pub fn mark_time(duration: Option<Beats>) -> ContinuityRule {
    ContinuityRule::MarkTime(StopRule {
        duration,
        settings: Overrides::default(),
    })
}

/// Close; `None` fills the rest of the sheet.
pub fn close(duration: Option<Beats>) -> ContinuityRule {
    ContinuityRule::Close(StopRule {
        duration,
        settings: Overrides::default(),
    })
}

/// Fountain grid to the next formation.
pub fn fountain_grid(order: AxisOrder) -> ContinuityRule {
    ContinuityRule::FountainGrid(FountainGrid {
        order,
        settings: Overrides::default(),
    })
}

/// Diagonal plus straight leg to the next formation.
pub fn diagonal(order: DiagonalOrder) -> ContinuityRule {
    ContinuityRule::Diagonal(Diagonal {
        order,
        settings: Overrides::default(),
    })
}

/// Gate turn around `center` by `degrees`.
pub fn gate_turn(center: Coordinate, degrees: f64) -> ContinuityRule {
    ContinuityRule::GateTurn(GateTurn {
        center,
        degrees,
        settings: Overrides::default(),
    })
}

fn line<I, D>(order: I, path: Vec<Coordinate>) -> LineRule
where
    I: IntoIterator<Item = D>,
    D: Into<DotId>,
{
    LineRule {
        order: order.into_iter().map(Into::into).collect(),
        path,
        duration: None,
        settings: Overrides::default(),
    }
}

/// Follow the leader along `order` (leader first), then `path`.
pub fn follow_leader<I, D>(order: I, path: Vec<Coordinate>) -> ContinuityRule
where
    I: IntoIterator<Item = D>,
    D: Into<DotId>,
{
    ContinuityRule::FollowLeader(line(order, path))
}

/// Counter march along `order` (leader first) through `path` and back.
pub fn counter_march<I, D>(order: I, path: Vec<Coordinate>) -> ContinuityRule
where
    I: IntoIterator<Item = D>,
    D: Into<DotId>,
{
    ContinuityRule::CounterMarch(line(order, path))
}

/// Grapevine to the next formation.
pub fn grapevine(order: AxisOrder) -> ContinuityRule {
    ContinuityRule::Grapevine(Grapevine {
        order,
        settings: Overrides::default(),
    })
}

/// Two-step to the next formation.
pub fn two_step(order: AxisOrder) -> ContinuityRule {
    ContinuityRule::TwoStep(Grapevine {
        order,
        settings: Overrides::default(),
    })
}

/// Copy of `rule` with its overrides replaced.
pub fn with_overrides(mut rule: ContinuityRule, overrides: Overrides) -> ContinuityRule {
    match &mut rule {
        ContinuityRule::ForwardMarch(r) => r.settings = overrides,
        ContinuityRule::EvenStep(r) => r.settings = overrides,
        ContinuityRule::MarkTime(r) | ContinuityRule::Close(r) => r.settings = overrides,
        ContinuityRule::FountainGrid(r) => r.settings = overrides,
        ContinuityRule::Diagonal(r) => r.settings = overrides,
        ContinuityRule::CounterMarch(r) | ContinuityRule::FollowLeader(r) => {
            r.settings = overrides
        }
        ContinuityRule::GateTurn(r) => r.settings = overrides,
        ContinuityRule::Grapevine(r) | ContinuityRule::TwoStep(r) => r.settings = overrides,
    }
    rule
}

#[cfg(test)]
#[path = "../../tests/unit/show/dsl.rs"]
mod tests;

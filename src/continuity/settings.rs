use crate::{
    foundation::core::{Angle, Beats},
    foundation::error::{DrillError, DrillResult},
};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
/// Marching style shown for moving segments.
pub enum StepType {
    /// Standard high step.
    #[default]
    HighStep,
    /// Mini military.
    MiniMilitary,
    /// Full field (8 to 5).
    FullField,
    /// Show high.
    ShowHigh,
    /// Jerky step.
    JerkyStep,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
/// Facing rule applied while a continuity runs.
pub enum Orientation {
    /// Always face the east sideline.
    #[serde(rename = "east")]
    East,
    /// Always face the west sideline.
    #[serde(rename = "west")]
    West,
    /// Face the direction of travel.
    #[serde(rename = "", alias = "travel")]
    Travel,
}

impl Orientation {
    /// Fixed facing, or `None` when facing follows travel.
    pub fn fixed_angle(self) -> Option<Angle> {
        match self {
            Self::East => Some(Angle::EAST),
            Self::West => Some(Angle::WEST),
            Self::Travel => None,
        }
    }

    /// Facing to hold while travelling along `travel`.
    pub fn facing_for(self, travel: Angle) -> Angle {
        self.fixed_angle().unwrap_or(travel)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// Optional overrides carried by songs, sheets and rules.
///
/// A `None` field means "default": it is resolved from the next level of the
/// rule → sheet → song → show chain.
pub struct Overrides {
    /// Step type override.
    #[serde(default, with = "setting", skip_serializing_if = "Option::is_none")]
    pub step_type: Option<StepType>,
    /// Beats-per-step override.
    #[serde(default, with = "setting", skip_serializing_if = "Option::is_none")]
    pub beats_per_step: Option<Beats>,
    /// Orientation override.
    #[serde(default, with = "setting", skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
}

impl Overrides {
    /// Reject a zero beats-per-step override.
    pub fn validate(&self, owner: &str) -> DrillResult<()> {
        if self.beats_per_step == Some(0) {
            return Err(DrillError::validation(format!(
                "{owner}: beats_per_step must be > 0"
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Concrete show-wide defaults at the root of the resolution chain.
pub struct ShowDefaults {
    /// Default step type.
    pub step_type: StepType,
    /// Default beats per step.
    pub beats_per_step: Beats,
    /// Default orientation.
    pub orientation: Orientation,
}

impl Default for ShowDefaults {
    fn default() -> Self {
        Self {
            step_type: StepType::HighStep,
            beats_per_step: 1,
            orientation: Orientation::Travel,
        }
    }
}

impl ShowDefaults {
    /// Reject a zero beats-per-step default.
    pub fn validate(&self) -> DrillResult<()> {
        if self.beats_per_step == 0 {
            return Err(DrillError::validation(
                "show defaults: beats_per_step must be > 0",
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
/// Borrowed sheet → song → show chain used to resolve "default" settings.
///
/// Nothing is cached: each call walks the chain, so edits to any level are
/// seen on the next resolution.
pub struct DefaultChain<'a> {
    /// Overrides of the sheet owning the rules.
    pub sheet: &'a Overrides,
    /// Overrides of the sheet's song, if it belongs to one.
    pub song: Option<&'a Overrides>,
    /// Show-wide defaults.
    pub show: &'a ShowDefaults,
}

impl<'a> DefaultChain<'a> {
    /// Resolve a rule's own overrides against the chain.
    pub fn resolve(&self, rule: &Overrides) -> ResolvedSettings {
        ResolvedSettings {
            step_type: self.pick(rule, |o| o.step_type, self.show.step_type),
            beats_per_step: self.pick(rule, |o| o.beats_per_step, self.show.beats_per_step),
            orientation: self.pick(rule, |o| o.orientation, self.show.orientation),
        }
    }

    fn pick<T: Copy>(&self, rule: &Overrides, field: impl Fn(&Overrides) -> Option<T>, root: T) -> T {
        field(rule)
            .or_else(|| field(self.sheet))
            .or_else(|| self.song.and_then(|s| field(s)))
            .unwrap_or(root)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// Fully concrete settings a rule runs with.
pub struct ResolvedSettings {
    /// Step type.
    pub step_type: StepType,
    /// Beats per step (never zero for validated shows).
    pub beats_per_step: Beats,
    /// Orientation.
    pub orientation: Orientation,
}

impl ResolvedSettings {
    /// Beats per step, guarded against a zero coming from unvalidated data.
    pub(crate) fn cadence(&self) -> Beats {
        self.beats_per_step.max(1)
    }
}

/// Serde adapter: `None` <-> absent, and the string `"default"` reads as `None`.
mod setting {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Value(T),
        Keyword(String),
    }

    pub(super) fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(v) => v.serialize(serializer),
            None => serializer.serialize_str("default"),
        }
    }

    pub(super) fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        match Raw::<T>::deserialize(deserializer)? {
            Raw::Value(v) => Ok(Some(v)),
            Raw::Keyword(k) if k == "default" => Ok(None),
            Raw::Keyword(k) => Err(serde::de::Error::custom(format!(
                "unknown setting value '{k}'"
            ))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/continuity/settings.rs"]
mod tests;

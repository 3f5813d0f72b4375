use crate::foundation::core::DotId;

/// Convenience result type used across drillmotion.
pub type DrillResult<T> = Result<T, DrillError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum DrillError {
    /// Invalid user-provided show or continuity data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A dot's timeline could not answer a state query.
    #[error(transparent)]
    AnimationState(#[from] AnimationStateError),

    /// Invalid query against the show (unknown dot, sheet, or stale caches).
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DrillError {
    /// Build a [`DrillError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`DrillError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`DrillError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

/// Raised when a beat lies outside what a dot's timeline covers.
///
/// The two variants separate an unassigned dot (no movements at all, usually
/// intentional) from an authoring defect where the movements stop short.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum AnimationStateError {
    /// The dot has no movements on this sheet.
    #[error("dot '{dot}' has no movements")]
    NoMovements {
        /// Dot that was queried.
        dot: DotId,
    },
    /// The requested beat lies past the end of the dot's movements.
    #[error("dot '{dot}' ran out of movement at beat {available} (requested beat {beat})")]
    Underrun {
        /// Dot that was queried.
        dot: DotId,
        /// Requested sheet-local beat.
        beat: f64,
        /// Beats covered by the dot's timeline.
        available: f64,
    },
}

impl AnimationStateError {
    /// Dot the failed query was made for.
    pub fn dot(&self) -> &DotId {
        match self {
            Self::NoMovements { dot } | Self::Underrun { dot, .. } => dot,
        }
    }

    /// Beats missing between the timeline's end and the requested beat.
    pub fn deficit(&self) -> Option<f64> {
        match self {
            Self::NoMovements { .. } => None,
            Self::Underrun {
                beat, available, ..
            } => Some(beat - available),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

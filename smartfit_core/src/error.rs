//! Error types for the smartfit_core library.

use crate::types::{BodyPart, ExerciseId, SetId};
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classes of failure, used by callers to decide how to surface an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Locally detected invalid state; nothing was sent anywhere.
    InputRejected,
    /// The exercise list could not be fetched; custom entry still works.
    CatalogUnavailable,
    /// A create/update/submit call failed; editing state is preserved.
    PersistenceFailed,
    /// Configuration could not be read or written.
    Configuration,
}

/// Core error type for smartfit_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Transport error talking to the remote record store
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Please select a body part first")]
    NoBodyPart,

    #[error("Please select or enter an exercise name")]
    EmptyExerciseName,

    #[error("{name} ({body_part}) is already added")]
    DuplicateExercise { name: String, body_part: BodyPart },

    #[error("Unknown body part: {0}")]
    UnknownBodyPart(String),

    /// Unrecognised enumeration value from user input
    #[error("Invalid choice: {0}")]
    InvalidChoice(String),

    #[error("No exercise with id {0}")]
    UnknownExercise(ExerciseId),

    #[error("No set {set} in exercise {exercise}")]
    UnknownSet { exercise: ExerciseId, set: SetId },

    /// Rating outside the 6-10 scale
    #[error("RPE must be between 6-10, got {0}")]
    InvalidRating(u8),

    /// Negative or non-finite weight
    #[error("Weight must be a non-negative number, got {0}")]
    InvalidWeight(f64),

    /// Energy level outside the 1-10 scale
    #[error("Energy level must be between 1-10, got {0}")]
    InvalidEnergyLevel(u8),

    /// Sleep hours negative, non-finite or above a day
    #[error("Sleep hours must be between 0-24, got {0}")]
    InvalidSleepHours(f64),

    /// Submit called on an empty session
    #[error("Please add at least one exercise")]
    NothingToLog,

    /// A set with zero reps or zero weight was found at submit time
    #[error("Please fill in all sets for {exercise}")]
    IncompleteSets { exercise: String },

    /// A submit or save is already in flight
    #[error("Another save is already in progress")]
    Busy,

    /// Exercise list fetch failed
    #[error("Failed to load exercises: {0}")]
    CatalogUnavailable(String),

    /// One or more writes to the record store failed
    #[error("Failed to save ({failed} of {total} writes failed): {message}")]
    Persistence {
        failed: usize,
        total: usize,
        message: String,
    },
}

impl Error {
    /// Classify this error for presentation.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoBodyPart
            | Error::EmptyExerciseName
            | Error::DuplicateExercise { .. }
            | Error::UnknownBodyPart(_)
            | Error::InvalidChoice(_)
            | Error::UnknownExercise(_)
            | Error::UnknownSet { .. }
            | Error::InvalidRating(_)
            | Error::InvalidWeight(_)
            | Error::InvalidEnergyLevel(_)
            | Error::InvalidSleepHours(_)
            | Error::NothingToLog
            | Error::IncompleteSets { .. }
            | Error::Busy => ErrorKind::InputRejected,
            Error::CatalogUnavailable(_) => ErrorKind::CatalogUnavailable,
            Error::Io(_) | Error::Json(_) | Error::Http(_) | Error::Persistence { .. } => {
                ErrorKind::PersistenceFailed
            }
            Error::Toml(_) | Error::Config(_) => ErrorKind::Configuration,
        }
    }

    /// Wrap a single failed write as a persistence error.
    pub(crate) fn persistence(err: &Error) -> Self {
        Error::Persistence {
            failed: 1,
            total: 1,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(Error::NothingToLog.kind(), ErrorKind::InputRejected);
        assert_eq!(Error::Busy.kind(), ErrorKind::InputRejected);
        assert_eq!(
            Error::CatalogUnavailable("offline".into()).kind(),
            ErrorKind::CatalogUnavailable
        );
        assert_eq!(
            Error::persistence(&Error::Config("x".into())).kind(),
            ErrorKind::PersistenceFailed
        );
        assert_eq!(Error::Config("x".into()).kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_incomplete_sets_names_exercise() {
        let err = Error::IncompleteSets {
            exercise: "Bench Press".into(),
        };
        assert_eq!(err.to_string(), "Please fill in all sets for Bench Press");
    }
}

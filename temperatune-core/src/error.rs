//! # Error Module
//!
//! Construction-time failures of a temperament. Every variant is fatal to the
//! construction attempt: a [`Temperament`](crate::temperament::Temperament) is
//! never partially built. Lookups on an existing temperament do not use this
//! type; they return `Option` so a stale note name cannot take the host down.

use thiserror::Error;

/// Result type for temperament construction.
pub type Result<T> = std::result::Result<T, TemperamentError>;

/// Errors that can occur while loading or resolving a temperament.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemperamentError {
    /// The description does not have the required shape or field values.
    #[error("invalid temperament description: {message}")]
    Validation {
        /// What was wrong with the description.
        message: String,
    },

    /// Two relations imply different offsets for the same note.
    #[error(
        "conflicting definitions for note '{note}': resolved to {existing} cents, \
         another relation implies {computed} cents"
    )]
    ConflictingDefinition {
        /// The over-determined note.
        note: String,
        /// Offset already assigned.
        existing: f64,
        /// Offset implied by the relation currently being followed.
        computed: f64,
    },

    /// A note cannot be reached from the reference note.
    #[error("note '{note}' is not related to the reference note")]
    UnreachableNote {
        /// The note without a path to the reference.
        note: String,
    },

    /// The octave base note has no resolvable offset.
    #[error("octave base note '{note}' is not defined")]
    UndefinedOctaveBase {
        /// The configured octave base name.
        note: String,
    },

    /// A temperament set already holds a temperament of that name.
    #[error("a temperament named '{name}' is already loaded")]
    DuplicateName {
        /// The clashing name.
        name: String,
    },
}

impl TemperamentError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        TemperamentError::Validation {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for TemperamentError {
    fn from(err: serde_json::Error) -> Self {
        TemperamentError::validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_note() {
        let err = TemperamentError::UnreachableNote {
            note: "G".to_string(),
        };
        assert_eq!(err.to_string(), "note 'G' is not related to the reference note");

        let err = TemperamentError::ConflictingDefinition {
            note: "C".to_string(),
            existing: -400.0,
            computed: 500.0,
        };
        assert!(err.to_string().contains("'C'"));
        assert!(err.to_string().contains("-400"));
    }

    #[test]
    fn json_errors_become_validation_errors() {
        let err: TemperamentError = serde_json::from_str::<u32>("\"x\"").unwrap_err().into();
        assert!(matches!(err, TemperamentError::Validation { .. }));
    }
}

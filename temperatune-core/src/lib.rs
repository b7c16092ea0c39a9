// temperatune-core/src/lib.rs

//! The core logic for the Temperatune tuner and tone generator.
//! This crate resolves temperaments (user-definable tuning systems) into
//! note offsets and converts between note names and pitches. It is completely
//! headless and performs no audio I/O.

pub mod analysis;
pub mod builtin;
pub mod description;
pub mod error;
pub mod note_name;
pub mod pitch;
pub mod temperament;

pub use description::{NoteDefinition, TemperamentDescription};
pub use error::{Result, TemperamentError};
pub use note_name::prettify_note_name;
pub use temperament::{NoteReading, OCTAVE_CENTS, Temperament};

/// Represents the result of a single audio analysis frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResult {
    /// The detected frequency in Hz.
    pub detected_frequency: Option<f32>,
    /// The clarity of the detected frequency (0.0 to 1.0).
    pub clarity: Option<f32>,
    /// The nearest note and the deviation from it, if the estimate was clear.
    pub note: Option<NoteReading>,
}

//! # Temperament Description Module
//!
//! The interchange format for temperaments. A description is untrusted input,
//! usually read from a JSON file, and is checked here before any note
//! relations are resolved:
//!
//! ```json
//! {
//!   "name": "Equal temperament",
//!   "referenceName": "A",
//!   "referencePitch": 440,
//!   "referenceOctave": 4,
//!   "octaveBaseName": "C",
//!   "notes": { "A{sharp}": ["A", 100], "B": ["A{sharp}", 100] }
//! }
//! ```
//!
//! Each `notes` entry `note: [related, cents]` states that `note` lies `cents`
//! above `related`.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{Result, TemperamentError};

/// One relative definition: the related note name and the cent distance from
/// it. Serialized as a two-element array `[related, cents]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteDefinition(pub String, pub f64);

impl NoteDefinition {
    pub fn related(&self) -> &str {
        &self.0
    }

    pub fn cents(&self) -> f64 {
        self.1
    }
}

/// A temperament as written in a temperament file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TemperamentDescription {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub reference_name: String,
    pub reference_pitch: f64,
    pub reference_octave: i32,
    pub octave_base_name: String,
    pub notes: BTreeMap<String, NoteDefinition>,
}

impl TemperamentDescription {
    /// Parses and validates a single description.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let description: Self = serde_json::from_str(json)?;
        description.validate()?;
        Ok(description)
    }

    /// Converts an already parsed JSON value and validates it.
    pub fn from_json_value(value: Value) -> Result<Self> {
        let description: Self = serde_json::from_value(value)?;
        description.validate()?;
        Ok(description)
    }

    /// Checks the field values that the schema alone cannot express.
    pub fn validate(&self) -> Result<()> {
        require_name("name", &self.name)?;
        require_name("referenceName", &self.reference_name)?;
        require_name("octaveBaseName", &self.octave_base_name)?;

        if !self.reference_pitch.is_finite() || self.reference_pitch <= 0.0 {
            return Err(TemperamentError::validation(format!(
                "referencePitch must be a positive number of Hz, got {}",
                self.reference_pitch
            )));
        }

        for (note, definition) in &self.notes {
            require_name("notes key", note)?;
            if definition.related().trim().is_empty() {
                return Err(TemperamentError::validation(format!(
                    "note '{note}' is defined relative to an empty note name"
                )));
            }
            if !definition.cents().is_finite() {
                return Err(TemperamentError::validation(format!(
                    "note '{note}' has a non-finite cent offset"
                )));
            }
        }

        debug!(
            "Validated temperament description '{}' with {} note relations",
            self.name,
            self.notes.len()
        );
        Ok(())
    }

    /// Returns a copy of this description anchored to a different reference
    /// pitch. The copy is validated when a temperament is built from it.
    pub fn with_reference_pitch(&self, reference_pitch: f64) -> Self {
        Self {
            reference_pitch,
            ..self.clone()
        }
    }

    pub fn to_json_string_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parses a temperament file that holds either one description object or an
/// array of them.
pub fn descriptions_from_json_str(json: &str) -> Result<Vec<TemperamentDescription>> {
    match serde_json::from_str::<Value>(json)? {
        Value::Array(values) => values
            .into_iter()
            .map(TemperamentDescription::from_json_value)
            .collect(),
        value @ Value::Object(_) => Ok(vec![TemperamentDescription::from_json_value(value)?]),
        _ => Err(TemperamentError::validation(
            "expected a temperament object or an array of temperament objects",
        )),
    }
}

fn require_name(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(TemperamentError::validation(format!(
            "{field} must be a non-empty string"
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MINIMAL: &str = r#"{
        "name": "Tiny",
        "referenceName": "A",
        "referencePitch": 440,
        "referenceOctave": 4,
        "octaveBaseName": "C",
        "notes": { "C": ["A", 300] }
    }"#;

    fn is_validation_error(json: &str) -> bool {
        matches!(
            TemperamentDescription::from_json_str(json),
            Err(TemperamentError::Validation { .. })
        )
    }

    #[test]
    fn parses_minimal_description() {
        let description = TemperamentDescription::from_json_str(MINIMAL).unwrap();
        assert_eq!(description.name, "Tiny");
        assert_eq!(description.description, None);
        assert_eq!(description.reference_octave, 4);
        assert_eq!(
            description.notes.get("C"),
            Some(&NoteDefinition("A".to_string(), 300.0))
        );
    }

    #[test]
    fn rejects_missing_and_extra_fields() {
        assert!(is_validation_error(
            r#"{ "name": "x", "referenceName": "A", "referencePitch": 440,
                 "referenceOctave": 4, "notes": {} }"#
        ));
        assert!(is_validation_error(
            r#"{ "name": "x", "referenceName": "A", "referencePitch": 440,
                 "referenceOctave": 4, "octaveBaseName": "A", "notes": {},
                 "colour": "blue" }"#
        ));
    }

    #[test]
    fn rejects_malformed_note_pairs() {
        let with_notes = |notes: &str| {
            format!(
                r#"{{ "name": "x", "referenceName": "A", "referencePitch": 440,
                      "referenceOctave": 4, "octaveBaseName": "A", "notes": {notes} }}"#
            )
        };
        assert!(is_validation_error(&with_notes(r#"{ "B": ["A"] }"#)));
        assert!(is_validation_error(&with_notes(r#"{ "B": ["A", 200, 3] }"#)));
        assert!(is_validation_error(&with_notes(r#"{ "B": [200, "A"] }"#)));
        assert!(is_validation_error(&with_notes(r#"{ "B": "A" }"#)));
        assert!(is_validation_error(&with_notes(r#"{ "B": ["", 200] }"#)));
        assert!(is_validation_error(&with_notes(r#"[]"#)));
    }

    #[test]
    fn rejects_bad_field_values() {
        assert!(is_validation_error(&MINIMAL.replace("440", "0")));
        assert!(is_validation_error(&MINIMAL.replace("440", "-440")));
        assert!(is_validation_error(&MINIMAL.replace("\"Tiny\"", "\"  \"")));
        assert!(is_validation_error(&MINIMAL.replace("\"Tiny\"", "3")));
    }

    #[test]
    fn rejects_fractional_octave() {
        assert!(is_validation_error(
            &MINIMAL.replace("\"referenceOctave\": 4", "\"referenceOctave\": 4.5")
        ));
    }

    #[test]
    fn rejects_non_finite_offsets_built_in_code() {
        let mut description = TemperamentDescription::from_json_str(MINIMAL).unwrap();
        description
            .notes
            .insert("D".to_string(), NoteDefinition("A".to_string(), f64::NAN));
        assert!(matches!(
            description.validate(),
            Err(TemperamentError::Validation { .. })
        ));
    }

    #[test]
    fn reference_pitch_copy_leaves_original_untouched() {
        let description = TemperamentDescription::from_json_str(MINIMAL).unwrap();
        let retuned = description.with_reference_pitch(415.0);
        assert_eq!(description.reference_pitch, 440.0);
        assert_eq!(retuned.reference_pitch, 415.0);
        assert_eq!(retuned.notes, description.notes);
    }

    #[test]
    fn serializes_back_to_the_same_shape() {
        let description = TemperamentDescription::from_json_str(MINIMAL).unwrap();
        let json = description.to_json_string_pretty().unwrap();
        assert!(json.contains("\"octaveBaseName\": \"C\""));
        assert!(!json.contains("\"description\""));
        assert_eq!(TemperamentDescription::from_json_str(&json).unwrap(), description);
    }

    #[test]
    fn reads_single_objects_and_arrays() {
        assert_eq!(descriptions_from_json_str(MINIMAL).unwrap().len(), 1);
        let array = format!("[{MINIMAL}, {}]", MINIMAL.replace("Tiny", "Other"));
        let names: Vec<_> = descriptions_from_json_str(&array)
            .unwrap()
            .into_iter()
            .map(|description| description.name)
            .collect();
        assert_eq!(names, vec!["Tiny", "Other"]);
        assert!(descriptions_from_json_str("42").is_err());
    }
}

//! # Built-in Temperaments
//!
//! The temperaments shipped with the application, plus [`TemperamentSet`],
//! the name-keyed collection the host keeps loaded temperaments in. Names are
//! unique within a set; user-supplied files are merged into a copy of the
//! built-in set and rejected if they reuse a name.

use log::debug;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

use crate::description::{TemperamentDescription, descriptions_from_json_str};
use crate::error::{Result, TemperamentError};
use crate::temperament::Temperament;

/// Name of the temperament used when nothing else is selected.
pub const DEFAULT_TEMPERAMENT: &str = "Equal temperament";

const BUILTIN_JSON: &str = include_str!("../temperaments/builtin.json");

/// Built-in temperaments, parsed and resolved once on first use.
static BUILTIN: Lazy<TemperamentSet> = Lazy::new(|| {
    // The embedded file is covered by tests; failing here is a build defect.
    load_set(BUILTIN_JSON).expect("built-in temperaments are valid")
});

/// Loaded temperaments, looked up by name, kept in load order.
#[derive(Debug, Clone, Default)]
pub struct TemperamentSet {
    temperaments: Vec<Temperament>,
    // Maps a temperament name to its position in `temperaments`.
    index: BTreeMap<String, usize>,
}

impl TemperamentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from descriptions, failing on the first invalid
    /// description or duplicate name.
    pub fn from_descriptions(
        descriptions: impl IntoIterator<Item = TemperamentDescription>,
    ) -> Result<Self> {
        let mut set = Self::new();
        for description in descriptions {
            set.insert(Temperament::new(description)?)?;
        }
        Ok(set)
    }

    /// Adds a temperament. Names must be unique within the set.
    pub fn insert(&mut self, temperament: Temperament) -> Result<()> {
        if self.index.contains_key(temperament.name()) {
            return Err(TemperamentError::DuplicateName {
                name: temperament.name().to_string(),
            });
        }
        debug!("Loaded temperament '{}'", temperament.name());
        self.index
            .insert(temperament.name().to_string(), self.temperaments.len());
        self.temperaments.push(temperament);
        Ok(())
    }

    /// Parses a temperament file (one object or an array) and adds every
    /// temperament in it.
    pub fn extend_from_json_str(&mut self, json: &str) -> Result<()> {
        for description in descriptions_from_json_str(json)? {
            self.insert(Temperament::new(description)?)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Temperament> {
        self.index.get(name).map(|&i| &self.temperaments[i])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.temperaments.iter().map(Temperament::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Temperament> + '_ {
        self.temperaments.iter()
    }

    pub fn len(&self) -> usize {
        self.temperaments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperaments.is_empty()
    }
}

fn load_set(json: &str) -> Result<TemperamentSet> {
    TemperamentSet::from_descriptions(descriptions_from_json_str(json)?)
}

/// The shared set of built-in temperaments.
pub fn temperaments() -> &'static TemperamentSet {
    &BUILTIN
}

/// Twelve-tone equal temperament with A4 = 440 Hz.
pub fn default_temperament() -> &'static Temperament {
    // Equal temperament is the first entry of the embedded file.
    BUILTIN
        .get(DEFAULT_TEMPERAMENT)
        .unwrap_or(&BUILTIN.temperaments[0])
}

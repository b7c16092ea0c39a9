//! # Temperament Module
//!
//! Turns a [`TemperamentDescription`] into an immutable [`Temperament`] that
//! converts between note names and pitches.
//!
//! Construction runs in two phases:
//! 1. **Resolution**: starting from the reference note (offset 0), every
//!    relation `note: [related, cents]` is followed breadth-first in both
//!    directions until all reachable notes have an absolute cent offset.
//!    Each relation is applied once; a note that receives a second, different
//!    offset through another relation is a conflict. Offsets are compared
//!    exactly, no tolerance is applied.
//! 2. **Normalization**: the octave base note is moved into `(-1200, 0]` and
//!    every other note into the octave band starting at the octave base. Notes
//!    only ever move by whole octaves.

use log::debug;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::description::TemperamentDescription;
use crate::error::{Result, TemperamentError};
use crate::note_name::prettify_note_name;

/// Size of an octave in cents.
pub const OCTAVE_CENTS: f64 = 1200.0;

/// The note nearest to a measured pitch.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteReading {
    /// Raw note name as written in the temperament.
    pub name: String,
    /// Octave number of the matched note.
    pub octave: i32,
    /// Signed distance from the matched note. Negative is flat, positive is sharp.
    pub cents: f64,
}

/// A resolved tuning system. Immutable once built.
#[derive(Debug, Clone)]
pub struct Temperament {
    description: TemperamentDescription,
    offsets: HashMap<String, f64>,
    /// Sorted ascending by offset, octave base first.
    note_names: Vec<String>,
}

impl Temperament {
    /// Validates the description and resolves all note offsets.
    pub fn new(description: TemperamentDescription) -> Result<Self> {
        description.validate()?;

        let raw_offsets = resolve_offsets(&description)?;
        let offsets = normalize_offsets(raw_offsets, &description.octave_base_name);
        let note_names = sorted_note_names(&offsets, &description.octave_base_name);

        debug!(
            "Built temperament '{}' with {} notes, octave starts at '{}' ({} cents)",
            description.name,
            note_names.len(),
            description.octave_base_name,
            offsets[&description.octave_base_name]
        );

        Ok(Self {
            description,
            offsets,
            note_names,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::new(TemperamentDescription::from_json_str(json)?)
    }

    /// Builds a new temperament that differs only in its reference pitch.
    pub fn with_reference_pitch(&self, reference_pitch: f64) -> Result<Self> {
        Self::new(self.description.with_reference_pitch(reference_pitch))
    }

    pub fn name(&self) -> &str {
        &self.description.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.description.as_deref()
    }

    pub fn reference_name(&self) -> &str {
        &self.description.reference_name
    }

    pub fn reference_pitch(&self) -> f64 {
        self.description.reference_pitch
    }

    pub fn reference_octave(&self) -> i32 {
        self.description.reference_octave
    }

    pub fn octave_base_name(&self) -> &str {
        &self.description.octave_base_name
    }

    /// All note names, sorted ascending by offset with the octave base first.
    pub fn note_names(&self) -> &[String] {
        &self.note_names
    }

    pub fn pretty_note_names(&self) -> Vec<String> {
        self.note_names
            .iter()
            .map(|name| prettify_note_name(name))
            .collect()
    }

    /// Normalized offsets in `note_names` order.
    pub fn offsets(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.note_names
            .iter()
            .map(|name| (name.as_str(), self.offsets[name]))
    }

    pub fn contains_note(&self, name: &str) -> bool {
        self.offsets.contains_key(name)
    }

    /// The description this temperament was built from.
    pub fn to_description(&self) -> &TemperamentDescription {
        &self.description
    }

    /// Cent offset of a note in a given octave, relative to the reference
    /// note in the reference octave. `None` for unknown note names.
    pub fn get_offset(&self, name: &str, octave: i32) -> Option<f64> {
        let offset = self.offsets.get(name)?;
        Some(offset + f64::from(octave - self.reference_octave()) * OCTAVE_CENTS)
    }

    /// Frequency in Hz of a note in a given octave. `None` for unknown note
    /// names.
    pub fn get_pitch(&self, name: &str, octave: i32) -> Option<f64> {
        let offset = self.get_offset(name, octave)?;
        Some(self.reference_pitch() * 2f64.powf(offset / OCTAVE_CENTS))
    }

    /// Finds the note nearest to a pitch and the signed cent distance to it.
    /// `None` if the pitch is not a positive, finite frequency. Of several
    /// notes with the same offset, the first in [`Self::note_names`] is named.
    pub fn get_note_name_from_pitch(&self, pitch: f64) -> Option<(&str, f64)> {
        let cents = self.cents_from_reference(pitch)?;
        let (name, _, residual) = self.nearest_note(cents);
        Some((name, residual))
    }

    /// Like [`get_note_name_from_pitch`](Self::get_note_name_from_pitch), but
    /// also reports the octave of the matched note.
    pub fn get_note_from_pitch(&self, pitch: f64) -> Option<NoteReading> {
        let cents = self.cents_from_reference(pitch)?;
        let (name, octave, residual) = self.nearest_note(cents);
        Some(NoteReading {
            name: name.to_string(),
            octave,
            cents: residual,
        })
    }

    fn cents_from_reference(&self, pitch: f64) -> Option<f64> {
        if !pitch.is_finite() || pitch <= 0.0 {
            return None;
        }
        Some(OCTAVE_CENTS * (pitch / self.reference_pitch()).log2())
    }

    /// Nearest note to an offset in cents from the reference, compared within
    /// the octave. The residual lies in `(-600, 600]`; when two notes are
    /// equally near, the lower one wins and the residual is positive.
    /// Notes sharing an offset are never told apart: the one listed first in
    /// `note_names` is returned.
    fn nearest_note(&self, cents: f64) -> (&str, i32, f64) {
        let mut nearest: Option<(&str, f64, f64)> = None;

        for name in &self.note_names {
            let offset = self.offsets[name];
            let mut residual = (cents - offset).rem_euclid(OCTAVE_CENTS);
            if residual > OCTAVE_CENTS / 2.0 {
                residual -= OCTAVE_CENTS;
            }

            let closer = match nearest {
                None => true,
                Some((_, _, best)) => {
                    residual.abs() < best.abs() || (residual.abs() == best.abs() && residual > best)
                }
            };
            if closer {
                nearest = Some((name.as_str(), offset, residual));
            }
        }

        // A temperament always holds at least its reference note.
        let (name, offset, residual) = nearest.unwrap_or((self.reference_name(), 0.0, cents));
        let octaves = ((cents - residual - offset) / OCTAVE_CENTS).round() as i32;
        (name, self.reference_octave() + octaves, residual)
    }
}

impl TryFrom<TemperamentDescription> for Temperament {
    type Error = TemperamentError;

    fn try_from(description: TemperamentDescription) -> Result<Self> {
        Self::new(description)
    }
}

/// Breadth-first propagation of offsets from the reference note.
fn resolve_offsets(description: &TemperamentDescription) -> Result<HashMap<String, f64>> {
    let notes = &description.notes;

    // Relations keyed by the note they are relative to, for the backward direction.
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for (name, definition) in notes {
        dependents
            .entry(definition.related())
            .or_default()
            .push(name.as_str());
    }

    let reference = description.reference_name.as_str();
    let mut offsets: HashMap<String, f64> = HashMap::from([(reference.to_string(), 0.0)]);
    let mut queue: VecDeque<&str> = VecDeque::from([reference]);
    // Relations are identified by the note that owns them.
    let mut applied: HashSet<&str> = HashSet::new();

    while let Some(current) = queue.pop_front() {
        let current_offset = offsets[current];

        if let Some((owner, definition)) = notes.get_key_value(current) {
            if applied.insert(owner.as_str()) {
                let related_offset = current_offset - definition.cents();
                define_offset(&mut offsets, &mut queue, definition.related(), related_offset)?;
            }
        }

        for &name in dependents.get(current).into_iter().flatten() {
            if applied.insert(name) {
                let offset = current_offset + notes[name].cents();
                define_offset(&mut offsets, &mut queue, name, offset)?;
            }
        }
    }

    for (name, definition) in notes {
        for note in [name.as_str(), definition.related()] {
            if !offsets.contains_key(note) {
                return Err(TemperamentError::UnreachableNote {
                    note: note.to_string(),
                });
            }
        }
    }

    if !offsets.contains_key(&description.octave_base_name) {
        return Err(TemperamentError::UndefinedOctaveBase {
            note: description.octave_base_name.clone(),
        });
    }

    debug!(
        "Resolved {} note offsets for '{}' from reference '{}'",
        offsets.len(),
        description.name,
        reference
    );
    Ok(offsets)
}

fn define_offset<'a>(
    offsets: &mut HashMap<String, f64>,
    queue: &mut VecDeque<&'a str>,
    note: &'a str,
    offset: f64,
) -> Result<()> {
    match offsets.get(note) {
        Some(&existing) if existing != offset => Err(TemperamentError::ConflictingDefinition {
            note: note.to_string(),
            existing,
            computed: offset,
        }),
        Some(_) => Ok(()),
        None => {
            offsets.insert(note.to_string(), offset);
            queue.push_back(note);
            Ok(())
        }
    }
}

/// Moves every note into the octave band that starts at the octave base.
fn normalize_offsets(mut offsets: HashMap<String, f64>, octave_base: &str) -> HashMap<String, f64> {
    let mut base = offsets[octave_base] % OCTAVE_CENTS;
    if base > 0.0 {
        base -= OCTAVE_CENTS;
    }

    for (name, offset) in offsets.iter_mut() {
        if name == octave_base {
            *offset = base;
            continue;
        }
        let mut relative = (*offset - base).rem_euclid(OCTAVE_CENTS);
        if relative >= OCTAVE_CENTS {
            relative -= OCTAVE_CENTS;
        }
        *offset = base + relative;
    }
    offsets
}

fn sorted_note_names(offsets: &HashMap<String, f64>, octave_base: &str) -> Vec<String> {
    let mut names: Vec<String> = offsets.keys().cloned().collect();
    names.sort_by(|a, b| {
        offsets[a]
            .total_cmp(&offsets[b])
            .then_with(|| (b == octave_base).cmp(&(a == octave_base)))
            .then_with(|| a.cmp(b))
    });
    names
}

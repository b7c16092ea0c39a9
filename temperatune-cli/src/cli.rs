//! Command line options and the commands they dispatch to.

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use log::{debug, info};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use temperatune_core::analysis::{Analyser, DEFAULT_MIN_CLARITY, analyse_frames};
use temperatune_core::builtin::{self, DEFAULT_TEMPERAMENT, TemperamentSet};
use temperatune_core::pitch::{BUFFER_SIZE, McLeodPitchDetector};
use temperatune_core::{NoteReading, Temperament, prettify_note_name};

use crate::{recording, tone};

#[derive(Parser)]
#[command(
    name = "temperatune",
    version,
    about = "Reference pitches and tuning readings in any temperament"
)]
pub struct Options {
    /// Temperament to use
    #[arg(
        long,
        short,
        global = true,
        env = "TEMPERATUNE_TEMPERAMENT",
        default_value = DEFAULT_TEMPERAMENT
    )]
    temperament: String,

    /// Load additional temperaments from a JSON file (object or array). May be repeated
    #[arg(long = "temperaments-file", global = true, value_name = "PATH")]
    temperament_files: Vec<PathBuf>,

    /// Override the reference pitch of the temperament, in Hz
    #[arg(long, global = true, value_name = "HZ")]
    reference_pitch: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the available temperaments
    List,

    /// Print every note of the temperament with its offset and pitch
    Notes {
        /// Octave to print pitches for
        #[arg(long, default_value_t = 4, allow_negative_numbers = true)]
        octave: i32,
    },

    /// Print the pitch of a note
    Pitch {
        /// Note name, either raw (C{sharp}) or with symbols (C♯)
        note: String,
        #[arg(allow_negative_numbers = true)]
        octave: i32,
    },

    /// Find the note nearest to a frequency
    Name {
        /// Frequency in Hz
        frequency: f64,
    },

    /// Report the nearest note for every frame of a WAV recording
    Analyse {
        recording: PathBuf,

        /// Minimum clarity for a frame to count as a reading
        #[arg(long, default_value_t = DEFAULT_MIN_CLARITY)]
        clarity: f32,
    },

    /// Write a reference tone for a note to a WAV file
    Generate {
        note: String,
        #[arg(allow_negative_numbers = true)]
        octave: i32,

        /// Output WAV file
        #[arg(long, short)]
        out: PathBuf,

        /// Tone length in seconds
        #[arg(long, default_value_t = 2.0)]
        seconds: f32,

        #[arg(long, default_value_t = 44100)]
        sample_rate: u32,
    },

    /// Write the selected temperament as a temperament file
    Export {
        /// Output file, stdout if omitted
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}

impl Options {
    pub fn run(self) -> Result<()> {
        let temperaments = load_temperaments(&self.temperament_files)?;
        let temperament =
            select_temperament(&temperaments, &self.temperament, self.reference_pitch)?;

        let stdout = io::stdout();
        let mut out = stdout.lock();

        match self.command {
            Command::List => list(&mut out, &temperaments),
            Command::Notes { octave } => notes(&mut out, &temperament, octave),
            Command::Pitch { note, octave } => print_pitch(&mut out, &temperament, &note, octave),
            Command::Name { frequency } => print_nearest_note(&mut out, &temperament, frequency),
            Command::Analyse {
                recording: path,
                clarity,
            } => analyse(&mut out, temperament, &path, clarity),
            Command::Generate {
                note,
                octave,
                out: path,
                seconds,
                sample_rate,
            } => generate(&mut out, &temperament, &note, octave, &path, seconds, sample_rate),
            Command::Export { out: path } => export(&mut out, &temperament, path.as_deref()),
        }
    }
}

/// Built-in temperaments plus those from user files. Names must stay unique.
fn load_temperaments(files: &[PathBuf]) -> Result<TemperamentSet> {
    let mut temperaments = builtin::temperaments().clone();
    for path in files {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read temperament file {}", path.display()))?;
        temperaments
            .extend_from_json_str(&json)
            .with_context(|| format!("invalid temperament file {}", path.display()))?;
        info!("Loaded temperaments from {}", path.display());
    }
    Ok(temperaments)
}

fn select_temperament(
    temperaments: &TemperamentSet,
    name: &str,
    reference_pitch: Option<f64>,
) -> Result<Temperament> {
    let temperament = temperaments.get(name).ok_or_else(|| {
        let available: Vec<&str> = temperaments.names().collect();
        anyhow!(
            "unknown temperament '{name}' (available: {})",
            available.join(", ")
        )
    })?;

    match reference_pitch {
        Some(pitch) => {
            debug!("Retuning '{name}' to a reference pitch of {pitch} Hz");
            temperament
                .with_reference_pitch(pitch)
                .context("invalid reference pitch")
        }
        None => Ok(temperament.clone()),
    }
}

/// Accepts a raw note name or its prettified form.
fn resolve_note<'a>(temperament: &'a Temperament, input: &str) -> Result<&'a str> {
    temperament
        .note_names()
        .iter()
        .find(|name| *name == input || prettify_note_name(name) == input)
        .map(String::as_str)
        .ok_or_else(|| {
            anyhow!(
                "unknown note '{input}' in '{}' (notes: {})",
                temperament.name(),
                temperament.pretty_note_names().join(" ")
            )
        })
}

fn format_reading(reading: &NoteReading) -> String {
    format!(
        "{}{} {:+.2} cents",
        prettify_note_name(&reading.name),
        reading.octave,
        reading.cents
    )
}

fn list(out: &mut impl Write, temperaments: &TemperamentSet) -> Result<()> {
    for temperament in temperaments.iter() {
        match temperament.description() {
            Some(description) => writeln!(out, "{}: {description}", temperament.name())?,
            None => writeln!(out, "{}", temperament.name())?,
        }
    }
    Ok(())
}

fn notes(out: &mut impl Write, temperament: &Temperament, octave: i32) -> Result<()> {
    writeln!(
        out,
        "{} ({}{} = {} Hz)",
        temperament.name(),
        prettify_note_name(temperament.reference_name()),
        temperament.reference_octave(),
        temperament.reference_pitch()
    )?;
    for name in temperament.note_names() {
        // Every listed name is known to the temperament
        let (Some(offset), Some(pitch)) = (
            temperament.get_offset(name, octave),
            temperament.get_pitch(name, octave),
        ) else {
            continue;
        };
        writeln!(
            out,
            "{:<6} {:>10.3} cents {:>10.3} Hz",
            format!("{}{octave}", prettify_note_name(name)),
            offset,
            pitch
        )?;
    }
    Ok(())
}

fn print_pitch(
    out: &mut impl Write,
    temperament: &Temperament,
    note: &str,
    octave: i32,
) -> Result<()> {
    let name = resolve_note(temperament, note)?;
    let pitch = temperament
        .get_pitch(name, octave)
        .ok_or_else(|| anyhow!("unknown note '{note}'"))?;
    writeln!(out, "{}{octave}: {pitch:.3} Hz", prettify_note_name(name))?;
    Ok(())
}

fn print_nearest_note(
    out: &mut impl Write,
    temperament: &Temperament,
    frequency: f64,
) -> Result<()> {
    let reading = temperament
        .get_note_from_pitch(frequency)
        .ok_or_else(|| anyhow!("{frequency} is not a valid frequency"))?;
    writeln!(out, "{frequency:.3} Hz: {}", format_reading(&reading))?;
    Ok(())
}

fn analyse(
    out: &mut impl Write,
    temperament: Temperament,
    path: &Path,
    clarity: f32,
) -> Result<()> {
    let (samples, sample_rate) = recording::read_mono_samples(path)?;
    if samples.len() < BUFFER_SIZE {
        bail!(
            "{} is too short to analyse ({} samples, need at least {BUFFER_SIZE})",
            path.display(),
            samples.len()
        );
    }

    let mut detector = McLeodPitchDetector::new();
    let mut analyser = Analyser::new(temperament).with_min_clarity(clarity);
    let results = analyse_frames(&samples, sample_rate, &mut detector, &mut analyser);

    let frame_seconds = BUFFER_SIZE as f64 / f64::from(sample_rate);
    for (i, result) in results.iter().enumerate() {
        let time = i as f64 * frame_seconds;
        match (&result.note, result.detected_frequency, result.clarity) {
            (Some(reading), Some(frequency), Some(clarity)) => writeln!(
                out,
                "{time:7.3}s {frequency:9.3} Hz  {}  (clarity {clarity:.2})",
                format_reading(reading)
            )?,
            _ => writeln!(out, "{time:7.3}s         -")?,
        }
    }

    if let Some(cents) = analyser.smoothed_cents() {
        let stability = if analyser.is_stable() { "stable" } else { "unstable" };
        writeln!(out, "last reading: {cents:+.2} cents ({stability})")?;
    }
    Ok(())
}

fn generate(
    out: &mut impl Write,
    temperament: &Temperament,
    note: &str,
    octave: i32,
    path: &Path,
    seconds: f32,
    sample_rate: u32,
) -> Result<()> {
    let name = resolve_note(temperament, note)?;
    let frequency = temperament
        .get_pitch(name, octave)
        .ok_or_else(|| anyhow!("unknown note '{note}'"))?;

    let samples = tone::sine_wave(frequency, sample_rate, seconds, 0.5)?;
    tone::write_wav(path, &samples, sample_rate)?;
    writeln!(
        out,
        "{}{octave}: {frequency:.3} Hz written to {}",
        prettify_note_name(name),
        path.display()
    )?;
    Ok(())
}

fn export(out: &mut impl Write, temperament: &Temperament, path: Option<&Path>) -> Result<()> {
    let json = temperament.to_description().to_json_string_pretty()?;
    match path {
        Some(path) => {
            fs::write(path, json + "\n")
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("Exported '{}' to {}", temperament.name(), path.display());
        }
        None => writeln!(out, "{json}")?,
    }
    Ok(())
}

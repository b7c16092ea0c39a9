//! # Analysis Module
//!
//! Turns pitch estimates into tuner readings against a temperament.
//!
//! The analyser is polled once per audio frame. It gates estimates on
//! clarity, looks up the nearest note, and keeps a short, fixed-size window
//! of recent readings for smoothing and stability checks. Its memory use does
//! not grow with the number of frames processed.

use log::{debug, trace};
use std::collections::VecDeque;

use crate::AnalysisResult;
use crate::pitch::{BUFFER_SIZE, PitchDetector, PitchEstimate};
use crate::temperament::{NoteReading, Temperament};

/// Number of consecutive readings used for smoothing and stability.
pub const SMOOTHING_WINDOW: usize = 5;

/// Estimates below this clarity are treated as noise.
pub const DEFAULT_MIN_CLARITY: f32 = 0.9;

/// Stateful per-frame analysis against one temperament.
#[derive(Debug, Clone)]
pub struct Analyser {
    temperament: Temperament,
    min_clarity: f32,
    recent: VecDeque<NoteReading>,
}

impl Analyser {
    pub fn new(temperament: Temperament) -> Self {
        Self {
            temperament,
            min_clarity: DEFAULT_MIN_CLARITY,
            recent: VecDeque::with_capacity(SMOOTHING_WINDOW),
        }
    }

    pub fn with_min_clarity(mut self, min_clarity: f32) -> Self {
        self.min_clarity = min_clarity.clamp(0.0, 1.0);
        self
    }

    pub fn temperament(&self) -> &Temperament {
        &self.temperament
    }

    /// Switches to another temperament. Readings taken against the old one
    /// are discarded.
    pub fn set_temperament(&mut self, temperament: Temperament) {
        debug!("Analyser switched to temperament '{}'", temperament.name());
        self.temperament = temperament;
        self.recent.clear();
    }

    /// Analyses the detector output for one frame.
    ///
    /// A missing or unclear estimate yields an empty result and breaks the
    /// run of consecutive readings.
    pub fn process(&mut self, estimate: Option<PitchEstimate>) -> AnalysisResult {
        let Some(estimate) = estimate else {
            self.recent.clear();
            return AnalysisResult::default();
        };

        if estimate.clarity < self.min_clarity {
            trace!(
                "Rejected {:.2} Hz with clarity {:.2} (minimum {:.2})",
                estimate.frequency, estimate.clarity, self.min_clarity
            );
            self.recent.clear();
            return AnalysisResult {
                detected_frequency: Some(estimate.frequency),
                clarity: Some(estimate.clarity),
                note: None,
            };
        }

        let note = self
            .temperament
            .get_note_from_pitch(f64::from(estimate.frequency));
        if let Some(reading) = &note {
            if self.recent.len() == SMOOTHING_WINDOW {
                self.recent.pop_front();
            }
            self.recent.push_back(reading.clone());
        }

        AnalysisResult {
            detected_frequency: Some(estimate.frequency),
            clarity: Some(estimate.clarity),
            note,
        }
    }

    /// Mean deviation of the recent readings that agree with the latest note.
    pub fn smoothed_cents(&self) -> Option<f64> {
        let latest = self.recent.back()?;
        let matching: Vec<f64> = self
            .recent
            .iter()
            .filter(|reading| same_note(reading, latest))
            .map(|reading| reading.cents)
            .collect();
        Some(matching.iter().sum::<f64>() / matching.len() as f64)
    }

    /// True once the window is full and every reading names the same note.
    pub fn is_stable(&self) -> bool {
        match self.recent.front() {
            Some(first) => {
                self.recent.len() == SMOOTHING_WINDOW
                    && self.recent.iter().all(|reading| same_note(reading, first))
            }
            None => false,
        }
    }

    /// Number of readings currently held for smoothing.
    pub fn window_len(&self) -> usize {
        self.recent.len()
    }
}

fn same_note(a: &NoteReading, b: &NoteReading) -> bool {
    a.name == b.name && a.octave == b.octave
}

/// Splits a block of samples into frames and analyses each of them.
/// Trailing samples that do not fill a frame are ignored.
pub fn analyse_frames<D: PitchDetector + ?Sized>(
    samples: &[f32],
    sample_rate: u32,
    detector: &mut D,
    analyser: &mut Analyser,
) -> Vec<AnalysisResult> {
    samples
        .chunks_exact(BUFFER_SIZE)
        .map(|frame| analyser.process(detector.detect(frame, sample_rate)))
        .collect()
}

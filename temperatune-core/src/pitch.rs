//! # Pitch Detection Module
//!
//! The seam between the analyser and the pitch estimator. Estimation itself is
//! done by the McLeod Pitch Method from the `pitch_detection` crate; this
//! module only adapts its output to a [`PitchEstimate`] of frequency and
//! clarity.
//!
//! ## Features
//! - [`PitchDetector`] trait so the analyser can be fed by any estimator
//! - [`McLeodPitchDetector`] working on frames of [`BUFFER_SIZE`] samples
//! - Power gate to ignore silence

use log::warn;
use pitch_detection::detector::PitchDetector as _;
use pitch_detection::detector::mcleod::McLeodDetector;

/// Number of samples per analysis frame.
///
/// Larger frames resolve lower notes but increase latency.
/// 2048 samples is ~46ms at 44.1kHz.
pub const BUFFER_SIZE: usize = 2048;

/// Zero padding appended by the detector to each frame.
pub const PADDING: usize = BUFFER_SIZE / 2;

/// Minimum frame power (sum of squared samples) for a frame to be analysed.
pub const DEFAULT_POWER_THRESHOLD: f32 = 5.0;

/// Clarity used by the detector to pick autocorrelation peaks. Final gating
/// on clarity happens in the analyser.
const PEAK_CLARITY_THRESHOLD: f32 = 0.6;

/// A fundamental frequency estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    /// Estimated fundamental in Hz.
    pub frequency: f32,
    /// Confidence of the estimate, in `[0, 1]`.
    pub clarity: f32,
}

/// Anything that turns a frame of samples into a pitch estimate.
pub trait PitchDetector {
    /// Returns `None` when the frame holds no detectable pitch.
    fn detect(&mut self, samples: &[f32], sample_rate: u32) -> Option<PitchEstimate>;
}

/// [`PitchDetector`] backed by the McLeod Pitch Method.
pub struct McLeodPitchDetector {
    detector: McLeodDetector<f32>,
    power_threshold: f32,
}

impl McLeodPitchDetector {
    pub fn new() -> Self {
        Self::with_power_threshold(DEFAULT_POWER_THRESHOLD)
    }

    pub fn with_power_threshold(power_threshold: f32) -> Self {
        Self {
            detector: McLeodDetector::new(BUFFER_SIZE, PADDING),
            power_threshold,
        }
    }
}

impl Default for McLeodPitchDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl PitchDetector for McLeodPitchDetector {
    fn detect(&mut self, samples: &[f32], sample_rate: u32) -> Option<PitchEstimate> {
        if samples.len() != BUFFER_SIZE {
            warn!(
                "Skipping frame of {} samples, expected {}",
                samples.len(),
                BUFFER_SIZE
            );
            return None;
        }

        let pitch = self.detector.get_pitch(
            samples,
            sample_rate as usize,
            self.power_threshold,
            PEAK_CLARITY_THRESHOLD,
        )?;

        // Only return audible, finite frequencies
        if pitch.frequency.is_finite() && pitch.frequency > 20.0 {
            Some(PitchEstimate {
                frequency: pitch.frequency,
                clarity: pitch.clarity.clamp(0.0, 1.0),
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
pub(crate) fn sine_frame(frequency: f32, sample_rate: u32, amplitude: f32) -> Vec<f32> {
    (0..BUFFER_SIZE)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 44100;

    #[test]
    fn detects_a_pure_tone() {
        let mut detector = McLeodPitchDetector::new();
        let estimate = detector
            .detect(&sine_frame(440.0, SAMPLE_RATE, 0.5), SAMPLE_RATE)
            .unwrap();
        assert!((estimate.frequency - 440.0).abs() < 1.0, "{estimate:?}");
        assert!(estimate.clarity > 0.9 && estimate.clarity <= 1.0);
    }

    #[test]
    fn ignores_silence() {
        let mut detector = McLeodPitchDetector::new();
        assert_eq!(detector.detect(&[0.0; BUFFER_SIZE], SAMPLE_RATE), None);
    }

    #[test]
    fn ignores_frames_of_the_wrong_size() {
        let mut detector = McLeodPitchDetector::new();
        let short = &sine_frame(440.0, SAMPLE_RATE, 0.5)[..1000];
        assert_eq!(detector.detect(short, SAMPLE_RATE), None);
    }
}

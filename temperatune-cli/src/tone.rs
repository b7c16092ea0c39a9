//! # Tone Generation
//!
//! Renders a reference pitch as a mono sine wave and writes it to a 32-bit
//! float WAV file.

use anyhow::{Context, Result, bail};
use log::info;
use std::path::Path;

/// Length of the linear fade-in and fade-out, in seconds.
const FADE_SECONDS: f32 = 0.01;

/// Longest tone that will be rendered, in seconds.
const MAX_SECONDS: f32 = 600.0;

/// Upper bound on the rendered sample count, whatever the sample rate.
const MAX_SAMPLES: f64 = 600.0 * 192_000.0;

/// Renders `seconds` of a sine wave at `frequency` Hz.
pub fn sine_wave(
    frequency: f64,
    sample_rate: u32,
    seconds: f32,
    amplitude: f32,
) -> Result<Vec<f32>> {
    let nyquist = f64::from(sample_rate) / 2.0;
    if frequency.is_nan() || frequency <= 0.0 || frequency >= nyquist {
        bail!("{frequency:.3} Hz cannot be rendered at a sample rate of {sample_rate} Hz");
    }
    if !seconds.is_finite() || seconds <= 0.0 || seconds > MAX_SECONDS {
        bail!("tone duration must be between 0 and {MAX_SECONDS} s, got {seconds} s");
    }

    let num_samples = (f64::from(seconds) * f64::from(sample_rate)).round();
    if num_samples > MAX_SAMPLES {
        bail!("{num_samples} samples is too long a tone at a sample rate of {sample_rate} Hz");
    }
    let num_samples = num_samples as usize;
    let fade_samples =
        ((FADE_SECONDS * sample_rate as f32) as usize).clamp(1, num_samples.max(2) / 2);
    let step = std::f64::consts::TAU * frequency / f64::from(sample_rate);

    Ok((0..num_samples)
        .map(|i| {
            let edge_distance = i.min(num_samples - 1 - i);
            let envelope = (edge_distance as f32 / fade_samples as f32).min(1.0);
            amplitude * envelope * (step * i as f64).sin() as f32
        })
        .collect())
}

/// Writes mono samples as a 32-bit float WAV file.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    info!(
        "Wrote {} samples at {} Hz to {}",
        samples.len(),
        sample_rate,
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_requested_length_with_fades() {
        let samples = sine_wave(440.0, 44100, 0.5, 0.8).unwrap();
        assert_eq!(samples.len(), 22050);
        assert_eq!(samples[0], 0.0);
        assert!(samples.last().unwrap().abs() < 1e-3);
        assert!(samples.iter().all(|s| s.abs() <= 0.8));
        assert!(samples.iter().any(|s| s.abs() > 0.79));
    }

    #[test]
    fn rejects_unrenderable_tones() {
        assert!(sine_wave(30000.0, 44100, 1.0, 0.5).is_err());
        assert!(sine_wave(0.0, 44100, 1.0, 0.5).is_err());
        assert!(sine_wave(440.0, 44100, 0.0, 0.5).is_err());
        assert!(sine_wave(f64::NAN, 44100, 1.0, 0.5).is_err());
        assert!(sine_wave(440.0, 44100, f32::INFINITY, 0.5).is_err());
        assert!(sine_wave(440.0, 44100, f32::NAN, 0.5).is_err());
        assert!(sine_wave(440.0, 44100, MAX_SECONDS * 2.0, 0.5).is_err());
        assert!(sine_wave(440.0, u32::MAX, MAX_SECONDS, 0.5).is_err());
    }
}

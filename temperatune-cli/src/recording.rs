//! # Recording Input
//!
//! Loads a WAV recording as mono `f32` samples for frame-by-frame analysis.
//! Integer and float encodings are accepted; multi-channel audio is mixed
//! down by averaging.

use anyhow::{Context, Result, bail};
use hound::{SampleFormat, WavReader};
use log::debug;
use std::path::Path;

/// Reads a WAV file and returns its mono samples and sample rate.
pub fn read_mono_samples(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader =
        WavReader::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        bail!("{} has no audio channels", path.display());
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|s| s as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    let channels = usize::from(spec.channels);
    let mono: Vec<f32> = interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();

    debug!(
        "Read {} frames at {} Hz ({} channel(s), {:?}) from {}",
        mono.len(),
        spec.sample_rate,
        spec.channels,
        spec.sample_format,
        path.display()
    );
    Ok((mono, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn mixes_integer_stereo_down_to_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for (left, right) in [(16384i16, 0i16), (-32768, -16384)] {
            writer.write_sample(left).unwrap();
            writer.write_sample(right).unwrap();
        }
        writer.finalize().unwrap();

        let (samples, sample_rate) = read_mono_samples(&path).unwrap();
        assert_eq!(sample_rate, 8000);
        assert_eq!(samples.len(), 2);
        assert_approx_eq!(samples[0], 0.25);
        assert_approx_eq!(samples[1], -0.75);
    }

    #[test]
    fn reports_missing_files() {
        let err = read_mono_samples(Path::new("/nonexistent/recording.wav")).unwrap_err();
        assert!(err.to_string().contains("failed to open"));
    }
}

//! Waveform post-processing and WAV output.

use std::io::{Seek, Write};

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::TtsError;

/// Added to the peak before dividing, so silence stays finite.
pub const NORMALIZE_EPSILON: f32 = 1e-5;

/// Largest absolute sample, 0 for an empty buffer.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

/// Scale `samples` so the peak becomes `volume`. Not clamped: volumes
/// above 1.0 produce samples above full scale.
pub fn normalize_volume(samples: &mut [f32], volume: f32) {
    let scale = volume / (peak(samples) + NORMALIZE_EPSILON);
    for s in samples.iter_mut() {
        *s *= scale;
    }
}

/// WAV encoding options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavOptions {
    /// Integer PCM depth: 8, 16 or 32.
    pub bits_per_sample: u16,
    /// Always rescale to full scale. Audio peaking above 1.0 is rescaled
    /// regardless.
    pub normalize: bool,
}

impl Default for WavOptions {
    fn default() -> Self {
        Self {
            bits_per_sample: 32,
            normalize: false,
        }
    }
}

/// Write mono `samples` as integer PCM WAV.
pub fn write_wav<W: Write + Seek>(
    writer: W,
    samples: &[f32],
    sample_rate: u32,
    options: WavOptions,
) -> Result<(), TtsError> {
    if !matches!(options.bits_per_sample, 8 | 16 | 32) {
        return Err(TtsError::validation(format!(
            "unsupported bit depth {}, expected 8, 16 or 32",
            options.bits_per_sample
        )));
    }
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: options.bits_per_sample,
        sample_format: SampleFormat::Int,
    };

    let max = peak(samples);
    let scale = if max > 1.0 || (options.normalize && max > 0.0) {
        1.0 / max
    } else {
        1.0
    };

    // Float to int casts truncate toward zero.
    let mut wav = WavWriter::new(writer, spec)?;
    match options.bits_per_sample {
        8 => {
            for &s in samples {
                wav.write_sample((s * scale * i8::MAX as f32) as i8)?;
            }
        }
        16 => {
            for &s in samples {
                wav.write_sample((s * scale * i16::MAX as f32) as i16)?;
            }
        }
        _ => {
            for &s in samples {
                wav.write_sample((s as f64 * scale as f64 * i32::MAX as f64) as i32)?;
            }
        }
    }
    wav.finalize()?;
    Ok(())
}

//! # tts-arabic
//!
//! Arabic text-to-speech over ONNX models: FastPitch and MixerTTS for
//! text -> mel, HiFi-GAN (plus denoiser) or Vocos for mel -> wave, and
//! optional Shakkala / Shakkelha diacritization.
//!
//! ## Features
//!
//! - `onnx` (default): ONNX Runtime backend
//! - `download` (default): fetch missing model files over HTTP
//! - `cuda`: CUDA execution provider
//! - `cli`: the `tts-arabic` command line tool
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use tts_arabic::{engines::arabic::ArabicEngine, SynthesisEngine};
//!
//! let mut engine = ArabicEngine::new();
//! engine.load_model(&PathBuf::from("models/tts-arabic"))?;
//!
//! let result = engine.synthesize("اَلسَّلامُ عَلَيكُم", None)?;
//! result.write_wav(&PathBuf::from("output.wav"), Default::default())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod audio;
pub mod engines;
mod error;

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

pub use audio::WavOptions;
pub use error::{BoxError, Stage, TtsError};

use engines::arabic::text_mel::MelSpectrogram;

/// The result of a synthesis (text-to-speech) operation.
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    /// Mono samples, peak-normalized to the requested volume
    pub samples: Vec<f32>,
    /// 22050 or 44100, depending on the vocoder
    pub sample_rate: u32,
    /// Intermediate mel spectrogram, when requested
    pub mel: Option<MelSpectrogram>,
}

impl SynthesisResult {
    /// Write the audio to a WAV file.
    pub fn write_wav(&self, path: &Path, options: WavOptions) -> Result<(), TtsError> {
        let file = BufWriter::new(File::create(path)?);
        self.write_wav_to(file, options)
    }

    pub fn write_wav_to<W: Write + Seek>(
        &self,
        writer: W,
        options: WavOptions,
    ) -> Result<(), TtsError> {
        audio::write_wav(writer, &self.samples, self.sample_rate, options)
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn peak(&self) -> f32 {
        audio::peak(&self.samples)
    }
}

/// Common interface for text-to-speech synthesis engines.
///
/// Each engine may have different parameter types for model loading and inference configuration.
pub trait SynthesisEngine {
    /// Parameters for configuring inference behavior (speaker, pace, etc.)
    type SynthesisParams;
    /// Parameters for configuring model loading (threads, etc.)
    type ModelParams: Default;

    /// Load a model from the specified path using default parameters.
    fn load_model(&mut self, model_path: &Path) -> Result<(), TtsError> {
        self.load_model_with_params(model_path, Self::ModelParams::default())
    }

    /// Load a model from the specified path with custom parameters.
    fn load_model_with_params(
        &mut self,
        model_path: &Path,
        params: Self::ModelParams,
    ) -> Result<(), TtsError>;

    /// Unload the currently loaded model and free associated resources.
    fn unload_model(&mut self);

    /// Synthesize speech from the given text.
    fn synthesize(
        &mut self,
        text: &str,
        params: Option<Self::SynthesisParams>,
    ) -> Result<SynthesisResult, TtsError>;

    /// Synthesize speech from the given text and write a 32-bit PCM WAV file.
    fn synthesize_to_file(
        &mut self,
        text: &str,
        wav_path: &Path,
        params: Option<Self::SynthesisParams>,
    ) -> Result<(), TtsError> {
        self.synthesize(text, params)?
            .write_wav(wav_path, WavOptions::default())
    }
}

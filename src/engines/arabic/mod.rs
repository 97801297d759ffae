//! Arabic text-to-speech.
//!
//! Text (Arabic script or Buckwalter transliteration) passes through up to
//! four networks:
//!
//! 1. optional vowelizer (Shakkala / Shakkelha) adding diacritics,
//! 2. text -> mel (FastPitch, MixerTTS 128 or MixerTTS 80),
//! 3. mel -> wave, either a Vocos network with built-in denoising or
//!    HiFi-GAN followed by a separate denoiser network.
//!
//! Networks are ONNX files fetched on demand and cached by
//! [`ModelRegistry`]. One pipeline per (model, vocoder, device) is kept;
//! asking for another combination replaces it.
//!
//! # Model Directory Layout
//!
//! ```text
//! $TTS_ARABIC_HOME/data/
//! ├── fp_ms.onnx          # FastPitch (multi-speaker)
//! ├── mixer128.onnx
//! ├── mixer80.onnx
//! ├── hifigan.onnx
//! ├── denoiser.onnx
//! ├── vocos22.onnx
//! ├── vocos44.onnx
//! ├── shakkala.onnx
//! └── shakkelha.onnx
//! ```
//!
//! # Examples
//!
//! ```rust,no_run
//! use tts_arabic::engines::arabic::{self, ArabicInferenceParams, VowelizerId};
//! use tts_arabic::WavOptions;
//! use std::path::Path;
//!
//! let params = ArabicInferenceParams::builder()
//!     .vowelizer(VowelizerId::Shakkelha)
//!     .pace(0.9)
//!     .build()?;
//! let result = arabic::synthesize("مرحبا بكم", &params)?;
//! result.write_wav(Path::new("out.wav"), WavOptions::default())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod catalog;
pub mod denoiser;
pub mod engine;
pub mod fetch;
#[cfg(feature = "onnx")]
pub mod onnx;
mod orchestrator;
pub mod pipeline;
pub mod registry;
pub mod session;
pub mod text;
pub mod text_mel;
pub mod tokenizer;
pub mod vocab;
pub mod vocoder;
pub mod vowelizer;

pub use catalog::{
    get_available_models, AvailableModels, TextModelId, VocoderFamily, VocoderId, VowelizerId,
};
pub use engine::{
    ArabicEngine, ArabicInferenceParams, ArabicInferenceParamsBuilder, ArabicModelParams,
};
pub use fetch::{LocalFetcher, ModelFetcher};
#[cfg(feature = "download")]
pub use fetch::HttpFetcher;
#[cfg(feature = "onnx")]
pub use onnx::OrtLoader;
pub use pipeline::PipelineKey;
pub use registry::ModelRegistry;
pub use session::{Device, InferenceModel, ModelLoader, SessionError, TensorData};
pub use text::{InputConvention, Script, Utterance};

/// Synthesize with the process-wide registry.
#[cfg(feature = "onnx")]
pub fn synthesize(
    text: &str,
    params: &ArabicInferenceParams,
) -> Result<crate::SynthesisResult, crate::TtsError> {
    ModelRegistry::global().synthesize(text, params)
}

/// Diacritize `text` with the process-wide registry.
#[cfg(feature = "onnx")]
pub fn vocalize(text: &str, vowelizer: VowelizerId) -> Result<String, crate::TtsError> {
    ModelRegistry::global().vocalize_text(text, vowelizer)
}

//! Speech synthesis engines.
//!
//! # Available Engines
//!
//! - `arabic` - FastPitch / MixerTTS with HiFi-GAN or Vocos (ONNX format).
//!   Enable the `onnx` feature (default) for the ONNX Runtime backend.

pub mod arabic;

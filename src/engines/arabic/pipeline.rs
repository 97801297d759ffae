use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::catalog::{TextModelId, VocoderId};
use super::denoiser::Denoiser;
use super::registry::ModelSource;
use super::session::Device;
use super::text_mel::{MelSpectrogram, ProsodyControls, TextToMel};
use super::tokenizer::TokenSequence;
use super::vocoder::Vocoder;
use crate::TtsError;

/// Identity of a pipeline in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PipelineKey {
    pub text_model: TextModelId,
    pub vocoder: VocoderId,
    pub device: Device,
}

impl fmt::Display for PipelineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}@{}", self.text_model, self.vocoder, self.device)
    }
}

/// Text -> mel network plus vocoder (and denoiser), all on one device.
pub struct Pipeline {
    key: PipelineKey,
    text_mel: TextToMel,
    vocoder: Vocoder,
}

impl Pipeline {
    /// Fetch and load every network of `key`. Any failure drops whatever
    /// was loaded so far.
    pub(crate) fn build(key: PipelineKey, source: &ModelSource<'_>) -> Result<Self, TtsError> {
        let start = Instant::now();
        log::info!("Building pipeline {key}");

        let text_mel = TextToMel::new(source.load(key.text_model.catalog_entry(), key.device)?);
        let vocoder_model = source.load(key.vocoder.catalog_entry(), key.device)?;
        let vocoder = match key.vocoder.denoiser_entry() {
            Some(entry) => Vocoder::chained(
                vocoder_model,
                Denoiser::new(source.load(entry, key.device)?),
            ),
            None => Vocoder::fused(vocoder_model),
        };

        log::info!("Pipeline {key} ready in {:.2?}", start.elapsed());
        Ok(Self {
            key,
            text_mel,
            vocoder,
        })
    }

    pub fn key(&self) -> PipelineKey {
        self.key
    }

    pub fn sample_rate(&self) -> u32 {
        self.key.vocoder.sample_rate()
    }

    /// Run text -> mel -> wave. Returns the raw waveform and the mel.
    pub fn infer(
        &mut self,
        tokens: &TokenSequence,
        controls: &ProsodyControls,
        denoise: f32,
    ) -> Result<(Vec<f32>, MelSpectrogram), TtsError> {
        let start = Instant::now();
        let mel = self.text_mel.infer(tokens, controls)?;
        log::debug!(
            "text-to-mel: {} tokens -> {} frames in {:.2?}",
            tokens.len(),
            mel.ncols(),
            start.elapsed()
        );

        let start = Instant::now();
        let wave = self.vocoder.infer(&mel, denoise)?;
        log::debug!(
            "{}: {} samples in {:.2?}",
            self.key.vocoder,
            wave.len(),
            start.elapsed()
        );

        Ok((wave, mel))
    }
}

use std::time::Instant;

use super::denoiser::DENOISE_SOFT_LIMIT;
use super::engine::ArabicInferenceParams;
use super::registry::ModelRegistry;
use super::text::{strip_diacritics, Script, Utterance};
use crate::audio::normalize_volume;
use crate::{SynthesisResult, TtsError};

impl ModelRegistry {
    /// Text to waveform: optional vowelizer, tokenizer, text -> mel,
    /// vocoder (and denoiser), then peak normalization to `params.volume`.
    ///
    /// Input errors surface before any model is fetched or loaded. Models
    /// built along the way stay cached even if a later stage fails.
    pub fn synthesize(
        &self,
        text: &str,
        params: &ArabicInferenceParams,
    ) -> Result<SynthesisResult, TtsError> {
        let start = Instant::now();
        let utterance = Utterance::new(text)?;
        if params.denoise > DENOISE_SOFT_LIMIT {
            log::warn!(
                "denoise {} is above {DENOISE_SOFT_LIMIT}; expect audible artifacts",
                params.denoise
            );
        }

        let tokenizer = self.tokenizer(params.text_model);
        let tokens = match params.vowelizer {
            None => tokenizer.tokenize(&utterance)?,
            Some(vowelizer) => {
                // The vowelizer keeps every base character, so the bare text
                // must already tokenize.
                let bare = Utterance::new(strip_diacritics(&utterance.in_script(Script::Arabic)))?;
                tokenizer.tokenize(&bare)?;
                tokenizer.tokenize(&self.vocalize(vowelizer, &utterance)?)?
            }
        };

        let key = params.pipeline_key();
        let prosody = params.prosody();
        let (mut samples, mel, sample_rate) = self.with_pipeline(key, |pipeline| {
            let (samples, mel) = pipeline.infer(&tokens, &prosody, params.denoise)?;
            Ok((samples, mel, pipeline.sample_rate()))
        })?;
        normalize_volume(&mut samples, params.volume);

        log::debug!(
            "Synthesized {} samples with {key} in {:.2?}",
            samples.len(),
            start.elapsed()
        );
        Ok(SynthesisResult {
            samples,
            sample_rate,
            mel: params.return_mel.then_some(mel),
        })
    }
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::{SynthesisEngine, SynthesisResult, TtsError};

use super::catalog::{TextModelId, VocoderId, VowelizerId};
use super::fetch::default_fetcher;
use super::pipeline::PipelineKey;
use super::registry::ModelRegistry;
use super::session::{Device, ModelLoader};
use super::text_mel::ProsodyControls;
use super::vocab::{load_symbols, SymbolInventory};

/// Parameters for configuring model loading.
#[derive(Debug, Clone)]
pub struct ArabicModelParams {
    /// Intra-op threads per session. `None` uses the ORT default.
    pub num_threads: Option<usize>,
    /// Directory for Level3-optimized graphs, one file per model and device.
    /// Later loads skip graph optimization.
    pub optimized_model_cache_path: Option<PathBuf>,
    /// `config.json` with a `"symbols"` array replacing the built-in token
    /// inventory.
    pub symbols_path: Option<PathBuf>,
    /// Never download; every model file must already be on disk.
    pub offline: bool,
    /// Pipeline to build during loading instead of on the first call.
    /// Defaults to fastpitch + hifigan on CPU.
    pub preload: Option<PipelineKey>,
}

impl Default for ArabicModelParams {
    fn default() -> Self {
        Self {
            num_threads: None,
            optimized_model_cache_path: None,
            symbols_path: None,
            offline: false,
            preload: Some(PipelineKey::default()),
        }
    }
}

/// Parameters for one synthesis request.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(default)]
#[serde(default)]
pub struct ArabicInferenceParams {
    /// Speaker id; only multi-speaker checkpoints accept values other than 0.
    pub speaker: i64,
    /// Speaking rate multiplier.
    pub pace: f32,
    /// Denoiser strength. 0 skips the denoiser of chained vocoders.
    pub denoise: f32,
    /// Peak amplitude after normalization.
    pub volume: f32,
    #[builder(setter(strip_option))]
    pub vowelizer: Option<VowelizerId>,
    pub pitch_mul: f32,
    pub pitch_add: f32,
    pub device: Device,
    pub text_model: TextModelId,
    pub vocoder: VocoderId,
    /// Attach the intermediate mel spectrogram to the result.
    pub return_mel: bool,
}

impl Default for ArabicInferenceParams {
    fn default() -> Self {
        Self {
            speaker: 0,
            pace: 1.0,
            denoise: 0.005,
            volume: 0.9,
            vowelizer: None,
            pitch_mul: 1.0,
            pitch_add: 0.0,
            device: Device::Cpu,
            text_model: TextModelId::FastPitch,
            vocoder: VocoderId::HifiGan,
            return_mel: false,
        }
    }
}

impl ArabicInferenceParams {
    pub fn builder() -> ArabicInferenceParamsBuilder {
        ArabicInferenceParamsBuilder::default()
    }

    pub fn pipeline_key(&self) -> PipelineKey {
        PipelineKey {
            text_model: self.text_model,
            vocoder: self.vocoder,
            device: self.device,
        }
    }

    pub fn prosody(&self) -> ProsodyControls {
        ProsodyControls {
            speaker: self.speaker,
            pace: self.pace,
            pitch_mul: self.pitch_mul,
            pitch_add: self.pitch_add,
        }
    }
}

/// Arabic text-to-speech engine.
///
/// `load_model` points the engine at a model root (the directory holding
/// `data/`) and builds the [`ArabicModelParams::preload`] pipeline. Other
/// networks are fetched and loaded when a request first needs them.
///
/// ```rust,no_run
/// use std::path::PathBuf;
/// use tts_arabic::{SynthesisEngine, engines::arabic::ArabicEngine};
///
/// let mut engine = ArabicEngine::new();
/// engine.load_model(&PathBuf::from("models/tts-arabic"))?;
/// let result = engine.synthesize("اَلسَّلامُ عَلَيكُم", None)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ArabicEngine {
    loader: Option<Arc<dyn ModelLoader>>,
    registry: Option<Arc<ModelRegistry>>,
    model_path: Option<PathBuf>,
}

impl Default for ArabicEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ArabicEngine {
    /// Engine backed by ONNX Runtime once a model root is loaded.
    pub fn new() -> Self {
        Self {
            loader: None,
            registry: None,
            model_path: None,
        }
    }

    /// Engine that loads networks through `loader` instead of ONNX Runtime.
    pub fn with_loader(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader: Some(loader),
            registry: None,
            model_path: None,
        }
    }

    /// Engine sharing an existing registry; no `load_model` call needed.
    pub fn with_registry(registry: Arc<ModelRegistry>) -> Self {
        Self {
            loader: None,
            registry: Some(registry),
            model_path: None,
        }
    }

    pub fn registry(&self) -> Option<&Arc<ModelRegistry>> {
        self.registry.as_ref()
    }

    pub fn model_path(&self) -> Option<&Path> {
        self.model_path.as_deref()
    }

    /// Diacritize `text` without synthesizing it.
    pub fn vocalize(&self, text: &str, vowelizer: VowelizerId) -> Result<String, TtsError> {
        self.registry
            .as_ref()
            .ok_or(TtsError::ModelNotLoaded)?
            .vocalize_text(text, vowelizer)
    }

    fn loader(&self, params: &ArabicModelParams) -> Result<Arc<dyn ModelLoader>, TtsError> {
        if let Some(loader) = &self.loader {
            return Ok(Arc::clone(loader));
        }
        #[cfg(feature = "onnx")]
        {
            let mut loader = super::onnx::OrtLoader::new();
            loader.num_threads = params.num_threads;
            loader.optimized_cache_dir = params.optimized_model_cache_path.clone();
            Ok(Arc::new(loader))
        }
        #[cfg(not(feature = "onnx"))]
        {
            let _ = params;
            Err(TtsError::Config(
                "built without the `onnx` feature; use ArabicEngine::with_loader".to_string(),
            ))
        }
    }
}

impl Drop for ArabicEngine {
    fn drop(&mut self) {
        self.unload_model();
    }
}

impl SynthesisEngine for ArabicEngine {
    type SynthesisParams = ArabicInferenceParams;
    type ModelParams = ArabicModelParams;

    fn load_model_with_params(
        &mut self,
        model_path: &Path,
        params: Self::ModelParams,
    ) -> Result<(), TtsError> {
        let symbols = match &params.symbols_path {
            Some(path) => load_symbols(path)?,
            None => SymbolInventory::default(),
        };
        let registry = ModelRegistry::with_symbols(
            self.loader(&params)?,
            default_fetcher(model_path, params.offline),
            &symbols,
        );
        if let Some(key) = params.preload {
            registry.preload(key)?;
        }

        self.registry = Some(Arc::new(registry));
        self.model_path = Some(model_path.to_path_buf());
        Ok(())
    }

    fn unload_model(&mut self) {
        self.registry = None;
        self.model_path = None;
    }

    fn synthesize(
        &mut self,
        text: &str,
        params: Option<Self::SynthesisParams>,
    ) -> Result<SynthesisResult, TtsError> {
        let registry = self.registry.as_ref().ok_or(TtsError::ModelNotLoaded)?;
        registry.synthesize(text, &params.unwrap_or_default())
    }
}

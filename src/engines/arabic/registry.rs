//! Process-wide model cache.
//!
//! The registry holds at most one [`Pipeline`], keyed by
//! (text model, vocoder, device), and one [`Vowelizer`] per variant. A
//! pipeline is rebuilt only when a call asks for a different key; vowelizers
//! are loaded on first use and kept until [`ModelRegistry::reset`].
//!
//! Every check-build-store sequence runs under the owning mutex, so
//! concurrent callers never build the same entry twice and never observe a
//! half-built one. A failed build stores nothing.

use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "onnx")]
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use super::catalog::{ModelCatalogEntry, TextModelId, VowelizerId};
use super::fetch::ModelFetcher;
use super::pipeline::{Pipeline, PipelineKey};
use super::session::{Device, InferenceModel, ModelLoader};
use super::text::{Script, Utterance};
use super::tokenizer::{SymbolTokenizer, Tokenizer};
use super::vocab::SymbolInventory;
use super::vowelizer::Vowelizer;
use crate::{BoxError, TtsError};

#[cfg(feature = "onnx")]
static GLOBAL: Lazy<Arc<ModelRegistry>> = Lazy::new(|| Arc::new(ModelRegistry::from_env()));

/// Fetches and loads catalog entries, mapping failures to load errors.
pub(crate) struct ModelSource<'a> {
    loader: &'a dyn ModelLoader,
    fetcher: &'a dyn ModelFetcher,
}

impl ModelSource<'_> {
    pub(crate) fn load(
        &self,
        entry: &ModelCatalogEntry,
        device: Device,
    ) -> Result<Box<dyn InferenceModel>, TtsError> {
        let load_error = |source: BoxError| TtsError::Load {
            model: entry.name.to_string(),
            device,
            source,
        };
        let path = self
            .fetcher
            .ensure_local(entry)
            .map_err(|e| load_error(Box::new(e)))?;
        self.loader
            .load(&path, device)
            .map_err(|e| load_error(Box::new(e)))
    }
}

pub struct ModelRegistry {
    loader: Arc<dyn ModelLoader>,
    fetcher: Arc<dyn ModelFetcher>,
    arabic: SymbolTokenizer,
    buckwalter: SymbolTokenizer,
    pipeline: Mutex<Option<Pipeline>>,
    vowelizers: Mutex<HashMap<VowelizerId, Vowelizer>>,
}

impl ModelRegistry {
    pub fn new(loader: Arc<dyn ModelLoader>, fetcher: Arc<dyn ModelFetcher>) -> Self {
        Self::with_symbols(loader, fetcher, &SymbolInventory::default())
    }

    pub fn with_symbols(
        loader: Arc<dyn ModelLoader>,
        fetcher: Arc<dyn ModelFetcher>,
        symbols: &SymbolInventory,
    ) -> Self {
        Self {
            loader,
            fetcher,
            arabic: SymbolTokenizer::new(Script::Arabic, symbols),
            buckwalter: SymbolTokenizer::new(Script::Buckwalter, symbols),
            pipeline: Mutex::new(None),
            vowelizers: Mutex::new(HashMap::new()),
        }
    }

    /// ONNX Runtime on the default model root, downloading missing files
    /// when the `download` feature is enabled.
    #[cfg(feature = "onnx")]
    pub fn from_env() -> Self {
        let root = super::fetch::default_model_root();
        Self::new(
            Arc::new(super::onnx::OrtLoader::new()),
            super::fetch::default_fetcher(root, false),
        )
    }

    /// The registry shared by the free `synthesize` / `vocalize` functions.
    /// Lives for the whole process.
    #[cfg(feature = "onnx")]
    pub fn global() -> Arc<ModelRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Tokenizer matching the token table of `text_model`.
    pub fn tokenizer(&self, text_model: TextModelId) -> &dyn Tokenizer {
        match text_model.script() {
            Script::Arabic => &self.arabic,
            Script::Buckwalter => &self.buckwalter,
        }
    }

    fn source(&self) -> ModelSource<'_> {
        ModelSource {
            loader: self.loader.as_ref(),
            fetcher: self.fetcher.as_ref(),
        }
    }

    /// Run `f` on the pipeline for `key`, building it first if the cached
    /// one has another key (or there is none).
    pub fn with_pipeline<T>(
        &self,
        key: PipelineKey,
        f: impl FnOnce(&mut Pipeline) -> Result<T, TtsError>,
    ) -> Result<T, TtsError> {
        let mut slot = self.pipeline.lock();
        if let Some(pipeline) = slot.as_mut().filter(|p| p.key() == key) {
            return f(pipeline);
        }

        // The previous pipeline stays cached if this build fails.
        let built = Pipeline::build(key, &self.source())?;
        if let Some(old) = slot.as_ref() {
            log::info!("Replacing pipeline {} with {}", old.key(), key);
        }
        f(slot.insert(built))
    }

    /// Build the pipeline for `key` now instead of on the first call.
    pub fn preload(&self, key: PipelineKey) -> Result<(), TtsError> {
        self.with_pipeline(key, |_| Ok(()))
    }

    /// Diacritize `utterance` with the `id` vowelizer, loading it on CPU
    /// on first use.
    pub fn vocalize(&self, id: VowelizerId, utterance: &Utterance) -> Result<Utterance, TtsError> {
        let mut cache = self.vowelizers.lock();
        if let Some(vowelizer) = cache.get_mut(&id) {
            return vowelizer.vocalize(utterance);
        }

        log::info!("Loading vowelizer '{id}'");
        let model = self.source().load(id.catalog_entry(), Device::Cpu)?;
        cache
            .entry(id)
            .or_insert_with(|| Vowelizer::new(id, model))
            .vocalize(utterance)
    }

    /// Diacritize plain text (Arabic script or Buckwalter).
    pub fn vocalize_text(&self, text: &str, id: VowelizerId) -> Result<String, TtsError> {
        let utterance = Utterance::new(text)?;
        Ok(self.vocalize(id, &utterance)?.text().to_string())
    }

    /// Key of the cached pipeline, if any.
    pub fn cached_pipeline(&self) -> Option<PipelineKey> {
        self.pipeline.lock().as_ref().map(Pipeline::key)
    }

    /// Loaded vowelizers, in name order.
    pub fn cached_vowelizers(&self) -> Vec<VowelizerId> {
        let mut ids: Vec<VowelizerId> = self.vowelizers.lock().keys().copied().collect();
        ids.sort_unstable_by_key(|id| id.name());
        ids
    }

    /// Drop every cached model.
    pub fn reset(&self) {
        if let Some(old) = self.pipeline.lock().take() {
            log::info!("Dropped pipeline {}", old.key());
        }
        self.vowelizers.lock().clear();
    }
}

use std::fmt;

use crate::engines::arabic::session::{Device, SessionError};

/// Boxed error used for collaborator failures (downloads, session construction).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Neural stage of the synthesis pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Vowelizer,
    TextToMel,
    Vocoder,
    Denoiser,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Vowelizer => "vowelizer",
            Stage::TextToMel => "text-to-mel",
            Stage::Vocoder => "vocoder",
            Stage::Denoiser => "denoiser",
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TtsError {
    /// Rejected before any model was fetched, loaded or run.
    #[error("Invalid request: {0}")]
    Validation(String),
    /// Model acquisition or session construction failed. Nothing was cached.
    #[error("Failed to load model '{model}' on {device}: {source}")]
    Load {
        model: String,
        device: Device,
        #[source]
        source: BoxError,
    },
    /// A neural stage failed for this call. Cached models stay usable.
    #[error("{stage} inference failed: {source}")]
    Inference {
        stage: Stage,
        #[source]
        source: SessionError,
    },
    #[error("No model registry configured. Call load_model() first.")]
    ModelNotLoaded,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("Invalid symbols file: {0}")]
    Config(String),
}

impl TtsError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        TtsError::Validation(msg.into())
    }

    pub(crate) fn inference(stage: Stage) -> impl FnOnce(SessionError) -> Self {
        move |source| TtsError::Inference { stage, source }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, TtsError::Validation(_))
    }

    pub fn is_load(&self) -> bool {
        matches!(self, TtsError::Load { .. })
    }

    pub fn is_inference(&self) -> bool {
        matches!(self, TtsError::Inference { .. })
    }

    /// The stage that failed, for inference errors.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            TtsError::Inference { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

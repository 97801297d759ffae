//! Static model catalog and model identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::text::Script;
use crate::TtsError;

/// Where a logical model lives remotely and locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelCatalogEntry {
    /// Logical model name.
    pub name: &'static str,
    /// Path relative to the model root directory.
    pub file: &'static str,
    /// Remote location used when the file is missing locally.
    pub url: &'static str,
}

pub const CATALOG: &[ModelCatalogEntry] = &[
    // Text -> mel
    ModelCatalogEntry {
        name: "fastpitch",
        file: "data/fp_ms.onnx",
        url: "https://drive.google.com/file/d/1pD210QTN1IL3CTA1D65ldKB7ooZ2hANl/view?usp=sharing",
    },
    ModelCatalogEntry {
        name: "mixer128",
        file: "data/mixer128.onnx",
        url: "https://drive.google.com/file/d/1Aki7_E5KRzWTWG8721xl7-SZQ2bE5U19/view?usp=sharing",
    },
    ModelCatalogEntry {
        name: "mixer80",
        file: "data/mixer80.onnx",
        url: "https://drive.google.com/file/d/1C95RVIjhVttC8pdFAp1TOiEee9Cq50c8/view?usp=sharing",
    },
    // Vocoders
    ModelCatalogEntry {
        name: "vocos",
        file: "data/vocos22.onnx",
        url: "https://drive.google.com/file/d/1oNya-eTXB0_yqzHCIzPoHlJD1fwAUthI/view?usp=sharing",
    },
    ModelCatalogEntry {
        name: "vocos44",
        file: "data/vocos44.onnx",
        url: "https://drive.google.com/file/d/1Ra0aNGYgD_j0jHs3rmytFEP0_JoIM2GJ/view?usp=sharing",
    },
    ModelCatalogEntry {
        name: "hifigan",
        file: "data/hifigan.onnx",
        url: "https://drive.google.com/file/d/1rZxulMhjrlQDheoGy7xnlWGjFYyjF9Gz/view?usp=sharing",
    },
    ModelCatalogEntry {
        name: "denoiser",
        file: "data/denoiser.onnx",
        url: "https://drive.google.com/file/d/1XWgV7F7eQdRy-KTvCteyXVXAQoNIRa7z/view?usp=sharing",
    },
    // Vowelizers
    ModelCatalogEntry {
        name: "shakkala",
        file: "data/shakkala.onnx",
        url: "https://drive.google.com/file/d/1_BbfNj8fsSeGGSkws1tN6EB4zSmpTGp2/view?usp=sharing",
    },
    ModelCatalogEntry {
        name: "shakkelha",
        file: "data/shakkelha.onnx",
        url: "https://drive.google.com/file/d/1scpaMnVLjrDkGBL239pWeb7QW76b15W1/view?usp=sharing",
    },
];

fn builtin_entry(name: &str) -> &'static ModelCatalogEntry {
    match CATALOG.iter().find(|e| e.name == name) {
        Some(entry) => entry,
        None => unreachable!("model '{name}' missing from catalog"),
    }
}

fn parse_id<T: Copy>(
    kind: &str,
    s: &str,
    all: &[T],
    name: fn(T) -> &'static str,
) -> Result<T, TtsError> {
    let wanted = s.trim().to_ascii_lowercase();
    all.iter().copied().find(|&id| name(id) == wanted).ok_or_else(|| {
        let known: Vec<&str> = all.iter().map(|&id| name(id)).collect();
        TtsError::validation(format!(
            "unknown {kind} '{s}', expected one of: {}",
            known.join(", ")
        ))
    })
}

/// Text -> mel network variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextModelId {
    #[default]
    FastPitch,
    Mixer128,
    Mixer80,
}

impl TextModelId {
    pub const ALL: [TextModelId; 3] = [Self::FastPitch, Self::Mixer128, Self::Mixer80];

    pub fn name(self) -> &'static str {
        match self {
            Self::FastPitch => "fastpitch",
            Self::Mixer128 => "mixer128",
            Self::Mixer80 => "mixer80",
        }
    }

    /// Token table the network was trained on.
    pub fn script(self) -> Script {
        match self {
            Self::FastPitch | Self::Mixer128 => Script::Arabic,
            Self::Mixer80 => Script::Buckwalter,
        }
    }

    pub fn catalog_entry(self) -> &'static ModelCatalogEntry {
        builtin_entry(self.name())
    }
}

/// How a vocoder applies denoising.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocoderFamily {
    /// Denoise strength is an input of the vocoder network.
    Fused,
    /// Raw vocoder output goes through a separate denoiser network.
    Chained,
}

/// Mel -> wave network variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VocoderId {
    #[default]
    HifiGan,
    Vocos,
    Vocos44,
}

impl VocoderId {
    pub const ALL: [VocoderId; 3] = [Self::HifiGan, Self::Vocos, Self::Vocos44];

    pub fn name(self) -> &'static str {
        match self {
            Self::HifiGan => "hifigan",
            Self::Vocos => "vocos",
            Self::Vocos44 => "vocos44",
        }
    }

    /// Output sample rate in Hz.
    pub fn sample_rate(self) -> u32 {
        match self {
            Self::HifiGan | Self::Vocos => 22_050,
            Self::Vocos44 => 44_100,
        }
    }

    pub fn family(self) -> VocoderFamily {
        match self {
            Self::HifiGan => VocoderFamily::Chained,
            Self::Vocos | Self::Vocos44 => VocoderFamily::Fused,
        }
    }

    pub fn catalog_entry(self) -> &'static ModelCatalogEntry {
        builtin_entry(self.name())
    }

    /// Separate denoiser network, for chained vocoders.
    pub fn denoiser_entry(self) -> Option<&'static ModelCatalogEntry> {
        match self.family() {
            VocoderFamily::Chained => Some(builtin_entry("denoiser")),
            VocoderFamily::Fused => None,
        }
    }
}

/// Diacritization network variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VowelizerId {
    Shakkala,
    Shakkelha,
}

impl VowelizerId {
    pub const ALL: [VowelizerId; 2] = [Self::Shakkala, Self::Shakkelha];

    pub fn name(self) -> &'static str {
        match self {
            Self::Shakkala => "shakkala",
            Self::Shakkelha => "shakkelha",
        }
    }

    pub fn catalog_entry(self) -> &'static ModelCatalogEntry {
        builtin_entry(self.name())
    }
}

impl FromStr for TextModelId {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_id("text model", s, &Self::ALL, Self::name)
    }
}

impl FromStr for VocoderId {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_id("vocoder", s, &Self::ALL, Self::name)
    }
}

impl FromStr for VowelizerId {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_id("vowelizer", s, &Self::ALL, Self::name)
    }
}

impl fmt::Display for TextModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for VocoderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for VowelizerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifiers of the available text -> mel models and vocoders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableModels {
    pub models: Vec<&'static str>,
    pub vocoders: Vec<&'static str>,
}

pub fn get_available_models() -> AvailableModels {
    AvailableModels {
        models: TextModelId::ALL.iter().map(|m| m.name()).collect(),
        vocoders: VocoderId::ALL.iter().map(|v| v.name()).collect(),
    }
}

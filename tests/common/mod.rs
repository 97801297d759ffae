//! Mock networks standing in for the ONNX files.
//!
//! Models are picked by file stem and count their constructions and runs in
//! a shared [`Counters`].

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::{ArrayD, IxDyn};
use parking_lot::Mutex;
use tts_arabic::engines::arabic::catalog::ModelCatalogEntry;
use tts_arabic::engines::arabic::fetch::FetchError;
use tts_arabic::engines::arabic::session::NamedTensors;
use tts_arabic::engines::arabic::{
    Device, InferenceModel, ModelFetcher, ModelLoader, ModelRegistry, SessionError, TensorData,
};

/// Mel frames per input token.
pub const FRAMES_PER_TOKEN: usize = 4;
/// Waveform samples per mel frame.
pub const HOP: usize = 256;
pub const MEL_BANDS: usize = 80;
/// Speaker ids at or above this fail inside the text -> mel mock.
pub const SPEAKERS: i64 = 4;

#[derive(Default)]
pub struct Counters {
    loads: Mutex<HashMap<String, usize>>,
    runs: Mutex<HashMap<String, usize>>,
    last_tokens: Mutex<Vec<i64>>,
}

impl Counters {
    pub fn loads(&self, stem: &str) -> usize {
        self.loads.lock().get(stem).copied().unwrap_or(0)
    }

    pub fn total_loads(&self) -> usize {
        self.loads.lock().values().sum()
    }

    pub fn runs(&self, stem: &str) -> usize {
        self.runs.lock().get(stem).copied().unwrap_or(0)
    }

    /// Token ids of the latest text -> mel run.
    pub fn last_tokens(&self) -> Vec<i64> {
        self.last_tokens.lock().clone()
    }

    fn record_run(&self, stem: &str) {
        *self.runs.lock().entry(stem.to_string()).or_default() += 1;
    }
}

pub struct MockLoader {
    counters: Arc<Counters>,
    cuda_devices: u32,
    failing: Mutex<HashSet<String>>,
}

impl MockLoader {
    /// Loader on a machine with `cuda_devices` accelerators.
    pub fn new(counters: Arc<Counters>, cuda_devices: u32) -> Self {
        Self {
            counters,
            cuda_devices,
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Make every later load of `stem` fail.
    pub fn fail(&self, stem: &str) {
        self.failing.lock().insert(stem.to_string());
    }

    pub fn heal(&self, stem: &str) {
        self.failing.lock().remove(stem);
    }
}

impl ModelLoader for MockLoader {
    fn load(&self, path: &Path, device: Device) -> Result<Box<dyn InferenceModel>, SessionError> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        if let Device::Cuda(index) = device {
            if index >= self.cuda_devices {
                return Err(SessionError::Fault(format!("no CUDA device {index}")));
            }
        }
        if self.failing.lock().contains(&stem) {
            return Err(SessionError::Fault(format!("corrupt model file {stem}")));
        }

        let kind = match stem.as_str() {
            "fp_ms" | "mixer128" | "mixer80" => Kind::TextMel,
            "hifigan" => Kind::HifiGan,
            "denoiser" => Kind::Denoiser,
            "vocos22" => Kind::Vocos { hop: HOP },
            "vocos44" => Kind::Vocos { hop: 2 * HOP },
            "shakkala" | "shakkelha" => Kind::Vowelizer,
            other => return Err(SessionError::Fault(format!("unknown model {other}"))),
        };

        *self.counters.loads.lock().entry(stem.clone()).or_default() += 1;
        Ok(Box::new(MockModel {
            stem,
            kind,
            counters: Arc::clone(&self.counters),
        }))
    }
}

enum Kind {
    TextMel,
    HifiGan,
    Denoiser,
    Vocos { hop: usize },
    Vowelizer,
}

struct MockModel {
    stem: String,
    kind: Kind,
    counters: Arc<Counters>,
}

fn input<'a>(inputs: &'a NamedTensors, name: &str) -> Result<&'a TensorData, SessionError> {
    inputs
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, t)| t)
        .ok_or_else(|| SessionError::Fault(format!("missing input {name}")))
}

fn f32_input<'a>(inputs: &'a NamedTensors, name: &str) -> Result<&'a ArrayD<f32>, SessionError> {
    input(inputs, name)?
        .as_f32()
        .ok_or_else(|| SessionError::Fault(format!("{name} is not f32")))
}

/// Rejects a `pace` of the wrong precision the way ONNX Runtime does.
fn f64_input<'a>(inputs: &'a NamedTensors, name: &str) -> Result<&'a ArrayD<f64>, SessionError> {
    let tensor = input(inputs, name)?;
    tensor.as_f64().ok_or_else(|| SessionError::DType {
        name: name.to_string(),
        expected: "f64",
        actual: tensor.dtype(),
    })
}

fn i64_input<'a>(inputs: &'a NamedTensors, name: &str) -> Result<&'a ArrayD<i64>, SessionError> {
    input(inputs, name)?
        .as_i64()
        .ok_or_else(|| SessionError::Fault(format!("{name} is not i64")))
}

fn first(a: &ArrayD<f32>) -> f32 {
    a.iter().next().copied().unwrap_or_default()
}

/// Deterministic waveform: one decaying sine burst per frame, scaled by the
/// frame's mean mel value.
fn render(mel: &ArrayD<f32>, hop: usize) -> Vec<f32> {
    let frames = mel.shape()[2];
    let bands = mel.shape()[1];
    let mut wave = Vec::with_capacity(frames * hop);
    for f in 0..frames {
        let level: f32 = (0..bands).map(|b| mel[&[0, b, f][..]]).sum::<f32>() / bands as f32;
        for i in 0..hop {
            wave.push((level + 0.1) * (i as f32 * 0.05).sin() * 0.3);
        }
    }
    wave
}

fn wave_output(name: &str, shape: &[usize], wave: Vec<f32>) -> Result<NamedTensors, SessionError> {
    let array = ArrayD::from_shape_vec(IxDyn(shape), wave)
        .map_err(|e| SessionError::Fault(e.to_string()))?;
    Ok(vec![(name.to_string(), TensorData::F32(array))])
}

impl InferenceModel for MockModel {
    fn run(&mut self, inputs: NamedTensors) -> Result<NamedTensors, SessionError> {
        self.counters.record_run(&self.stem);
        match self.kind {
            Kind::TextMel => {
                let ids = i64_input(&inputs, "input")?;
                let speaker = i64_input(&inputs, "speaker")?.iter().next().copied().unwrap_or(0);
                if speaker >= SPEAKERS {
                    return Err(SessionError::Fault(format!("speaker {speaker} out of range")));
                }
                f64_input(&inputs, "pace")?;
                let pitch_add = first(f32_input(&inputs, "pitch_add")?);
                let ids: Vec<i64> = ids.iter().copied().collect();
                *self.counters.last_tokens.lock() = ids.clone();

                let frames = ids.len() * FRAMES_PER_TOKEN;
                let mut mel = ArrayD::<f32>::zeros(IxDyn(&[1, MEL_BANDS, frames]));
                for f in 0..frames {
                    let id = ids[f / FRAMES_PER_TOKEN] as f32;
                    for b in 0..MEL_BANDS {
                        mel[&[0, b, f][..]] = ((id + b as f32) * 0.1).sin() + pitch_add;
                    }
                }
                Ok(vec![("mel".to_string(), TensorData::F32(mel))])
            }
            Kind::HifiGan => {
                let mel = f32_input(&inputs, "input")?;
                let wave = render(mel, HOP);
                let n = wave.len();
                wave_output("wave", &[1, 1, n], wave)
            }
            Kind::Denoiser => {
                let audio = f32_input(&inputs, "audio")?;
                let strength = first(f32_input(&inputs, "strength")?);
                let wave: Vec<f32> = audio.iter().map(|s| s * (1.0 - strength)).collect();
                let n = wave.len();
                wave_output("audio_denoised", &[1, n], wave)
            }
            Kind::Vocos { hop } => {
                let mel = f32_input(&inputs, "mel")?;
                let denoise = first(f32_input(&inputs, "denoise")?);
                let wave: Vec<f32> = render(mel, hop)
                    .into_iter()
                    .map(|s| s * (1.0 - denoise))
                    .collect();
                let n = wave.len();
                wave_output("wave", &[1, n], wave)
            }
            Kind::Vowelizer => {
                let t = i64_input(&inputs, "input")?.shape()[1];
                // Always predicts fatha.
                let mut scores = ArrayD::<f32>::zeros(IxDyn(&[1, t, 15]));
                for i in 0..t {
                    scores[&[0, i, 1][..]] = 1.0;
                }
                Ok(vec![("probs".to_string(), TensorData::F32(scores))])
            }
        }
    }
}

/// Resolves every entry to `data/<file>` without touching the disk.
#[derive(Default)]
pub struct StubFetcher {
    fetches: Mutex<usize>,
}

impl StubFetcher {
    pub fn fetches(&self) -> usize {
        *self.fetches.lock()
    }
}

impl ModelFetcher for StubFetcher {
    fn ensure_local(&self, entry: &ModelCatalogEntry) -> Result<PathBuf, FetchError> {
        *self.fetches.lock() += 1;
        Ok(PathBuf::from(entry.file))
    }
}

pub struct Harness {
    pub registry: ModelRegistry,
    pub loader: Arc<MockLoader>,
    pub fetcher: Arc<StubFetcher>,
    pub counters: Arc<Counters>,
}

/// Registry over mocks on a machine with one CUDA device.
pub fn harness() -> Harness {
    let counters = Arc::new(Counters::default());
    let loader = Arc::new(MockLoader::new(Arc::clone(&counters), 1));
    let fetcher = Arc::new(StubFetcher::default());
    let registry = ModelRegistry::new(loader.clone(), fetcher.clone());
    Harness {
        registry,
        loader,
        fetcher,
        counters,
    }
}

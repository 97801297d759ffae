use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::Instant;

use ort::execution_providers::{
    CPUExecutionProvider, CUDAExecutionProvider, ExecutionProviderDispatch,
};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::{Session, SessionInputValue, SessionInputs};
use ort::value::TensorRef;

use super::session::{Device, InferenceModel, ModelLoader, NamedTensors, SessionError, TensorData};

/// Loads ONNX models into ONNX Runtime sessions.
#[derive(Debug, Clone, Default)]
pub struct OrtLoader {
    /// Number of intra/inter op threads. `None` uses the ORT default.
    pub num_threads: Option<usize>,
    /// Directory for Level3-optimized graphs, one file per model and device.
    pub optimized_cache_dir: Option<PathBuf>,
}

impl OrtLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    pub fn with_optimized_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.optimized_cache_dir = Some(dir.into());
        self
    }
}

impl ModelLoader for OrtLoader {
    fn load(&self, path: &Path, device: Device) -> Result<Box<dyn InferenceModel>, SessionError> {
        if !path.exists() {
            return Err(SessionError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Model file not found at {}", path.display()),
            )));
        }

        let start = Instant::now();
        let cache = self
            .optimized_cache_dir
            .as_deref()
            .map(|dir| optimized_graph_path(dir, path, device));
        let session = init_session(path, device, self.num_threads, cache.as_deref())?;
        log::info!(
            "Loaded {} on {} in {:.2?}",
            path.display(),
            device,
            start.elapsed()
        );

        Ok(Box::new(OrtModel { session }))
    }
}

/// An ONNX Runtime session behind the [`InferenceModel`] contract.
pub struct OrtModel {
    session: Session,
}

impl InferenceModel for OrtModel {
    fn run(&mut self, inputs: NamedTensors) -> Result<NamedTensors, SessionError> {
        let mut values: Vec<(Cow<'_, str>, SessionInputValue<'_>)> =
            Vec::with_capacity(inputs.len());
        for (name, tensor) in &inputs {
            let value: SessionInputValue<'_> = match tensor {
                TensorData::F32(a) => TensorRef::from_array_view(a.view())?.into(),
                TensorData::F64(a) => TensorRef::from_array_view(a.view())?.into(),
                TensorData::I64(a) => TensorRef::from_array_view(a.view())?.into(),
            };
            values.push((Cow::Borrowed(name.as_str()), value));
        }

        let outputs = self.session.run(SessionInputs::from(values))?;

        let mut result = Vec::with_capacity(outputs.len());
        for (name, value) in outputs.iter() {
            let tensor = if let Ok(a) = value.try_extract_array::<f32>() {
                TensorData::F32(a.to_owned())
            } else if let Ok(a) = value.try_extract_array::<f64>() {
                TensorData::F64(a.to_owned())
            } else if let Ok(a) = value.try_extract_array::<i64>() {
                TensorData::I64(a.to_owned())
            } else {
                return Err(SessionError::DType {
                    name: name.to_string(),
                    expected: "f32, f64 or i64",
                    actual: "unsupported",
                });
            };
            result.push((name.to_string(), tensor));
        }

        Ok(result)
    }
}

fn execution_providers(device: Device) -> Vec<ExecutionProviderDispatch> {
    match device {
        Device::Cpu => vec![CPUExecutionProvider::default().build()],
        // No CPU fallback: an unusable accelerator must fail the load.
        Device::Cuda(index) => vec![CUDAExecutionProvider::default()
            .with_device_id(index as i32)
            .build()
            .error_on_failure()],
    }
}

/// `<cache_dir>/<model stem>.<device>.opt.onnx`
fn optimized_graph_path(cache_dir: &Path, model_path: &Path, device: Device) -> PathBuf {
    let stem = model_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model");
    let device_tag = match device {
        Device::Cpu => "cpu".to_string(),
        Device::Cuda(index) => format!("cuda{index}"),
    };
    cache_dir.join(format!("{stem}.{device_tag}.opt.onnx"))
}

/// Initialize an ONNX session with optional on-disk graph caching.
///
/// The first load of a model runs Level3 graph optimization and serialises
/// the result to `optimized_cache_path`. Later loads read the pre-optimized
/// file at `Disable` level.
fn init_session(
    onnx_path: &Path,
    device: Device,
    num_threads: Option<usize>,
    optimized_cache_path: Option<&Path>,
) -> Result<Session, SessionError> {
    let (load_path, opt_level, write_cache) = match optimized_cache_path {
        Some(cache) if cache.exists() => {
            log::info!(
                "Loading pre-optimized graph ({:.1} MB) from {:?}",
                cache
                    .metadata()
                    .map(|m| m.len() as f64 / 1_048_576.0)
                    .unwrap_or(0.0),
                cache
            );
            (cache, GraphOptimizationLevel::Disable, None)
        }
        Some(cache) => {
            log::info!("First load: running Level3 optimization; saving graph to {:?}", cache);
            (onnx_path, GraphOptimizationLevel::Level3, Some(cache))
        }
        None => (onnx_path, GraphOptimizationLevel::Level3, None),
    };

    let mut builder = Session::builder()?
        .with_optimization_level(opt_level)?
        .with_execution_providers(execution_providers(device))?;

    if let Some(cache) = write_cache {
        if let Some(parent) = cache.parent() {
            std::fs::create_dir_all(parent)?;
        }
        builder = builder.with_optimized_model_path(cache)?;
    }

    if let Some(threads) = num_threads {
        builder = builder
            .with_intra_threads(threads)?
            .with_inter_threads(threads)?;
    }

    Ok(builder.commit_from_file(load_path)?)
}

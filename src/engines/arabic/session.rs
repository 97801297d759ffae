//! Backend-neutral inference session contract.
//!
//! Every neural stage talks to its network through [`InferenceModel`]: named
//! tensors in, named tensors out, one blocking pass per call. Sessions are
//! produced by a [`ModelLoader`] bound to a [`Device`]. The ONNX Runtime
//! implementation lives in [`super::onnx`]; tests plug in their own.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use ndarray::{ArrayD, IxDyn};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::TtsError;

/// Compute device a model is bound to.
///
/// Serialized as its display form: `"cpu"`, `"cuda:0"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Device {
    #[default]
    Cpu,
    /// CUDA accelerator by index.
    Cuda(u32),
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda(index) => write!(f, "cuda:{index}"),
        }
    }
}

impl FromStr for Device {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "cpu" => Ok(Device::Cpu),
            "cuda" => Ok(Device::Cuda(0)),
            _ => s
                .strip_prefix("cuda:")
                .and_then(|index| index.parse().ok())
                .map(Device::Cuda)
                .ok_or_else(|| {
                    TtsError::validation(format!(
                        "unknown device '{s}', expected 'cpu' or 'cuda:<index>'"
                    ))
                }),
        }
    }
}

impl Serialize for Device {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Device {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[cfg(feature = "onnx")]
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("Model produced no output")]
    MissingOutput,
    #[error("Tensor '{name}' has dtype {actual}, expected {expected}")]
    DType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("Tensor '{name}' has unexpected shape {shape:?}")]
    BadShape { name: String, shape: Vec<usize> },
    #[error("{0}")]
    Fault(String),
}

/// Owned, dynamically shaped tensor.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
    I64(ArrayD<i64>),
}

/// Ordered `(name, tensor)` pairs.
pub type NamedTensors = Vec<(String, TensorData)>;

impl TensorData {
    /// Single-element `f32` tensor of shape `[1]`.
    pub fn scalar_f32(value: f32) -> Self {
        TensorData::F32(ArrayD::from_elem(IxDyn(&[1]), value))
    }

    pub fn scalar_f64(value: f64) -> Self {
        TensorData::F64(ArrayD::from_elem(IxDyn(&[1]), value))
    }

    /// Single-element `i64` tensor of shape `[1]`.
    pub fn scalar_i64(value: i64) -> Self {
        TensorData::I64(ArrayD::from_elem(IxDyn(&[1]), value))
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            TensorData::F32(a) => a.shape(),
            TensorData::F64(a) => a.shape(),
            TensorData::I64(a) => a.shape(),
        }
    }

    pub fn dtype(&self) -> &'static str {
        match self {
            TensorData::F32(_) => "f32",
            TensorData::F64(_) => "f64",
            TensorData::I64(_) => "i64",
        }
    }

    /// Floating point data as `f32`. Double precision outputs are narrowed.
    pub fn into_f32(self, name: &str) -> Result<ArrayD<f32>, SessionError> {
        match self {
            TensorData::F32(a) => Ok(a),
            TensorData::F64(a) => Ok(a.mapv(|v| v as f32)),
            TensorData::I64(_) => Err(SessionError::DType {
                name: name.to_string(),
                expected: "f32",
                actual: "i64",
            }),
        }
    }

    pub fn as_i64(&self) -> Option<&ArrayD<i64>> {
        match self {
            TensorData::I64(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<&ArrayD<f32>> {
        match self {
            TensorData::F32(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<&ArrayD<f64>> {
        match self {
            TensorData::F64(a) => Some(a),
            _ => None,
        }
    }
}

impl From<ArrayD<f32>> for TensorData {
    fn from(a: ArrayD<f32>) -> Self {
        TensorData::F32(a)
    }
}

impl From<ArrayD<f64>> for TensorData {
    fn from(a: ArrayD<f64>) -> Self {
        TensorData::F64(a)
    }
}

impl From<ArrayD<i64>> for TensorData {
    fn from(a: ArrayD<i64>) -> Self {
        TensorData::I64(a)
    }
}

/// A loaded neural network. One call is one blocking inference pass.
pub trait InferenceModel: Send {
    fn run(&mut self, inputs: NamedTensors) -> Result<NamedTensors, SessionError>;
}

/// Builds [`InferenceModel`]s from files.
///
/// Implementations must fail rather than silently place a model on a
/// different device than the one requested.
pub trait ModelLoader: Send + Sync {
    fn load(&self, path: &Path, device: Device) -> Result<Box<dyn InferenceModel>, SessionError>;
}

/// Take the first output of a run.
pub fn first_output(outputs: NamedTensors) -> Result<(String, TensorData), SessionError> {
    outputs.into_iter().next().ok_or(SessionError::MissingOutput)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_parses_and_displays() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("CUDA".parse::<Device>().unwrap(), Device::Cuda(0));
        assert_eq!("cuda:3".parse::<Device>().unwrap(), Device::Cuda(3));
        assert_eq!(Device::Cuda(1).to_string(), "cuda:1");
        assert!("tpu".parse::<Device>().unwrap_err().is_validation());
        assert!("cuda:x".parse::<Device>().is_err());
    }

    #[test]
    fn double_outputs_narrow_to_f32() {
        let t = TensorData::F64(ArrayD::from_elem(IxDyn(&[2, 3]), 0.5));
        let a = t.into_f32("mel").unwrap();
        assert_eq!(a.shape(), &[2, 3]);
        assert!(a.iter().all(|&v| v == 0.5));
    }

    #[test]
    fn integer_tensor_is_not_audio() {
        let err = TensorData::scalar_i64(4).into_f32("wave").unwrap_err();
        assert!(matches!(err, SessionError::DType { actual: "i64", .. }));
    }

    #[test]
    fn first_output_requires_an_output() {
        assert!(matches!(first_output(vec![]), Err(SessionError::MissingOutput)));
    }
}

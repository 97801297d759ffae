use ndarray::{ArrayD, IxDyn};

use super::session::{first_output, InferenceModel, SessionError, TensorData};
use super::vocoder::unbatch_wave;
use crate::{Stage, TtsError};

/// Soft upper bound of useful denoise strengths. Not enforced.
pub const DENOISE_SOFT_LIMIT: f32 = 0.02;

/// Learned spectral bias subtraction applied after a chained vocoder.
///
/// Inputs: `audio` f32 `[1, N]`, `strength` f32 `[1]`. Output `[1, N]`.
pub struct Denoiser {
    model: Box<dyn InferenceModel>,
}

impl Denoiser {
    pub fn new(model: Box<dyn InferenceModel>) -> Self {
        Self { model }
    }

    pub fn infer(&mut self, wave: Vec<f32>, strength: f32) -> Result<Vec<f32>, TtsError> {
        self.run(wave, strength)
            .map_err(TtsError::inference(Stage::Denoiser))
    }

    fn run(&mut self, wave: Vec<f32>, strength: f32) -> Result<Vec<f32>, SessionError> {
        let n = wave.len();
        let audio = ArrayD::from_shape_vec(IxDyn(&[1, n]), wave)?;
        let outputs = self.model.run(vec![
            ("audio".to_string(), TensorData::F32(audio)),
            ("strength".to_string(), TensorData::scalar_f32(strength)),
        ])?;
        let (name, out) = first_output(outputs)?;
        unbatch_wave(&name, out)
    }
}

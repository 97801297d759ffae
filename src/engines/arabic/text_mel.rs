use ndarray::{Array2, ArrayD, Axis, Ix2, IxDyn};

use super::session::{first_output, InferenceModel, SessionError, TensorData};
use super::tokenizer::TokenSequence;
use crate::{Stage, TtsError};

/// Mel spectrogram, shape `[mel_bands, n_frames]`.
pub type MelSpectrogram = Array2<f32>;

/// Speaker and prosody controls of the text -> mel network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProsodyControls {
    pub speaker: i64,
    /// Speaking rate multiplier; < 1 slows down, > 1 speeds up.
    pub pace: f32,
    /// Scale of the z-score normalized pitch contour.
    pub pitch_mul: f32,
    /// Shift in normalized pitch space (1.0 ~ one standard deviation).
    pub pitch_add: f32,
}

impl Default for ProsodyControls {
    fn default() -> Self {
        Self {
            speaker: 0,
            pace: 1.0,
            pitch_mul: 1.0,
            pitch_add: 0.0,
        }
    }
}

/// FastPitch / MixerTTS adapter.
///
/// Inputs: `input` i64 `[1, T]`, `pace` f64 `[1]`, `speaker` i64 `[1]`,
/// `pitch_mul` f32 `[1]`, `pitch_add` f32 `[1]`.
/// Output: mel `[1, bands, frames]`, returned without the batch axis.
pub struct TextToMel {
    model: Box<dyn InferenceModel>,
}

impl TextToMel {
    pub fn new(model: Box<dyn InferenceModel>) -> Self {
        Self { model }
    }

    pub fn infer(
        &mut self,
        tokens: &TokenSequence,
        controls: &ProsodyControls,
    ) -> Result<MelSpectrogram, TtsError> {
        self.run(tokens, controls)
            .map_err(TtsError::inference(Stage::TextToMel))
    }

    fn run(
        &mut self,
        tokens: &TokenSequence,
        controls: &ProsodyControls,
    ) -> Result<MelSpectrogram, SessionError> {
        let ids = ArrayD::from_shape_vec(IxDyn(&[1, tokens.len()]), tokens.ids().to_vec())?;

        let outputs = self.model.run(vec![
            ("input".to_string(), TensorData::I64(ids)),
            ("pace".to_string(), TensorData::scalar_f64(f64::from(controls.pace))),
            ("speaker".to_string(), TensorData::scalar_i64(controls.speaker)),
            ("pitch_mul".to_string(), TensorData::scalar_f32(controls.pitch_mul)),
            ("pitch_add".to_string(), TensorData::scalar_f32(controls.pitch_add)),
        ])?;

        let (name, mel) = first_output(outputs)?;
        let mel = mel.into_f32(&name)?;
        if mel.ndim() != 3 || mel.shape()[0] != 1 {
            return Err(SessionError::BadShape {
                name,
                shape: mel.shape().to_vec(),
            });
        }

        Ok(mel.index_axis_move(Axis(0), 0).into_dimensionality::<Ix2>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::arabic::session::NamedTensors;

    /// Echoes the inputs it saw into a `[1, 2, T]` mel.
    struct EchoMel {
        batch: usize,
    }

    impl InferenceModel for EchoMel {
        fn run(&mut self, inputs: NamedTensors) -> Result<NamedTensors, SessionError> {
            let ids = inputs[0].1.as_i64().unwrap();
            let pace = inputs[1].1.as_f64().unwrap()[&[0][..]] as f32;
            let t = ids.shape()[1];
            let mut data: Vec<f32> = ids.iter().map(|&v| v as f32).collect();
            data.extend(std::iter::repeat(pace).take(t));
            let data = data.repeat(self.batch);
            let mel = ArrayD::from_shape_vec(IxDyn(&[self.batch, 2, t]), data).unwrap();
            Ok(vec![("mel".to_string(), TensorData::F32(mel))])
        }
    }

    fn tokens(ids: &[i64]) -> TokenSequence {
        TokenSequence::from(ids.to_vec())
    }

    #[test]
    fn strips_batch_axis_and_passes_controls_through() {
        let mut stage = TextToMel::new(Box::new(EchoMel { batch: 1 }));
        let seq = tokens(&[10, 11, 12]);
        let controls = ProsodyControls {
            pace: 0.5,
            ..Default::default()
        };
        let mel = stage.infer(&seq, &controls).unwrap();
        assert_eq!(mel.dim(), (2, 3));
        assert_eq!(mel[[0, 0]], seq.ids()[0] as f32);
        assert_eq!(mel[[1, 2]], 0.5);
    }

    #[test]
    fn pace_is_double_precision() {
        struct Inspect;
        impl InferenceModel for Inspect {
            fn run(&mut self, inputs: NamedTensors) -> Result<NamedTensors, SessionError> {
                let dtypes: Vec<(&str, &str)> =
                    inputs.iter().map(|(n, t)| (n.as_str(), t.dtype())).collect();
                assert_eq!(
                    dtypes,
                    [
                        ("input", "i64"),
                        ("pace", "f64"),
                        ("speaker", "i64"),
                        ("pitch_mul", "f32"),
                        ("pitch_add", "f32"),
                    ]
                );
                let mel = ArrayD::zeros(IxDyn(&[1, 2, 1]));
                Ok(vec![("mel".to_string(), TensorData::F32(mel))])
            }
        }
        let mut stage = TextToMel::new(Box::new(Inspect));
        stage
            .infer(&tokens(&[10]), &ProsodyControls::default())
            .unwrap();
    }

    #[test]
    fn rejects_batched_output() {
        let mut stage = TextToMel::new(Box::new(EchoMel { batch: 2 }));
        let err = stage
            .infer(&tokens(&[10, 11]), &ProsodyControls::default())
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::TextToMel));
    }
}

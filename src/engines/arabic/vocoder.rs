use ndarray::{Array3, ArrayD, Axis};

use super::catalog::VocoderFamily;
use super::denoiser::Denoiser;
use super::session::{first_output, InferenceModel, SessionError, TensorData};
use super::text_mel::MelSpectrogram;
use crate::{Stage, TtsError};

/// Mel -> wave stage.
///
/// Both families share one `infer(mel, denoise)` contract; which one is
/// active is fixed when the pipeline is built.
pub enum Vocoder {
    /// Vocos: inputs `mel` f32 `[1, bands, frames]` and `denoise` f32 `[1]`.
    Fused { model: Box<dyn InferenceModel> },
    /// HiFi-GAN: input `input` f32 `[1, bands, frames]`, then a separate
    /// [`Denoiser`] pass when denoise > 0.
    Chained {
        model: Box<dyn InferenceModel>,
        denoiser: Denoiser,
    },
}

impl Vocoder {
    pub fn fused(model: Box<dyn InferenceModel>) -> Self {
        Vocoder::Fused { model }
    }

    pub fn chained(model: Box<dyn InferenceModel>, denoiser: Denoiser) -> Self {
        Vocoder::Chained { model, denoiser }
    }

    pub fn family(&self) -> VocoderFamily {
        match self {
            Vocoder::Fused { .. } => VocoderFamily::Fused,
            Vocoder::Chained { .. } => VocoderFamily::Chained,
        }
    }

    /// Waveform for `mel`, single channel and without the batch axis.
    pub fn infer(&mut self, mel: &MelSpectrogram, denoise: f32) -> Result<Vec<f32>, TtsError> {
        let batched = batch_mel(mel).into_dyn();
        match self {
            Vocoder::Fused { model } => {
                let inputs = vec![
                    ("mel".to_string(), TensorData::F32(batched)),
                    ("denoise".to_string(), TensorData::scalar_f32(denoise)),
                ];
                run_wave(model.as_mut(), inputs).map_err(TtsError::inference(Stage::Vocoder))
            }
            Vocoder::Chained { model, denoiser } => {
                let inputs = vec![("input".to_string(), TensorData::F32(batched))];
                let wave = run_wave(model.as_mut(), inputs)
                    .map_err(TtsError::inference(Stage::Vocoder))?;
                if denoise > 0.0 {
                    denoiser.infer(wave, denoise)
                } else {
                    Ok(wave)
                }
            }
        }
    }
}

fn batch_mel(mel: &MelSpectrogram) -> Array3<f32> {
    mel.view().insert_axis(Axis(0)).to_owned()
}

fn run_wave(
    model: &mut dyn InferenceModel,
    inputs: Vec<(String, TensorData)>,
) -> Result<Vec<f32>, SessionError> {
    let (name, out) = first_output(model.run(inputs)?)?;
    unbatch_wave(&name, out)
}

/// Extract the single waveform from a `[1, N]` or `[1, 1, N]` output.
pub(crate) fn unbatch_wave(name: &str, tensor: TensorData) -> Result<Vec<f32>, SessionError> {
    let wave: ArrayD<f32> = tensor.into_f32(name)?;
    let shape = wave.shape().to_vec();
    if !matches!(shape.as_slice(), [1, _] | [1, 1, _]) {
        return Err(SessionError::BadShape {
            name: name.to_string(),
            shape,
        });
    }
    Ok(wave.iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::arabic::session::NamedTensors;
    use ndarray::{Array2, IxDyn};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Emits `frames * 4` samples of 0.5, shaped like HiFi-GAN or Vocos output.
    struct ConstVocoder {
        three_d: bool,
    }

    impl InferenceModel for ConstVocoder {
        fn run(&mut self, inputs: NamedTensors) -> Result<NamedTensors, SessionError> {
            let frames = inputs[0].1.shape()[2];
            let shape: Vec<usize> = if self.three_d {
                vec![1, 1, frames * 4]
            } else {
                vec![1, frames * 4]
            };
            let wave = ArrayD::from_elem(IxDyn(&shape), 0.5f32);
            Ok(vec![("wave".to_string(), TensorData::F32(wave))])
        }
    }

    /// Halves the signal and counts invocations.
    struct HalvingDenoiser {
        calls: Arc<AtomicUsize>,
    }

    impl InferenceModel for HalvingDenoiser {
        fn run(&mut self, inputs: NamedTensors) -> Result<NamedTensors, SessionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let audio = inputs[0].1.as_f32().unwrap().mapv(|v| v * 0.5);
            Ok(vec![("audio".to_string(), TensorData::F32(audio))])
        }
    }

    fn chained(calls: &Arc<AtomicUsize>) -> Vocoder {
        Vocoder::chained(
            Box::new(ConstVocoder { three_d: true }),
            Denoiser::new(Box::new(HalvingDenoiser {
                calls: Arc::clone(calls),
            })),
        )
    }

    #[test]
    fn chained_vocoder_skips_denoiser_at_zero() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut vocoder = chained(&calls);
        let mel = Array2::<f32>::zeros((80, 10));

        let wave = vocoder.infer(&mel, 0.0).unwrap();
        assert_eq!(wave.len(), 40);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let wave = vocoder.infer(&mel, 0.005).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(wave.iter().all(|&v| v == 0.25));
    }

    #[test]
    fn fused_vocoder_unbatches_two_dim_output() {
        let mut vocoder = Vocoder::fused(Box::new(ConstVocoder { three_d: false }));
        assert_eq!(vocoder.family(), VocoderFamily::Fused);
        let wave = vocoder.infer(&Array2::zeros((80, 3)), 0.005).unwrap();
        assert_eq!(wave.len(), 12);
    }

    #[test]
    fn multi_channel_output_is_an_inference_error() {
        let out = TensorData::F32(ArrayD::zeros(IxDyn(&[1, 2, 8])));
        assert!(matches!(
            unbatch_wave("wave", out),
            Err(SessionError::BadShape { .. })
        ));
    }
}

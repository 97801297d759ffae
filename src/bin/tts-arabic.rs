//! `tts-arabic` - synthesize Arabic text to a WAV file.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tts_arabic::engines::arabic::{
    fetch::default_model_root, get_available_models, ArabicEngine, ArabicInferenceParams,
    ArabicModelParams, Device, TextModelId, VocoderId, VowelizerId,
};
use tts_arabic::{SynthesisEngine, WavOptions};

#[derive(Parser)]
#[command(name = "tts-arabic")]
#[command(about = "Arabic text-to-speech with FastPitch/MixerTTS and HiFi-GAN/Vocos", long_about = None)]
struct Cli {
    /// Text to speak, in Arabic script or Buckwalter transliteration
    #[arg(required_unless_present = "list_models")]
    text: Option<String>,

    /// Output WAV file
    #[arg(short, long, default_value = "out.wav")]
    output: PathBuf,

    /// Speaker id (multi-speaker FastPitch only)
    #[arg(long, default_value_t = 0)]
    speaker: i64,

    /// Speaking rate multiplier
    #[arg(long, default_value_t = 1.0)]
    pace: f32,

    /// Denoiser strength
    #[arg(long, default_value_t = 0.005)]
    denoise: f32,

    /// Output peak amplitude
    #[arg(long, default_value_t = 0.9)]
    volume: f32,

    /// Diacritize the input first: shakkala or shakkelha
    #[arg(long, value_name = "NAME")]
    vowelizer: Option<VowelizerId>,

    /// Pitch contour scale; negative values invert it
    #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
    pitch_mul: f32,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pitch_add: f32,

    /// Run on this CUDA device instead of the CPU
    #[arg(long, value_name = "INDEX")]
    cuda: Option<u32>,

    /// Text -> mel model: fastpitch, mixer128 or mixer80
    #[arg(long, value_name = "ID", default_value = "fastpitch")]
    model: TextModelId,

    /// Vocoder: hifigan, vocos or vocos44
    #[arg(long, value_name = "ID", default_value = "hifigan")]
    vocoder: VocoderId,

    /// WAV bit depth: 8, 16 or 32 (integer PCM)
    #[arg(long, default_value_t = 32)]
    bits: u16,

    /// Model root containing data/ (default: $TTS_ARABIC_HOME or .)
    #[arg(long, value_name = "DIR")]
    model_dir: Option<PathBuf>,

    /// Print the available models and vocoders as JSON and exit
    #[arg(long)]
    list_models: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.list_models {
        println!("{}", serde_json::to_string_pretty(&get_available_models())?);
        return Ok(());
    }
    let Some(text) = cli.text else {
        return Err("missing text".into());
    };

    let params = ArabicInferenceParams {
        speaker: cli.speaker,
        pace: cli.pace,
        denoise: cli.denoise,
        volume: cli.volume,
        vowelizer: cli.vowelizer,
        pitch_mul: cli.pitch_mul,
        pitch_add: cli.pitch_add,
        device: cli.cuda.map_or(Device::Cpu, Device::Cuda),
        text_model: cli.model,
        vocoder: cli.vocoder,
        return_mel: false,
    };

    let mut engine = ArabicEngine::new();
    let model_dir = cli.model_dir.unwrap_or_else(default_model_root);
    let model_params = ArabicModelParams {
        preload: Some(params.pipeline_key()),
        ..Default::default()
    };
    engine.load_model_with_params(&model_dir, model_params)?;

    let start = Instant::now();
    let result = engine.synthesize(&text, Some(params))?;
    let elapsed = start.elapsed();
    println!(
        "Synthesized {:.2}s audio in {:.2?} ({:.1}x real-time)",
        result.duration_secs(),
        elapsed,
        result.duration_secs() / elapsed.as_secs_f64()
    );

    let options = WavOptions {
        bits_per_sample: cli.bits,
        normalize: false,
    };
    result.write_wav(&cli.output, options)?;
    println!("Saved to {}", cli.output.display());
    Ok(())
}

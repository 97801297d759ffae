use std::path::PathBuf;
use std::time::Instant;

use tts_arabic::{
    engines::arabic::{
        ArabicEngine, ArabicInferenceParams, ArabicModelParams, PipelineKey, VocoderId,
        VowelizerId,
    },
    SynthesisEngine, WavOptions,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut engine = ArabicEngine::new();
    let model_path = PathBuf::from("models/tts-arabic");

    let load_start = Instant::now();
    let model_params = ArabicModelParams {
        preload: Some(PipelineKey::default()),
        ..Default::default()
    };
    engine.load_model_with_params(&model_path, model_params)?;
    println!("Pipeline loaded in {:.2?}", load_start.elapsed());

    let text = "اَلسَّلامُ عَلَيكُم يَا صَدِيقِي";

    let synth_start = Instant::now();
    let result = engine.synthesize(text, None)?;
    let synth_dur = synth_start.elapsed();
    let speedup = result.duration_secs() / synth_dur.as_secs_f64();
    println!(
        "Synthesized {:.2}s audio in {:.2?} ({:.1}x real-time)",
        result.duration_secs(),
        synth_dur,
        speedup
    );
    result.write_wav(&PathBuf::from("output.wav"), WavOptions::default())?;
    println!("Saved to output.wav");

    // Undiacritized input through the vowelizer, vocoded by Vocos at 44.1 kHz.
    let params = ArabicInferenceParams::builder()
        .vowelizer(VowelizerId::Shakkelha)
        .vocoder(VocoderId::Vocos44)
        .build()?;
    println!("Vocalized: {}", engine.vocalize("مرحبا بكم", VowelizerId::Shakkelha)?);
    engine.synthesize_to_file("مرحبا بكم", &PathBuf::from("output44.wav"), Some(params))?;
    println!("Saved to output44.wav");

    engine.unload_model();
    Ok(())
}

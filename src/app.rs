//! Transcription session entry point.
//!
//! Orchestrates the complete flow: load model → start pipeline → wait for
//! Ctrl-C (or a capture failure) → stop → export transcripts.

use crate::audio::capture::{CpalFrameSource, suppress_audio_warnings};
use crate::audio::source::FrameSource;
use crate::config::Config;
use crate::error::{LavalierError, Result};
use crate::export::{parse_formats, save_transcripts};
use crate::pipeline::orchestrator::{Pipeline, PipelineConfig};
use crate::pipeline::state::SharedState;
use crate::stt::model::RecognitionModel;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Run a transcription session: capture → transcribe → export.
///
/// # Arguments
/// * `config` - Base configuration (overridden by the CLI args that follow)
/// * `device` - Optional device override
/// * `model` - Optional model path override
/// * `language` - Optional language override
/// * `no_chunking` - Disable full-chunk assembly
/// * `chunk_duration` / `overlap_duration` - Chunking overrides in seconds
/// * `output_dir` / `output_format` - Export overrides
/// * `quiet` - Suppress live output
/// * `verbosity` - Verbosity level from repeated `-v`
///
/// # Returns
/// Ok(()) on a clean session; an error if setup fails or capture dies.
#[allow(clippy::too_many_arguments)]
pub async fn run_transcribe_command(
    mut config: Config,
    device: Option<String>,
    model: Option<PathBuf>,
    language: Option<String>,
    no_chunking: bool,
    chunk_duration: Option<f64>,
    overlap_duration: Option<f64>,
    output_dir: Option<PathBuf>,
    output_format: Option<String>,
    quiet: bool,
    verbosity: u8,
) -> Result<()> {
    // Suppress noisy JACK/ALSA warnings before audio init
    suppress_audio_warnings();

    // Apply CLI overrides
    if let Some(d) = device {
        config.audio.device = Some(d);
    }
    if let Some(m) = model {
        config.model.path = m;
    }
    if let Some(l) = language {
        config.model.language = l;
    }
    if no_chunking {
        config.chunking.enabled = false;
    }
    if let Some(c) = chunk_duration {
        config.chunking.chunk_duration_secs = c;
    }
    if let Some(o) = overlap_duration {
        config.chunking.overlap_duration_secs = o;
    }
    if let Some(dir) = output_dir {
        config.output.dir = dir;
    }
    if let Some(formats) = output_format {
        config.output.formats = formats;
    }

    config.validate()?;
    // Fail on a bad format selector before any audio is captured
    let formats = parse_formats(&config.output.formats)?;

    // Load the model ONCE before capture starts (this is the slow part)
    if !quiet {
        eprintln!("Loading model '{}'...", config.model.path.display());
    }
    let load_start = Instant::now();
    let model = create_model(&config)?;
    if !quiet {
        eprintln!(
            "{}",
            format!("Model loaded in {:.2} seconds", load_start.elapsed().as_secs_f64()).green()
        );
    }

    let state = SharedState::new();
    let source: Box<dyn FrameSource> =
        Box::new(CpalFrameSource::new(config.audio.device.as_deref())?);

    let pipeline_config = PipelineConfig {
        sample_rate: config.audio.sample_rate,
        buffer_duration_secs: config.audio.buffer_duration_secs,
        chunking_enabled: config.chunking.enabled,
        chunk_duration_secs: config.chunking.chunk_duration_secs,
        overlap_duration_secs: config.chunking.overlap_duration_secs,
        queue_capacity: config.audio.queue_capacity,
        quiet,
        verbosity,
        ..Default::default()
    };

    let handle = Pipeline::new(pipeline_config).start(source, model, state)?;

    if !quiet {
        eprintln!();
        eprintln!("{}", "===== TRANSCRIPTION STARTED =====".magenta().bold());
        let device_info = config
            .audio
            .device
            .as_deref()
            .map(|d| format!(" from device: {d}"))
            .unwrap_or_default();
        eprintln!("Listening{device_info}... (Press Ctrl+C to stop)");
        eprintln!();
    }

    // Ctrl-C sets the same token a capture-fatal error would
    let interrupt = handle.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            if !quiet {
                eprintln!();
                eprintln!("{}", "Ctrl+C detected. Stopping transcription...".yellow());
            }
            interrupt.cancel();
        }
    });

    while !handle.is_cancelled() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let stopped = handle.stop();

    // Flush whatever finished before the stop signal — on every shutdown
    // path, fatal or interrupt-driven
    save_transcripts(&stopped.results, &config.output.dir, &formats, quiet)?;

    if !quiet {
        eprintln!();
        eprintln!("{}", "===== TRANSCRIPTION ENDED =====".magenta().bold());
    }

    if stopped.capture_failed {
        return Err(LavalierError::AudioCapture {
            message: "audio capture failed mid-session".to_string(),
        });
    }

    Ok(())
}

#[cfg(feature = "whisper")]
fn create_model(config: &Config) -> Result<Arc<dyn RecognitionModel>> {
    use crate::stt::whisper::{WhisperModel, WhisperModelConfig};

    Ok(Arc::new(WhisperModel::new(WhisperModelConfig {
        model_path: config.model.path.clone(),
        language: config.model.language.clone(),
        threads: config.model.threads,
    })?))
}

#[cfg(not(feature = "whisper"))]
fn create_model(_config: &Config) -> Result<Arc<dyn RecognitionModel>> {
    Err(LavalierError::Other(
        concat!(
            "This binary was built without speech recognition.\n",
            "To fix: cargo build --release (whisper is enabled by default)\n",
            "If the build fails with cmake errors, install: sudo apt install cmake"
        )
        .to_string(),
    ))
}

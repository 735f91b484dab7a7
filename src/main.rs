use anyhow::Result;
use clap::Parser;
use lavalier::app::run_transcribe_command;
use lavalier::audio::capture::list_devices;
use lavalier::cli::{Cli, Commands};
use lavalier::config::Config;
use lavalier::error::LavalierError;
use owo_colors::OwoColorize;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            let config = load_config(cli.config.as_deref())?;
            let result = run_transcribe_command(
                config,
                cli.device,
                cli.model,
                cli.language,
                cli.no_chunking,
                cli.chunk_duration,
                cli.overlap_duration,
                cli.output_dir,
                cli.output_format,
                cli.quiet,
                cli.verbose,
            )
            .await;

            if let Err(e) = result {
                match e {
                    LavalierError::AudioDeviceNotFound { .. }
                    | LavalierError::AudioCapture { .. } => {
                        eprintln!("{}", e.to_string().red());
                        eprintln!("Could not capture audio. List available input devices with:");
                        eprintln!("  {}", "lavalier devices".cyan());
                        std::process::exit(1);
                    }
                    other => return Err(other.into()),
                }
            }
        }
        Some(Commands::Devices) => {
            list_audio_devices()?;
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/lavalier/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    Ok(config.with_env_overrides())
}

/// List available audio input devices.
fn list_audio_devices() -> Result<()> {
    let devices = list_devices()?;

    if devices.is_empty() {
        eprintln!("No audio input devices found");
        std::process::exit(1);
    }

    println!("Available audio input devices:");
    for (idx, device) in devices.iter().enumerate() {
        println!("  [{}] {}", idx, device);
    }

    Ok(())
}

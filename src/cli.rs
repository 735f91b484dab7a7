//! Command-line interface for lavalier
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Real-time microphone transcription with word-level timestamps
#[derive(Parser, Debug)]
#[command(
    name = "lavalier",
    version,
    about = "Real-time microphone transcription with word-level timestamps"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress live output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: status, -vv: full diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Audio input device (leave blank to use the best default)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Path to the recognition model file
    #[arg(long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Language code for transcription (default: auto-detect). Examples: auto, en, de
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Disable chunking for continuous transcription
    #[arg(long)]
    pub no_chunking: bool,

    /// Duration of each chunk in seconds
    #[arg(long, value_name = "SECONDS")]
    pub chunk_duration: Option<f64>,

    /// Overlap between chunks in seconds (must be smaller than the chunk)
    #[arg(long, value_name = "SECONDS")]
    pub overlap_duration: Option<f64>,

    /// Directory to save transcripts
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: comma-separated subset of txt/srt/json, or "all"
    #[arg(long, value_name = "FORMATS")]
    pub output_format: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio input devices
    Devices,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_invocation() {
        let cli = Cli::try_parse_from(["lavalier"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
        assert!(cli.chunk_duration.is_none());
    }

    #[test]
    fn parses_devices_subcommand() {
        let cli = Cli::try_parse_from(["lavalier", "devices"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Devices)));
    }

    #[test]
    fn parses_chunking_flags() {
        let cli = Cli::try_parse_from([
            "lavalier",
            "--chunk-duration",
            "30",
            "--overlap-duration",
            "6.5",
            "--no-chunking",
        ])
        .unwrap();
        assert_eq!(cli.chunk_duration, Some(30.0));
        assert_eq!(cli.overlap_duration, Some(6.5));
        assert!(cli.no_chunking);
    }

    #[test]
    fn parses_output_options() {
        let cli = Cli::try_parse_from([
            "lavalier",
            "--output-dir",
            "/tmp/out",
            "--output-format",
            "txt,srt",
        ])
        .unwrap();
        assert_eq!(cli.output_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(cli.output_format.as_deref(), Some("txt,srt"));
    }

    #[test]
    fn counts_verbosity() {
        let cli = Cli::try_parse_from(["lavalier", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn rejects_malformed_duration() {
        assert!(Cli::try_parse_from(["lavalier", "--chunk-duration", "abc"]).is_err());
    }
}

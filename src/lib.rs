//! lavalier - Real-time microphone transcription with word-level timestamps
//!
//! Captures audio, assembles overlapping chunks, transcribes them with a
//! local model, and exports time-aligned transcripts.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod app;
pub mod audio;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod display;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod stt;

// Core traits (source → process → aggregate)
pub use audio::source::FrameSource;
pub use stt::model::RecognitionModel;

// Pipeline
pub use pipeline::orchestrator::{Pipeline, PipelineConfig, PipelineHandle, StoppedPipeline};
pub use pipeline::shutdown::CancellationToken;
pub use pipeline::state::SharedState;

// Aligned result types
pub use stt::model::{AlignedResult, AlignedSentence, AlignedToken};

// Error handling
pub use error::{LavalierError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_hash_is_short() {
        let ver = version_string();
        if let Some(hash) = ver.split('+').nth(1) {
            assert_eq!(hash.len(), 7, "Git hash should be 7 chars, got: {}", hash);
        } else {
            assert_eq!(ver, env!("CARGO_PKG_VERSION"));
        }
    }
}

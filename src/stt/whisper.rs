//! Whisper-based recognition backend.
//!
//! Implements [`RecognitionModel`] on top of whisper-rs, with token-level
//! timestamps enabled so results carry full time alignment.
//!
//! # Feature Gate
//!
//! This module requires the `whisper` feature (enabled by default) and cmake
//! to build.

use crate::defaults;
use crate::error::{LavalierError, Result};
use crate::stt::model::{AlignedSentence, AlignedToken, RawRecognition, RecognitionModel};
use std::path::PathBuf;
use std::sync::{Mutex, Once};
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, install_logging_hooks,
};

static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// Centiseconds (whisper's native timestamp unit) to seconds.
const TIMESTAMP_UNIT_SECS: f64 = 0.01;

/// Configuration for the whisper backend.
#[derive(Debug, Clone)]
pub struct WhisperModelConfig {
    /// Path to the GGML model file
    pub model_path: PathBuf,
    /// Language code (e.g., "en", "es"), or "auto" for detection
    pub language: String,
    /// Number of threads for inference (None = auto-detect)
    pub threads: Option<usize>,
}

impl Default for WhisperModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(defaults::DEFAULT_MODEL),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            threads: None,
        }
    }
}

/// Whisper-backed recognition model.
///
/// The WhisperContext is wrapped in a Mutex; the pipeline's single consumer
/// thread is the only caller in practice, but the trait requires Sync.
pub struct WhisperModel {
    context: Mutex<WhisperContext>,
    config: WhisperModelConfig,
    model_name: String,
}

impl std::fmt::Debug for WhisperModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperModel")
            .field("config", &self.config)
            .field("model_name", &self.model_name)
            .field("context", &"<WhisperContext>")
            .finish()
    }
}

impl WhisperModel {
    /// Load a whisper model from disk.
    ///
    /// # Errors
    /// Returns `LavalierError::ModelNotFound` if the model file doesn't exist,
    /// or `LavalierError::Recognition` if loading fails.
    pub fn new(config: WhisperModelConfig) -> Result<Self> {
        // Install logging hooks to suppress whisper.cpp output (only once)
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        if !config.model_path.exists() {
            return Err(LavalierError::ModelNotFound {
                path: config.model_path.to_string_lossy().to_string(),
            });
        }

        let model_name = config
            .model_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        let context_params = WhisperContextParameters::default();
        let context = WhisperContext::new_with_params(
            config
                .model_path
                .to_str()
                .ok_or_else(|| LavalierError::Recognition {
                    message: "Invalid UTF-8 in model path".to_string(),
                })?,
            context_params,
        )
        .map_err(|e| LavalierError::Recognition {
            message: format!("Failed to load whisper model: {}", e),
        })?;

        Ok(Self {
            context: Mutex::new(context),
            config,
            model_name,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &WhisperModelConfig {
        &self.config
    }
}

/// Whisper wraps special markers in `<|…|>` (e.g. `<|endoftext|>`) and
/// `[_…_]` (e.g. `[_BEG_]`); neither carries speech.
fn is_special_token(text: &str) -> bool {
    (text.starts_with("<|") && text.ends_with("|>"))
        || (text.starts_with("[_") && text.ends_with(']'))
}

impl RecognitionModel for WhisperModel {
    fn recognize(&self, samples: &[f32], _duration_secs: f64) -> Result<Vec<RawRecognition>> {
        let context = self.context.lock().map_err(|e| LavalierError::Recognition {
            message: format!("Failed to acquire context lock: {}", e),
        })?;

        let mut state = context
            .create_state()
            .map_err(|e| LavalierError::Recognition {
                message: format!("Failed to create whisper state: {}", e),
            })?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        if self.config.language == defaults::AUTO_LANGUAGE {
            params.set_language(None);
        } else {
            params.set_language(Some(&self.config.language));
        }

        if let Some(threads) = self.config.threads {
            params.set_n_threads(threads as i32);
        }

        // Token timestamps give us per-token t0/t1 for the aligned output
        params.set_token_timestamps(true);

        // Disable printing to stdout/stderr
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, samples)
            .map_err(|e| LavalierError::Recognition {
                message: format!("Whisper inference failed: {}", e),
            })?;

        let mut full_text = String::new();
        let mut sentences = Vec::new();

        let num_segments = state.full_n_segments();
        for i in 0..num_segments {
            let Some(segment) = state.get_segment(i) else {
                continue;
            };

            let sentence_text = segment.to_string().trim().to_string();
            if sentence_text.is_empty() {
                continue;
            }

            let start = segment.start_timestamp() as f64 * TIMESTAMP_UNIT_SECS;
            let end = segment.end_timestamp() as f64 * TIMESTAMP_UNIT_SECS;

            let mut tokens = Vec::new();
            for j in 0..segment.n_tokens() {
                let Some(token) = segment.get_token(j) else {
                    continue;
                };
                let token_text = token.to_string();
                if token_text.trim().is_empty() || is_special_token(token_text.trim()) {
                    continue;
                }
                let data = token.token_data();
                let t0 = data.t0 as f64 * TIMESTAMP_UNIT_SECS;
                let t1 = data.t1 as f64 * TIMESTAMP_UNIT_SECS;
                tokens.push(AlignedToken {
                    text: token_text,
                    start: t0,
                    end: t1,
                    duration: t1 - t0,
                });
            }

            if !full_text.is_empty() {
                full_text.push(' ');
            }
            full_text.push_str(&sentence_text);

            sentences.push(AlignedSentence {
                text: sentence_text,
                start,
                end,
                duration: end - start,
                tokens,
            });
        }

        Ok(vec![RawRecognition {
            text: Some(full_text),
            sentences,
        }])
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        true
    }
}

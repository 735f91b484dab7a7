use crate::defaults;
use crate::error::{LavalierError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub chunking: ChunkingConfig,
    pub model: ModelConfig,
    pub output: OutputConfig,
}

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub sample_rate: u32,
    /// Interim segment duration in seconds.
    pub buffer_duration_secs: f64,
    /// Ingress queue capacity in frames.
    pub queue_capacity: usize,
}

/// Chunked transcription configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    pub enabled: bool,
    pub chunk_duration_secs: f64,
    pub overlap_duration_secs: f64,
}

/// Recognition model configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub language: String,
    /// Inference threads (None = auto-detect).
    pub threads: Option<usize>,
}

/// Transcript export configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Comma-separated subset of txt/srt/json, or "all".
    pub formats: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
            buffer_duration_secs: defaults::BUFFER_DURATION_SECS,
            queue_capacity: defaults::QUEUE_CAPACITY,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chunk_duration_secs: defaults::CHUNK_DURATION_SECS,
            overlap_duration_secs: defaults::OVERLAP_DURATION_SECS,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(defaults::DEFAULT_MODEL),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            threads: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(defaults::OUTPUT_DIR),
            formats: defaults::OUTPUT_FORMATS.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing or contains invalid TOML.
    /// Missing fields use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LavalierError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                LavalierError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file, or return defaults if the file doesn't exist
    ///
    /// Only falls back to defaults when the file is missing; invalid TOML is
    /// still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(LavalierError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - LAVALIER_MODEL → model.path
    /// - LAVALIER_LANGUAGE → model.language
    /// - LAVALIER_AUDIO_DEVICE → audio.device
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("LAVALIER_MODEL")
            && !model.is_empty()
        {
            self.model.path = PathBuf::from(model);
        }

        if let Ok(language) = std::env::var("LAVALIER_LANGUAGE")
            && !language.is_empty()
        {
            self.model.language = language;
        }

        if let Ok(device) = std::env::var("LAVALIER_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        self
    }

    /// Validate cross-field constraints.
    ///
    /// The chunking invariant `0 ≤ overlap < chunk` is enforced here, before
    /// any buffer sizing happens downstream.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(LavalierError::ConfigInvalidValue {
                key: "audio.sample_rate".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.audio.buffer_duration_secs <= 0.0 {
            return Err(LavalierError::ConfigInvalidValue {
                key: "audio.buffer_duration_secs".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.audio.queue_capacity == 0 {
            return Err(LavalierError::ConfigInvalidValue {
                key: "audio.queue_capacity".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.chunking.enabled {
            if self.chunking.chunk_duration_secs <= 0.0 {
                return Err(LavalierError::ConfigInvalidValue {
                    key: "chunking.chunk_duration_secs".to_string(),
                    message: "must be positive".to_string(),
                });
            }
            if self.chunking.overlap_duration_secs < 0.0 {
                return Err(LavalierError::ConfigInvalidValue {
                    key: "chunking.overlap_duration_secs".to_string(),
                    message: "must not be negative".to_string(),
                });
            }
            if self.chunking.overlap_duration_secs >= self.chunking.chunk_duration_secs {
                return Err(LavalierError::ConfigInvalidValue {
                    key: "chunking.overlap_duration_secs".to_string(),
                    message: "must be smaller than chunk_duration_secs".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/lavalier/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lavalier")
            .join("config.toml")
    }
}

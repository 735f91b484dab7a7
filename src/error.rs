//! Error types for lavalier.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LavalierError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio capture errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    // Recognition errors
    #[error("Recognition model not found at {path}")]
    ModelNotFound { path: String },

    #[error("Recognition failed: {message}")]
    Recognition { message: String },

    // Transcript export errors
    #[error("Export failed: {message}")]
    Export { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, LavalierError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn config_invalid_value_display() {
        let error = LavalierError::ConfigInvalidValue {
            key: "chunking.overlap_duration_secs".to_string(),
            message: "must be smaller than chunk_duration_secs".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for chunking.overlap_duration_secs: \
             must be smaller than chunk_duration_secs"
        );
    }

    #[test]
    fn audio_device_not_found_display() {
        let error = LavalierError::AudioDeviceNotFound {
            device: "default".to_string(),
        };
        assert_eq!(error.to_string(), "Audio device not found: default");
    }

    #[test]
    fn audio_capture_display() {
        let error = LavalierError::AudioCapture {
            message: "buffer overrun".to_string(),
        };
        assert_eq!(error.to_string(), "Audio capture failed: buffer overrun");
    }

    #[test]
    fn model_not_found_display() {
        let error = LavalierError::ModelNotFound {
            path: "/models/ggml-base.bin".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Recognition model not found at /models/ggml-base.bin"
        );
    }

    #[test]
    fn recognition_display() {
        let error = LavalierError::Recognition {
            message: "inference failed".to_string(),
        };
        assert_eq!(error.to_string(), "Recognition failed: inference failed");
    }

    #[test]
    fn from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: LavalierError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn from_toml_error() {
        let toml_str = "invalid = toml = syntax";
        let toml_error = toml::from_str::<toml::Value>(toml_str).unwrap_err();
        let error: LavalierError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<LavalierError>();
        assert_sync::<LavalierError>();
    }

    #[test]
    fn result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }
}

//! Default configuration constants for lavalier.
//!
//! Shared across the config file, CLI defaults, and the pipeline so the
//! three never disagree about what "default" means.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and provides a good balance
/// between quality and computational efficiency for voice applications.
pub const SAMPLE_RATE: u32 = 16000;

/// Duration of an interim segment in seconds.
///
/// The short buffer emits a low-latency partial result every time this much
/// audio has accumulated.
pub const BUFFER_DURATION_SECS: f64 = 5.0;

/// Duration of a full chunk in seconds.
///
/// Full chunks are the unit of permanent transcription; longer chunks give
/// the model more context at the cost of latency.
pub const CHUNK_DURATION_SECS: f64 = 20.0;

/// Overlap carried from the end of one full chunk into the next, in seconds.
///
/// Preserves recognition context across chunk boundaries. Must be strictly
/// smaller than the chunk duration.
pub const OVERLAP_DURATION_SECS: f64 = 4.0;

/// Capacity of the ingress queue in frames.
///
/// At the ~100ms frame cadence typical of audio backends this buffers ~25s
/// of capture before frames start being dropped.
pub const QUEUE_CAPACITY: usize = 256;

/// Consumer poll timeout in milliseconds.
///
/// Bounds how long the worker can go without re-checking the stop signal.
pub const POP_TIMEOUT_MS: u64 = 500;

/// Worker join deadline in milliseconds during shutdown.
///
/// Past this the worker thread is detached rather than waited on.
pub const JOIN_TIMEOUT_MS: u64 = 2000;

/// Default GGML model path.
pub const DEFAULT_MODEL: &str = "models/ggml-base.bin";

/// Default language code for transcription.
///
/// "auto" lets the model detect the spoken language.
pub const DEFAULT_LANGUAGE: &str = "auto";

/// Language value that triggers automatic language detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// Default directory for exported transcripts.
pub const OUTPUT_DIR: &str = "transcriptions";

/// Default export format selector.
pub const OUTPUT_FORMATS: &str = "all";

/// Report the GPU backend compiled into this build.
///
/// Returns a human-readable name based on the compile-time feature flags.
/// Only one GPU backend can be active at a time; if none is enabled, returns "CPU".
pub fn gpu_backend() -> &'static str {
    if cfg!(feature = "cuda") {
        "CUDA"
    } else if cfg!(feature = "vulkan") {
        "Vulkan"
    } else if cfg!(feature = "hipblas") {
        "HipBLAS (AMD)"
    } else if cfg!(feature = "openblas") {
        "OpenBLAS"
    } else {
        "CPU"
    }
}

//! Speech recognition: the model interface, aligned result types, and the
//! whisper-rs backend.

pub mod model;
#[cfg(feature = "whisper")]
pub mod whisper;

pub use model::{
    AlignedResult, AlignedSentence, AlignedToken, MockModel, RawRecognition, RecognitionModel,
    Validated, validate_output,
};
#[cfg(feature = "whisper")]
pub use whisper::{WhisperModel, WhisperModelConfig};

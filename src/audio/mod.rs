//! Audio capture: the frame source abstraction and the cpal implementation.

pub mod capture;
pub mod source;

pub use capture::{CpalFrameSource, list_devices, suppress_audio_warnings};
pub use source::{FrameSource, ScriptedFrameSource};

//! Frame source abstraction.
//!
//! A frame source delivers mono f32 audio frames into the ingress queue on
//! its own schedule (for real hardware, the audio backend's callback thread).
//! The pipeline only sees the trait, so tests can substitute a scripted
//! source for the microphone.

use crate::error::Result;
use crate::pipeline::queue::FrameSender;
use crate::pipeline::shutdown::CancellationToken;
use crate::pipeline::types::AudioFrame;
use std::thread::JoinHandle;
use std::time::Duration;

/// A producer of audio frames.
pub trait FrameSource: Send {
    /// Begin delivering frames into `frames`.
    ///
    /// The source must observe `cancel` and stop producing promptly once it
    /// is set. A source that fails irrecoverably after starting cancels the
    /// token itself and reports it via [`had_fatal_error`](Self::had_fatal_error).
    fn start(&mut self, frames: FrameSender, cancel: CancellationToken) -> Result<()>;

    /// Stop delivering frames. Idempotent.
    fn stop(&mut self) -> Result<()>;

    /// Whether the source hit an irrecoverable failure after starting.
    fn had_fatal_error(&self) -> bool {
        false
    }
}

/// A frame source that replays a fixed script of frames, for tests.
///
/// Frames are delivered from a background thread at a configurable interval,
/// mimicking a capture callback's cadence.
pub struct ScriptedFrameSource {
    script: Vec<Vec<f32>>,
    interval: Duration,
    feeder: Option<JoinHandle<()>>,
}

impl ScriptedFrameSource {
    pub fn new(script: Vec<Vec<f32>>) -> Self {
        Self {
            script,
            interval: Duration::from_millis(1),
            feeder: None,
        }
    }

    /// Delay between delivered frames.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl FrameSource for ScriptedFrameSource {
    fn start(&mut self, frames: FrameSender, cancel: CancellationToken) -> Result<()> {
        let script = std::mem::take(&mut self.script);
        let interval = self.interval;

        self.feeder = Some(std::thread::spawn(move || {
            for (sequence, samples) in script.into_iter().enumerate() {
                if cancel.is_cancelled() {
                    break;
                }
                frames.push(AudioFrame::new(samples, sequence as u64));
                std::thread::sleep(interval);
            }
        }));

        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(feeder) = self.feeder.take()
            && feeder.join().is_err()
        {
            eprintln!("lavalier: scripted source feeder panicked");
        }
        Ok(())
    }
}

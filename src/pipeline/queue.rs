//! Ingress queue between the capture callback and the worker thread.
//!
//! Bounded single-producer/single-consumer handoff. The producer side never
//! blocks: a full queue rejects the incoming frame (drop-newest) and counts
//! the loss so the consumer can surface a warning outside the audio callback.
//! The consumer side blocks with a timeout so it can re-check the stop signal
//! on a quiet microphone.

use crate::pipeline::types::AudioFrame;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Result of a non-blocking push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Accepted,
    /// Queue full or consumer gone; the frame was discarded.
    Dropped,
}

/// Result of a blocking pop with timeout.
///
/// A timeout is a routine, expected condition — not an error — so it gets its
/// own variant instead of error-handling machinery.
#[derive(Debug)]
pub enum Poll {
    Frame(AudioFrame),
    TimedOut,
    /// Producer side has been dropped and the queue is drained.
    Closed,
}

/// Producer handle. Cheap to clone; safe to call from the audio callback.
#[derive(Clone)]
pub struct FrameSender {
    tx: Sender<AudioFrame>,
    dropped: Arc<AtomicU64>,
}

impl FrameSender {
    /// Enqueue a frame without blocking.
    ///
    /// Never blocks the caller; on a full queue the frame is discarded and the
    /// drop counter advances.
    pub fn push(&self, frame: AudioFrame) -> PushOutcome {
        match self.tx.try_send(frame) {
            Ok(()) => PushOutcome::Accepted,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                PushOutcome::Dropped
            }
        }
    }
}

/// Consumer handle.
pub struct FrameReceiver {
    rx: Receiver<AudioFrame>,
    dropped: Arc<AtomicU64>,
    reported: u64,
}

impl FrameReceiver {
    /// Wait up to `timeout` for the next frame.
    pub fn pop(&self, timeout: Duration) -> Poll {
        match self.rx.recv_timeout(timeout) {
            Ok(frame) => Poll::Frame(frame),
            Err(RecvTimeoutError::Timeout) => Poll::TimedOut,
            Err(RecvTimeoutError::Disconnected) => Poll::Closed,
        }
    }

    /// Frames dropped by the producer since the last call.
    ///
    /// The capture callback must never print; the worker calls this after each
    /// poll and surfaces the warning itself.
    pub fn newly_dropped(&mut self) -> u64 {
        let total = self.dropped.load(Ordering::Relaxed);
        let new = total - self.reported;
        self.reported = total;
        new
    }
}

/// Create a bounded frame queue.
pub fn frame_queue(capacity: usize) -> (FrameSender, FrameReceiver) {
    let (tx, rx) = bounded(capacity);
    let dropped = Arc::new(AtomicU64::new(0));
    (
        FrameSender {
            tx,
            dropped: Arc::clone(&dropped),
        },
        FrameReceiver {
            rx,
            dropped,
            reported: 0,
        },
    )
}

//! Cooperative shutdown signalling.
//!
//! One [`CancellationToken`] is created per pipeline and handed to both the
//! producer (capture callback) and the consumer (worker loop). Cancelling is
//! the only write; both sides poll it at iteration boundaries — after a queue
//! pop, after a frame is processed. It is never reset.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A set-once stop signal shared by all pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a new, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal all observers to stop. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

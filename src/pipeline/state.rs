//! Shared transcription state.
//!
//! One `Mutex<TranscriptionState>` per session, constructed at startup and
//! cloned into the worker and the composition root — the lock and the state it
//! guards travel together. Critical sections are short (append + field
//! update) so display reads never stall the worker.

use crate::stt::model::AlignedResult;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Aggregated results of a transcription session.
#[derive(Debug, Default)]
pub struct TranscriptionState {
    /// Finalized full-chunk results, in temporal order. Append-only until the
    /// shutdown flush drains it.
    pub results: Vec<AlignedResult>,
    /// Most recent display text (interim or final).
    pub latest_text: String,
    /// Number of full chunks processed.
    pub chunks_processed: u64,
    /// When the state last changed.
    pub last_update: Option<Instant>,
}

/// Thread-safe handle to the session state.
///
/// Written by the transcription worker; read by the display/export side.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<Mutex<TranscriptionState>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finalized full-chunk result.
    ///
    /// The result is always retained; `latest_text` only changes when the
    /// result actually carries text, so a silent chunk doesn't blank the
    /// display.
    pub fn record_final(&self, result: AlignedResult) {
        let mut state = self.lock();
        if !result.text.is_empty() {
            state.latest_text = result.text.clone();
        }
        state.results.push(result);
        state.chunks_processed += 1;
        state.last_update = Some(Instant::now());
    }

    /// Record an interim result. Updates the display text only; nothing is
    /// retained.
    pub fn record_interim(&self, result: &AlignedResult) {
        let mut state = self.lock();
        if !result.text.is_empty() {
            state.latest_text = result.text.clone();
        }
        state.last_update = Some(Instant::now());
    }

    /// Most recent display text.
    pub fn latest_text(&self) -> String {
        self.lock().latest_text.clone()
    }

    /// Number of full chunks processed so far.
    pub fn chunks_processed(&self) -> u64 {
        self.lock().chunks_processed
    }

    /// Drain the finalized results for export.
    ///
    /// Draining (rather than cloning) is what makes the shutdown flush
    /// exactly-once: a second call returns nothing.
    pub fn take_results(&self) -> Vec<AlignedResult> {
        std::mem::take(&mut self.lock().results)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TranscriptionState> {
        // A panicked writer leaves the state consistent enough to flush
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

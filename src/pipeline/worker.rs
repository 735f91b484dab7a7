//! Transcription worker: the pipeline's single consumer thread.
//!
//! Pops frames from the ingress queue, runs them through the chunk assembler,
//! normalizes each emitted block, invokes the recognition model, validates its
//! output, and records results in the shared state. Everything downstream of
//! the queue is sequential — results append in temporal order by construction,
//! and model calls never overlap.
//!
//! Failures of a single block (inference error, malformed output) are logged
//! and skipped; a dropped block must not halt the stream. Cancellation is
//! checked at iteration boundaries only, so an in-flight block always finishes.

use crate::defaults;
use crate::display::ResultDisplay;
use crate::pipeline::assembler::ChunkAssembler;
use crate::pipeline::queue::{FrameReceiver, Poll};
use crate::pipeline::shutdown::CancellationToken;
use crate::pipeline::state::SharedState;
use crate::pipeline::types::{BlockKind, NormalizedBlock, SampleBlock};
use crate::stt::model::{RecognitionModel, Validated, validate_output};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct TranscriptionWorker {
    assembler: ChunkAssembler,
    model: Arc<dyn RecognitionModel>,
    state: SharedState,
    frames: FrameReceiver,
    cancel: CancellationToken,
    display: ResultDisplay,
    pop_timeout: Duration,
    verbosity: u8,
}

impl TranscriptionWorker {
    pub fn new(
        assembler: ChunkAssembler,
        model: Arc<dyn RecognitionModel>,
        state: SharedState,
        frames: FrameReceiver,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            assembler,
            model,
            state,
            frames,
            cancel,
            display: ResultDisplay::new(true),
            pop_timeout: Duration::from_millis(defaults::POP_TIMEOUT_MS),
            verbosity: 0,
        }
    }

    /// Enable live terminal output.
    pub fn with_display(mut self, quiet: bool) -> Self {
        self.display = ResultDisplay::new(quiet);
        self
    }

    /// Override the queue poll timeout (also the stop-signal check interval).
    pub fn with_pop_timeout(mut self, timeout: Duration) -> Self {
        self.pop_timeout = timeout;
        self
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Consume frames until cancelled or the producer disappears.
    pub fn run(mut self) {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            match self.frames.pop(self.pop_timeout) {
                Poll::Frame(frame) => {
                    for block in self.assembler.push_frame(&frame) {
                        self.process_block(block);
                    }
                }
                // Quiet microphone; loop around to re-check the stop signal
                Poll::TimedOut => {}
                Poll::Closed => break,
            }

            let dropped = self.frames.newly_dropped();
            if dropped > 0 {
                eprintln!("lavalier: ingress queue full, dropped {dropped} frame(s)");
            }
        }
    }

    fn process_block(&mut self, block: SampleBlock) {
        let kind = block.kind;
        let start_offset = block.start_offset;
        let normalized = NormalizedBlock::from_block(&block);

        let started = Instant::now();
        let raw = match self
            .model
            .recognize(&normalized.samples, normalized.duration_secs)
        {
            Ok(raw) => raw,
            Err(e) => {
                eprintln!("lavalier: recognition failed, skipping block: {e}");
                return;
            }
        };

        let mut result = match validate_output(raw) {
            Validated::Valid(result) => result,
            Validated::Malformed(reason) => {
                eprintln!("lavalier: unexpected model output, skipping block: {reason}");
                return;
            }
        };

        // Real-time factor: wall time per second of audio
        let rtf = started.elapsed().as_secs_f64() / normalized.duration_secs;
        if self.verbosity >= 2 {
            eprintln!(
                "lavalier: processed {:.1}s block in {:.2}s (RTF {:.2}x)",
                normalized.duration_secs,
                started.elapsed().as_secs_f64(),
                rtf
            );
        }

        // Model timestamps are block-relative; re-base to session time
        result.shift_by(start_offset);

        match kind {
            BlockKind::Full => {
                self.display.show(&result, rtf, true);
                self.state.record_final(result);
            }
            BlockKind::Interim => {
                self.display.show(&result, rtf, false);
                self.state.record_interim(&result);
            }
        }
    }
}

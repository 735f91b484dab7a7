//! Pipeline composition: wires the frame source, ingress queue, worker, and
//! shared state together, and coordinates shutdown.
//!
//! Lifecycle: RUNNING until the cancellation token is set (Ctrl-C or a
//! capture-fatal error), STOPPING while the worker finishes its in-flight
//! block, STOPPED once the worker has joined — at which point the aggregated
//! results are drained exactly once for export.

use crate::audio::source::FrameSource;
use crate::defaults;
use crate::error::Result;
use crate::pipeline::assembler::{AssemblerConfig, ChunkAssembler};
use crate::pipeline::queue::frame_queue;
use crate::pipeline::shutdown::CancellationToken;
use crate::pipeline::state::SharedState;
use crate::pipeline::worker::TranscriptionWorker;
use crate::stt::model::{AlignedResult, RecognitionModel};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub sample_rate: u32,
    /// Interim segment duration in seconds.
    pub buffer_duration_secs: f64,
    pub chunking_enabled: bool,
    pub chunk_duration_secs: f64,
    pub overlap_duration_secs: f64,
    /// Ingress queue capacity in frames.
    pub queue_capacity: usize,
    /// Worker poll timeout (stop-signal check interval).
    pub pop_timeout: Duration,
    /// Worker join deadline during shutdown.
    pub join_timeout: Duration,
    /// Suppress live terminal output.
    pub quiet: bool,
    /// Verbosity level (0=results, 2=full diagnostics).
    pub verbosity: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            buffer_duration_secs: defaults::BUFFER_DURATION_SECS,
            chunking_enabled: true,
            chunk_duration_secs: defaults::CHUNK_DURATION_SECS,
            overlap_duration_secs: defaults::OVERLAP_DURATION_SECS,
            queue_capacity: defaults::QUEUE_CAPACITY,
            pop_timeout: Duration::from_millis(defaults::POP_TIMEOUT_MS),
            join_timeout: Duration::from_millis(defaults::JOIN_TIMEOUT_MS),
            quiet: false,
            verbosity: 0,
        }
    }
}

/// Everything a finished session hands back.
#[derive(Debug)]
pub struct StoppedPipeline {
    /// Finalized results, drained from the shared state exactly once.
    pub results: Vec<AlignedResult>,
    /// Whether capture failed irrecoverably while running.
    pub capture_failed: bool,
}

/// Handle to a running pipeline.
pub struct PipelineHandle {
    cancel: CancellationToken,
    source: Box<dyn FrameSource>,
    worker: Option<JoinHandle<()>>,
    state: SharedState,
    join_timeout: Duration,
}

impl PipelineHandle {
    /// The pipeline's stop signal, for external triggers (Ctrl-C handler).
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Returns true once shutdown has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop the pipeline and drain its results.
    ///
    /// Cancels the token, stops the frame source, then waits for the worker
    /// up to the join deadline. Past the deadline the worker is detached with
    /// a warning — shutdown never hangs. Consuming `self` is what makes the
    /// flush exactly-once.
    pub fn stop(mut self) -> StoppedPipeline {
        self.cancel.cancel();

        if let Err(e) = self.source.stop() {
            eprintln!("lavalier: failed to stop audio source: {e}");
        }

        if let Some(handle) = self.worker.take() {
            let deadline = Instant::now() + self.join_timeout;
            let poll_interval = Duration::from_millis(50);
            let mut handle = Some(handle);

            loop {
                if handle.as_ref().is_some_and(|h| h.is_finished()) {
                    if let Some(h) = handle.take()
                        && let Err(panic_info) = h.join()
                    {
                        let msg = panic_info
                            .downcast_ref::<&str>()
                            .copied()
                            .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                            .unwrap_or("unknown panic");
                        eprintln!("lavalier: worker thread panicked: {msg}");
                    }
                    break;
                }

                if Instant::now() >= deadline {
                    eprintln!("lavalier: shutdown timeout — worker still running, detaching");
                    // Dropping the JoinHandle detaches the thread; it dies
                    // with the process.
                    break;
                }

                thread::sleep(poll_interval);
            }
        }

        StoppedPipeline {
            results: self.state.take_results(),
            capture_failed: self.source.had_fatal_error(),
        }
    }
}

/// Transcription pipeline: FrameSource → queue → assembler → worker → state.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Start capturing and transcribing.
    ///
    /// # Arguments
    /// * `source` - Audio frame source
    /// * `model` - Recognition model
    /// * `state` - Shared session state (also readable by the caller)
    ///
    /// # Returns
    /// A handle to stop the pipeline, or an error if the assembler
    /// configuration is invalid or the source cannot start.
    pub fn start(
        self,
        mut source: Box<dyn FrameSource>,
        model: Arc<dyn RecognitionModel>,
        state: SharedState,
    ) -> Result<PipelineHandle> {
        let assembler = ChunkAssembler::new(AssemblerConfig {
            sample_rate: self.config.sample_rate,
            buffer_duration_secs: self.config.buffer_duration_secs,
            chunking_enabled: self.config.chunking_enabled,
            chunk_duration_secs: self.config.chunk_duration_secs,
            overlap_duration_secs: self.config.overlap_duration_secs,
        })?;

        let cancel = CancellationToken::new();
        let (frame_tx, frame_rx) = frame_queue(self.config.queue_capacity);

        let worker = TranscriptionWorker::new(
            assembler,
            model,
            state.clone(),
            frame_rx,
            cancel.clone(),
        )
        .with_display(self.config.quiet)
        .with_pop_timeout(self.config.pop_timeout)
        .with_verbosity(self.config.verbosity);

        let worker_handle = thread::spawn(move || worker.run());

        if let Err(e) = source.start(frame_tx, cancel.clone()) {
            // Capture never came up; unwind the worker and report
            cancel.cancel();
            if worker_handle.join().is_err() {
                eprintln!("lavalier: worker thread panicked during startup");
            }
            return Err(e);
        }

        Ok(PipelineHandle {
            cancel,
            source,
            worker: Some(worker_handle),
            state,
            join_timeout: self.config.join_timeout,
        })
    }
}

//! Real-time transcription pipeline.
//!
//! A single-producer/single-consumer design: the capture callback pushes
//! frames into a bounded queue; one worker thread assembles chunks, runs the
//! recognition model, and aggregates results. Shutdown is cooperative via a
//! shared cancellation token.

pub mod assembler;
pub mod orchestrator;
pub mod queue;
pub mod shutdown;
pub mod state;
pub mod types;
pub mod worker;

pub use assembler::{AssemblerConfig, ChunkAssembler};
pub use orchestrator::{Pipeline, PipelineConfig, PipelineHandle, StoppedPipeline};
pub use queue::{FrameReceiver, FrameSender, Poll, PushOutcome, frame_queue};
pub use shutdown::CancellationToken;
pub use state::{SharedState, TranscriptionState};
pub use types::{AudioFrame, BlockKind, NormalizedBlock, SampleBlock};
pub use worker::TranscriptionWorker;

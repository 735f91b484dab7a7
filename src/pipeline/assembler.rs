//! Chunk assembler: turns an unbounded stream of arbitrary-length frames into
//! fixed-size, overlap-aware sample blocks.
//!
//! Two independent accumulators run side by side:
//! - the short buffer emits interim segments for low-latency partial output,
//! - the long buffer emits full chunks, retaining a trailing overlap as carry
//!   so the recognizer keeps context across chunk boundaries.
//!
//! Owned exclusively by the worker thread; never shared.

use crate::defaults;
use crate::error::{LavalierError, Result};
use crate::pipeline::types::{AudioFrame, BlockKind, SampleBlock};

/// Configuration for the chunk assembler.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Sample rate for size calculations.
    pub sample_rate: u32,
    /// Interim segment duration in seconds.
    pub buffer_duration_secs: f64,
    /// Whether full-chunk assembly runs at all.
    pub chunking_enabled: bool,
    /// Full chunk duration in seconds.
    pub chunk_duration_secs: f64,
    /// Overlap retained between consecutive full chunks, in seconds.
    pub overlap_duration_secs: f64,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            buffer_duration_secs: defaults::BUFFER_DURATION_SECS,
            chunking_enabled: true,
            chunk_duration_secs: defaults::CHUNK_DURATION_SECS,
            overlap_duration_secs: defaults::OVERLAP_DURATION_SECS,
        }
    }
}

/// Accumulates frames and slices them into interim and full blocks.
pub struct ChunkAssembler {
    short_buffer: Vec<f32>,
    long_buffer: Vec<f32>,
    /// Interim segment size in samples.
    buffer_size: usize,
    /// Full chunk size in samples (0 when chunking is disabled).
    chunk_size: usize,
    /// Carry size in samples.
    overlap_size: usize,
    chunking_enabled: bool,
    sample_rate: u32,
    /// Session-audio position (in samples) of the next interim segment.
    interim_start: u64,
    /// Session-audio position (in samples) of the next full chunk.
    full_start: u64,
    full_chunks_emitted: u64,
}

impl ChunkAssembler {
    /// Creates an assembler, deriving buffer sizes from durations.
    ///
    /// # Errors
    /// Rejects `overlap ≥ chunk` and non-positive sizes — the invariant must
    /// hold before any audio flows.
    pub fn new(config: AssemblerConfig) -> Result<Self> {
        let buffer_size = (config.buffer_duration_secs * config.sample_rate as f64) as usize;
        if buffer_size == 0 {
            return Err(LavalierError::ConfigInvalidValue {
                key: "audio.buffer_duration_secs".to_string(),
                message: "must cover at least one sample".to_string(),
            });
        }

        let (chunk_size, overlap_size) = if config.chunking_enabled {
            let chunk = (config.chunk_duration_secs * config.sample_rate as f64) as usize;
            let overlap = (config.overlap_duration_secs * config.sample_rate as f64) as usize;
            if chunk == 0 {
                return Err(LavalierError::ConfigInvalidValue {
                    key: "chunking.chunk_duration_secs".to_string(),
                    message: "must cover at least one sample".to_string(),
                });
            }
            if overlap >= chunk {
                return Err(LavalierError::ConfigInvalidValue {
                    key: "chunking.overlap_duration_secs".to_string(),
                    message: "must be smaller than chunk_duration_secs".to_string(),
                });
            }
            (chunk, overlap)
        } else {
            (0, 0)
        };

        Ok(Self {
            short_buffer: Vec::new(),
            long_buffer: Vec::new(),
            buffer_size,
            chunk_size,
            overlap_size,
            chunking_enabled: config.chunking_enabled,
            sample_rate: config.sample_rate,
            interim_start: 0,
            full_start: 0,
            full_chunks_emitted: 0,
        })
    }

    /// Feed one frame; returns the blocks it completed.
    ///
    /// Usually zero or one, occasionally two when both buffers cross their
    /// thresholds in the same update. Full chunks come first in the list.
    pub fn push_frame(&mut self, frame: &AudioFrame) -> Vec<SampleBlock> {
        self.short_buffer.extend_from_slice(&frame.samples);
        if self.chunking_enabled {
            self.long_buffer.extend_from_slice(&frame.samples);
        }

        let mut blocks = Vec::new();

        while self.chunking_enabled && self.long_buffer.len() >= self.chunk_size {
            let samples = self.long_buffer[..self.chunk_size].to_vec();
            // Keep the trailing overlap as carry for the next chunk
            let consumed = self.chunk_size - self.overlap_size;
            self.long_buffer.drain(..consumed);

            blocks.push(SampleBlock {
                kind: BlockKind::Full,
                samples,
                start_offset: self.full_start as f64 / self.sample_rate as f64,
                sample_rate: self.sample_rate,
            });
            self.full_start += consumed as u64;
            self.full_chunks_emitted += 1;
        }

        while self.short_buffer.len() >= self.buffer_size {
            let samples = self.short_buffer[..self.buffer_size].to_vec();
            self.short_buffer.drain(..self.buffer_size);

            blocks.push(SampleBlock {
                kind: BlockKind::Interim,
                samples,
                start_offset: self.interim_start as f64 / self.sample_rate as f64,
                sample_rate: self.sample_rate,
            });
            self.interim_start += self.buffer_size as u64;
        }

        blocks
    }

    /// Samples currently held in the short buffer.
    pub fn short_len(&self) -> usize {
        self.short_buffer.len()
    }

    /// Samples currently held in the long buffer (carry included).
    pub fn long_len(&self) -> usize {
        self.long_buffer.len()
    }

    /// Full chunks emitted so far.
    pub fn full_chunks_emitted(&self) -> u64 {
        self.full_chunks_emitted
    }
}

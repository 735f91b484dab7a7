//! Data types flowing through the transcription pipeline.

/// A block of captured audio samples with arrival order.
///
/// Produced by the frame source callback, consumed exactly once by the chunk
/// assembler. Samples are mono f32 at the pipeline sample rate; never mutated
/// after creation.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Mono samples at the pipeline sample rate.
    pub samples: Vec<f32>,
    /// Sequence number for ordering and gap detection.
    pub sequence: u64,
}

impl AudioFrame {
    /// Creates a new audio frame.
    pub fn new(samples: Vec<f32>, sequence: u64) -> Self {
        Self { samples, sequence }
    }
}

/// Whether an emitted block is a low-latency interim segment or a full
/// overlap-aware chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Short, non-overlapping window; result updates the display only.
    Interim,
    /// Full chunk with trailing overlap; result is retained permanently.
    Full,
}

/// A fixed-size block of samples sliced off by the chunk assembler, ready for
/// normalization and recognition.
#[derive(Debug, Clone)]
pub struct SampleBlock {
    pub kind: BlockKind,
    pub samples: Vec<f32>,
    /// Session-audio offset of the first sample, in seconds. Used to re-base
    /// the model's block-relative timestamps.
    pub start_offset: f64,
    pub sample_rate: u32,
}

impl SampleBlock {
    /// Duration of this block in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// A sample block normalized for the recognition model: mono f32, every value
/// clipped to [-1.0, 1.0].
#[derive(Debug, Clone)]
pub struct NormalizedBlock {
    pub samples: Vec<f32>,
    pub duration_secs: f64,
}

impl NormalizedBlock {
    /// Normalize a sample block for recognition.
    pub fn from_block(block: &SampleBlock) -> Self {
        Self {
            samples: block.samples.iter().map(|s| s.clamp(-1.0, 1.0)).collect(),
            duration_secs: block.duration_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_frame_creation() {
        let frame = AudioFrame::new(vec![0.1, 0.2, 0.3], 42);
        assert_eq!(frame.samples.len(), 3);
        assert_eq!(frame.sequence, 42);
    }

    #[test]
    fn block_duration_uses_sample_rate() {
        let block = SampleBlock {
            kind: BlockKind::Full,
            samples: vec![0.0; 32000],
            start_offset: 0.0,
            sample_rate: 16000,
        };
        assert_eq!(block.duration_secs(), 2.0);
    }

    #[test]
    fn normalization_clips_to_unit_range() {
        let block = SampleBlock {
            kind: BlockKind::Interim,
            samples: vec![-2.5, -1.0, -0.5, 0.0, 0.5, 1.0, 3.7],
            start_offset: 0.0,
            sample_rate: 16000,
        };

        let normalized = NormalizedBlock::from_block(&block);

        assert!(normalized.samples.iter().all(|&s| (-1.0..=1.0).contains(&s)));
        assert_eq!(normalized.samples[0], -1.0);
        assert_eq!(normalized.samples[6], 1.0);
        // In-range values are untouched
        assert_eq!(normalized.samples[2], -0.5);
        assert_eq!(normalized.samples[4], 0.5);
    }

    #[test]
    fn normalization_preserves_duration() {
        let block = SampleBlock {
            kind: BlockKind::Full,
            samples: vec![0.0; 16000],
            start_offset: 10.0,
            sample_rate: 16000,
        };
        let normalized = NormalizedBlock::from_block(&block);
        assert_eq!(normalized.duration_secs, 1.0);
    }
}

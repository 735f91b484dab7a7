//! Recognition model interface and time-aligned result types.

use crate::error::{LavalierError, Result};
use serde::Serialize;
use std::sync::Arc;

/// A single recognized token with its time alignment.
///
/// Times are seconds, relative to whatever audio the model was given; the
/// worker re-bases them to session time before aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedToken {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
}

/// A recognized sentence with its tokens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedSentence {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub tokens: Vec<AlignedToken>,
}

/// A validated recognition result for one audio block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedResult {
    pub text: String,
    pub sentences: Vec<AlignedSentence>,
}

impl AlignedResult {
    /// Shift all sentence and token timestamps by `offset` seconds.
    ///
    /// Durations are unaffected.
    pub fn shift_by(&mut self, offset: f64) {
        for sentence in &mut self.sentences {
            sentence.start += offset;
            sentence.end += offset;
            for token in &mut sentence.tokens {
                token.start += offset;
                token.end += offset;
            }
        }
    }
}

/// Raw, unvalidated output of the recognition collaborator.
///
/// The collaborator is not trusted to always produce a usable shape: text may
/// be absent. Nothing downstream touches a `RawRecognition` directly; it goes
/// through [`validate_output`] first.
#[derive(Debug, Clone, Default)]
pub struct RawRecognition {
    pub text: Option<String>,
    pub sentences: Vec<AlignedSentence>,
}

/// Outcome of validating the collaborator's raw output.
#[derive(Debug, Clone)]
pub enum Validated {
    Valid(AlignedResult),
    Malformed(String),
}

/// Convert the collaborator's raw output into a tagged outcome.
///
/// The model may return several results for one block; the first is taken,
/// since one block is expected to align to one result. A missing first
/// element or a first element without text is malformed.
pub fn validate_output(raw: Vec<RawRecognition>) -> Validated {
    let Some(first) = raw.into_iter().next() else {
        return Validated::Malformed("model returned no results".to_string());
    };
    match first.text {
        Some(text) => Validated::Valid(AlignedResult {
            text,
            sentences: first.sentences,
        }),
        None => Validated::Malformed("model result has no text field".to_string()),
    }
}

/// Trait for speech recognition backends.
///
/// This trait allows swapping implementations (real whisper vs mock).
pub trait RecognitionModel: Send + Sync {
    /// Recognize one block of audio.
    ///
    /// # Arguments
    /// * `samples` - Normalized mono f32 samples in [-1.0, 1.0] at the
    ///   configured sample rate
    /// * `duration_secs` - Declared source duration of the block
    ///
    /// # Returns
    /// The collaborator's raw output (validated separately), or an error if
    /// inference itself failed.
    fn recognize(&self, samples: &[f32], duration_secs: f64) -> Result<Vec<RawRecognition>>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;

    /// Check if the model is ready
    fn is_ready(&self) -> bool;
}

/// Implement RecognitionModel for Arc<T> to allow sharing across threads.
impl<T: RecognitionModel> RecognitionModel for Arc<T> {
    fn recognize(&self, samples: &[f32], duration_secs: f64) -> Result<Vec<RawRecognition>> {
        (**self).recognize(samples, duration_secs)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// What the mock returns on each call.
#[derive(Debug, Clone)]
enum MockBehavior {
    Respond(String),
    MissingText,
    EmptyOutput,
    Fail,
}

/// Mock recognition model for testing
#[derive(Debug, Clone)]
pub struct MockModel {
    model_name: String,
    behavior: MockBehavior,
}

impl MockModel {
    /// Create a new mock that recognizes everything as a fixed phrase
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            behavior: MockBehavior::Respond("mock transcription".to_string()),
        }
    }

    /// Configure the mock to return a specific text
    pub fn with_response(mut self, response: &str) -> Self {
        self.behavior = MockBehavior::Respond(response.to_string());
        self
    }

    /// Configure the mock to return a result without a text field
    pub fn with_missing_text(mut self) -> Self {
        self.behavior = MockBehavior::MissingText;
        self
    }

    /// Configure the mock to return an empty result sequence
    pub fn with_empty_output(mut self) -> Self {
        self.behavior = MockBehavior::EmptyOutput;
        self
    }

    /// Configure the mock to fail on recognize
    pub fn with_failure(mut self) -> Self {
        self.behavior = MockBehavior::Fail;
        self
    }
}

impl RecognitionModel for MockModel {
    fn recognize(&self, _samples: &[f32], duration_secs: f64) -> Result<Vec<RawRecognition>> {
        match &self.behavior {
            MockBehavior::Respond(text) => Ok(vec![RawRecognition {
                text: Some(text.clone()),
                sentences: vec![AlignedSentence {
                    text: text.clone(),
                    start: 0.0,
                    end: duration_secs,
                    duration: duration_secs,
                    tokens: text
                        .split_whitespace()
                        .map(|word| AlignedToken {
                            text: word.to_string(),
                            start: 0.0,
                            end: duration_secs,
                            duration: duration_secs,
                        })
                        .collect(),
                }],
            }]),
            MockBehavior::MissingText => Ok(vec![RawRecognition {
                text: None,
                sentences: Vec::new(),
            }]),
            MockBehavior::EmptyOutput => Ok(Vec::new()),
            MockBehavior::Fail => Err(LavalierError::Recognition {
                message: "mock recognition failure".to_string(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        !matches!(self.behavior, MockBehavior::Fail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_model_returns_response() {
        let model = MockModel::new("test-model").with_response("Hello, this is a test");

        let audio = vec![0.0f32; 1000];
        let raw = model.recognize(&audio, 5.0).unwrap();

        match validate_output(raw) {
            Validated::Valid(result) => {
                assert_eq!(result.text, "Hello, this is a test");
                assert_eq!(result.sentences.len(), 1);
                assert_eq!(result.sentences[0].tokens.len(), 5);
            }
            Validated::Malformed(reason) => panic!("Expected valid result, got: {}", reason),
        }
    }

    #[test]
    fn mock_model_returns_error_when_configured() {
        let model = MockModel::new("test-model").with_failure();

        let result = model.recognize(&[0.0f32; 10], 1.0);
        assert!(matches!(result, Err(LavalierError::Recognition { .. })));
        assert!(!model.is_ready());
    }

    #[test]
    fn validate_flags_missing_text() {
        let model = MockModel::new("test-model").with_missing_text();
        let raw = model.recognize(&[0.0f32; 10], 1.0).unwrap();

        match validate_output(raw) {
            Validated::Malformed(reason) => assert!(reason.contains("no text")),
            Validated::Valid(_) => panic!("Expected malformed"),
        }
    }

    #[test]
    fn validate_flags_empty_output() {
        let model = MockModel::new("test-model").with_empty_output();
        let raw = model.recognize(&[0.0f32; 10], 1.0).unwrap();

        match validate_output(raw) {
            Validated::Malformed(reason) => assert!(reason.contains("no results")),
            Validated::Valid(_) => panic!("Expected malformed"),
        }
    }

    #[test]
    fn validate_takes_first_of_several_results() {
        let raw = vec![
            RawRecognition {
                text: Some("first".to_string()),
                sentences: Vec::new(),
            },
            RawRecognition {
                text: Some("second".to_string()),
                sentences: Vec::new(),
            },
        ];

        match validate_output(raw) {
            Validated::Valid(result) => assert_eq!(result.text, "first"),
            Validated::Malformed(reason) => panic!("Expected valid, got: {}", reason),
        }
    }

    #[test]
    fn shift_by_moves_sentence_and_token_times() {
        let mut result = AlignedResult {
            text: "hi there".to_string(),
            sentences: vec![AlignedSentence {
                text: "hi there".to_string(),
                start: 1.0,
                end: 2.5,
                duration: 1.5,
                tokens: vec![AlignedToken {
                    text: "hi".to_string(),
                    start: 1.0,
                    end: 1.5,
                    duration: 0.5,
                }],
            }],
        };

        result.shift_by(16.0);

        assert_eq!(result.sentences[0].start, 17.0);
        assert_eq!(result.sentences[0].end, 18.5);
        assert_eq!(result.sentences[0].duration, 1.5);
        assert_eq!(result.sentences[0].tokens[0].start, 17.0);
        assert_eq!(result.sentences[0].tokens[0].end, 17.5);
        assert_eq!(result.sentences[0].tokens[0].duration, 0.5);
    }

    #[test]
    fn aligned_result_serializes_in_declared_field_order() {
        let result = AlignedResult {
            text: "hi".to_string(),
            sentences: vec![AlignedSentence {
                text: "hi".to_string(),
                start: 0.0,
                end: 1.0,
                duration: 1.0,
                tokens: vec![AlignedToken {
                    text: "hi".to_string(),
                    start: 0.0,
                    end: 1.0,
                    duration: 1.0,
                }],
            }],
        };

        let json = serde_json::to_string(&result).unwrap();
        let text_pos = json.find("\"text\"").unwrap();
        let sentences_pos = json.find("\"sentences\"").unwrap();
        assert!(text_pos < sentences_pos);
        assert!(json.contains("\"tokens\""));
    }

    #[test]
    fn model_trait_is_object_safe() {
        let model: Box<dyn RecognitionModel> =
            Box::new(MockModel::new("test-model").with_response("boxed test"));

        assert_eq!(model.model_name(), "test-model");
        assert!(model.is_ready());
        assert!(model.recognize(&[0.0f32; 100], 1.0).is_ok());
    }

    #[test]
    fn arc_model_shares_across_threads() {
        let model = Arc::new(MockModel::new("shared"));
        let clone = Arc::clone(&model);

        let handle = std::thread::spawn(move || clone.recognize(&[0.0f32; 10], 1.0).is_ok());
        assert!(handle.join().unwrap());
        assert_eq!(model.model_name(), "shared");
    }
}

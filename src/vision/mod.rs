//! Text Recognition Layer
//!
//! Boundary to the external text-recognition engine. The engine turns one
//! frame into an ordered list of text lines; everything after that is
//! handled by `analysis`.

pub mod replay;

use thiserror::Error;

use crate::capture::frame::Frame;

pub use replay::{ReplayRecognizer, Transcript};

/// One line of text returned by the recognition engine.
///
/// Lines only live for the processing of the frame that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedLine {
    /// Recognized text content
    pub text: String,
}

impl RecognizedLine {
    /// Create a line from recognized text
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl From<&str> for RecognizedLine {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Per-frame recognition failure
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("recognition engine failed: {0}")]
    Engine(String),
}

/// Common interface for text recognition engines
pub trait TextRecognizer: Send + Sync {
    /// Engine name for logging
    fn name(&self) -> &'static str;

    /// Recognize the text lines in one frame, in engine reading order
    fn recognize(&self, frame: &Frame) -> Result<Vec<RecognizedLine>, RecognitionError>;
}

/// Recognizer that never finds any text
#[derive(Debug, Default)]
pub struct NoopRecognizer;

impl TextRecognizer for NoopRecognizer {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn recognize(&self, _: &Frame) -> Result<Vec<RecognizedLine>, RecognitionError> {
        Ok(Vec::new())
    }
}

//! Error types for the quiz assistant.
//!
//! Only a lost target window is fatal to a session. Everything else is
//! perception or delivery noise that the polling loop absorbs and retries.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for capture, recognition, matching and input operations.
#[derive(Error, Debug)]
pub enum QuizError {
    /// No top-level window title contains the requested substring.
    #[error("未找到{title}窗口")]
    WindowNotFound { title: String },

    /// The handle no longer refers to a live window.
    #[error("invalid window handle")]
    InvalidHandle,

    /// Screen grab failed or the requested region was empty.
    #[error("capture failed: {0}")]
    CaptureFailure(String),

    /// The OCR engine could not process an image.
    #[error("recognition failed: {0}")]
    RecognitionFailure(String),

    /// A synthetic mouse message could not be delivered.
    #[error("input delivery failed: {0}")]
    InputDeliveryFailure(String),

    /// One answer-bank line could not be decoded.
    #[error("malformed record at {}:{line}: {reason}", path.display())]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// Configuration validation error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for quiz assistant operations.
pub type Result<T> = std::result::Result<T, QuizError>;

impl QuizError {
    /// Create a new WindowNotFound error.
    pub fn window_not_found(title: impl Into<String>) -> Self {
        Self::WindowNotFound {
            title: title.into(),
        }
    }

    /// Create a new CaptureFailure error.
    pub fn capture(message: impl Into<String>) -> Self {
        Self::CaptureFailure(message.into())
    }

    /// Create a new RecognitionFailure error.
    pub fn recognition(message: impl Into<String>) -> Self {
        Self::RecognitionFailure(message.into())
    }

    /// Create a new InputDeliveryFailure error.
    pub fn input(message: impl Into<String>) -> Self {
        Self::InputDeliveryFailure(message.into())
    }

    /// Create a new Config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True when forward progress is impossible because the target window is gone.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::WindowNotFound { .. } | Self::InvalidHandle)
    }
}

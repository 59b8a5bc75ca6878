//! Error types for promptlog

use thiserror::Error;

/// Main error type for promptlog operations
#[derive(Error, Debug)]
pub enum LogError {
    /// Tag value outside the allowed type set
    #[error("Invalid tag value: {0}")]
    InvalidTag(String),

    /// A prompt completion was attached a second time
    #[error("Prompt at index {0} already has a completion")]
    AlreadyCompleted(usize),

    /// Kind-specific access on a mismatched item
    #[error("Wrong item kind: {0}")]
    WrongKind(String),

    /// Bad positional access into a buffer or query result
    #[error("Index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Set operation over queries from different buffers
    #[error("Cross-buffer operation: {0}")]
    CrossBuffer(String),

    /// The buffer behind a call handle is gone
    #[error("Buffer discarded: {0}")]
    BufferDiscarded(String),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error during serialization
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Structured document missing or mangling required fields
    #[error("Malformed document: {0}")]
    MalformedDocument(String),
}

/// Result type alias using LogError
pub type LogResult<T> = Result<T, LogError>;

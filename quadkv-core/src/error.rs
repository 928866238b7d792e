//! Error types for quadkv-core

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed term, quad, pattern or option shape, detected before any I/O
    #[error("Validation error: {0}")]
    Validation(String),

    /// A term could not be encoded
    #[error("Encode error: {0}")]
    Encode(String),

    /// Stored bytes could not be parsed back into a term or quad
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid index declaration or index set
    #[error("Invalid index: {0}")]
    InvalidIndex(String),

    /// Invalid range bounds in a pattern
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// I/O failure from the underlying key-value backend, propagated unchanged
    #[error("Backend error: {0}")]
    Backend(String),

    /// JSON parsing error (serde_json)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Create an encode error
    pub fn encode(msg: impl Into<String>) -> Self {
        Error::Encode(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Error::Decode(msg.into())
    }

    /// Create an invalid index error
    pub fn invalid_index(msg: impl Into<String>) -> Self {
        Error::InvalidIndex(msg.into())
    }

    /// Create an invalid range error
    pub fn invalid_range(msg: impl Into<String>) -> Self {
        Error::InvalidRange(msg.into())
    }

    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Error::Backend(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }
}

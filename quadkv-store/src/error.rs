//! Error types for the storage engine

use thiserror::Error;

/// Result type alias using our StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage engine errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Error from quadkv-core (validation, codec, index, backend)
    #[error("Core error: {0}")]
    Core(#[from] quadkv_core::Error),

    /// Invalid get/put options
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Scope bookkeeping error
    #[error("Scope error: {0}")]
    Scope(String),
}

impl StoreError {
    /// Create an invalid-options error
    pub fn invalid_options(msg: impl Into<String>) -> Self {
        StoreError::InvalidOptions(msg.into())
    }

    /// Create a scope error
    pub fn scope(msg: impl Into<String>) -> Self {
        StoreError::Scope(msg.into())
    }
}

//! Error types for search execution

use thiserror::Error;

/// Result type for search operations
pub type Result<T> = std::result::Result<T, SearchError>;

/// Search pipeline errors
#[derive(Error, Debug)]
pub enum SearchError {
    /// Error from quadkv-core
    #[error("Core error: {0}")]
    Core(#[from] quadkv_core::Error),

    /// Error from the storage engine
    #[error("Store error: {0}")]
    Store(#[from] quadkv_store::StoreError),

    /// Malformed pipeline shape, detected before execution
    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),

    /// A stage type following an incompatible prior result type
    #[error("Unsupported stage: {0}")]
    UnsupportedStage(String),

    /// A stage references a variable absent from the current binding set
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// A construct template references a variable with no bound value
    #[error("Unbound variable: {0}")]
    UnboundVariable(String),

    /// Operator not opened
    #[error("Operator not opened - call open() before next()")]
    OperatorNotOpened,

    /// Operator already opened
    #[error("Operator already opened")]
    OperatorAlreadyOpened,

    /// Operator is closed
    #[error("Operator is closed")]
    OperatorClosed,
}

impl SearchError {
    /// Create an invalid-pipeline error
    pub fn invalid_pipeline(msg: impl Into<String>) -> Self {
        SearchError::InvalidPipeline(msg.into())
    }

    /// Create an unsupported-stage error
    pub fn unsupported_stage(msg: impl Into<String>) -> Self {
        SearchError::UnsupportedStage(msg.into())
    }
}

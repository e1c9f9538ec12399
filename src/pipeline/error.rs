//! Errors surfaced to the caller of a pipeline run
//!
//! Provider and chunk failures never show up here: the dispatcher absorbs
//! them. Only configuration-class problems and cancellation propagate.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The session was built without any translation provider
    #[error("No translation providers configured")]
    NoProvidersConfigured,

    /// Input text, direction or configuration is unusable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The run was cancelled or superseded by a newer run
    #[error("Translation run was cancelled")]
    Cancelled,
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

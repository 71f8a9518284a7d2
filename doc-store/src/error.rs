//! Store error types

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Document store error type
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed before a response arrived
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Store answered with a non-success status
    #[error("Store returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Document does not exist (update of a missing document)
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Batch carries more operations than the store accepts in one commit
    #[error("Batch of {ops} operations exceeds the limit of {limit}")]
    BatchLimitExceeded { ops: usize, limit: usize },

    /// Path has the wrong shape (empty segment, odd/even mismatch)
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store is unreachable or refused the operation
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BatchLimitExceeded { ops, limit } => AppError::batch_overflow(ops, limit),
            StoreError::Http(ref e) if e.is_timeout() => {
                AppError::with_message(ErrorCode::TimeoutError, err.to_string())
            }
            other => AppError::store(other.to_string()),
        }
    }
}

//! Engine error types.

use crate::db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] DbError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("write conflict on {key} after {attempts} attempts")]
    Conflict { key: String, attempts: usize },
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

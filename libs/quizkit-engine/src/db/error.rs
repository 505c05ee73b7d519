//! Store error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("stale write for {key}: expected revision {expected:?}, found {found:?}")]
    StaleRevision {
        key: String,
        expected: Option<u64>,
        found: Option<u64>,
    },
}

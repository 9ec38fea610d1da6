//! Error types for dialcache-core

use thiserror::Error;

/// Result type alias using dialcache-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in dialcache-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite error from the local replica store
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The store worker is gone or a write could not be completed
    #[error("Store write failed: {0}")]
    StoreWrite(String),

    /// The external source could not be queried this pass
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// The external source rejected a delete request
    #[error("Delete rejected by the external source for record {0}")]
    DeleteFailed(i64),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

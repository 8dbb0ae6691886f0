//! Error types shared across Docketsync crates.

use thiserror::Error;

/// Result type alias for core and storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Storage-level failures, surfaced by the persistence crate.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Could not open or acquire a connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query failed to execute
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violated
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Anything else the storage layer could not handle
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Top-level error for Docketsync operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

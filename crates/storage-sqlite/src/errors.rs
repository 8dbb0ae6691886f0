//! Storage error type and its mapping onto the core error.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use docketsync_core::errors::{DatabaseError, Error};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Query failed: {0}")]
    Query(#[from] DieselError),

    #[error("Connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("Connection failed: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Invalid stored value: {0}")]
    Decode(String),

    /// A core error raised inside a write job.
    #[error(transparent)]
    Core(#[from] Error),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Core(inner) => inner,
            StorageError::Query(DieselError::NotFound) => {
                Error::Database(DatabaseError::NotFound("Record not found".to_string()))
            }
            StorageError::Query(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                info,
            )) => Error::Database(DatabaseError::UniqueViolation(info.message().to_string())),
            StorageError::Query(other) => {
                Error::Database(DatabaseError::QueryFailed(other.to_string()))
            }
            StorageError::Pool(pool_err) => {
                Error::Database(DatabaseError::ConnectionFailed(pool_err.to_string()))
            }
            StorageError::Connection(conn_err) => {
                Error::Database(DatabaseError::ConnectionFailed(conn_err.to_string()))
            }
            StorageError::Migration(message) => {
                Error::Database(DatabaseError::MigrationFailed(message))
            }
            StorageError::Decode(message) => Error::Database(DatabaseError::Internal(message)),
        }
    }
}

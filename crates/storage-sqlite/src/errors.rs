//! Storage-layer errors and their mapping into the core taxonomy.

use thiserror::Error;

use tasknest_core::errors::{DatabaseError, Error};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Database connection failed: {0}")]
    Connection(#[from] diesel::result::ConnectionError),

    #[error("Connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Query(e) => Error::Database(DatabaseError::QueryFailed(e.to_string())),
            StorageError::Connection(e) => {
                Error::Database(DatabaseError::Unavailable(e.to_string()))
            }
            StorageError::Pool(e) => Error::Database(DatabaseError::Unavailable(e.to_string())),
            other => Error::Database(DatabaseError::Internal(other.to_string())),
        }
    }
}

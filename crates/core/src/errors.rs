//! Error types shared across the tasknest crates.

use thiserror::Error;

/// Result type alias used throughout the core.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error taxonomy.
///
/// `SyncUnavailable` and `TasksUnavailable` are the only categories surfaced
/// to callers of the engine; everything else is recovered locally and
/// degrades to "retry on next pass" or "render from stale cache".
#[derive(Debug, Error)]
pub enum Error {
    /// Local store failure.
    #[error("Local store error: {0}")]
    Database(#[from] DatabaseError),

    /// Remote task service failure.
    #[error("Remote task service error: {0}")]
    Remote(#[from] RemoteError),

    /// The server snapshot could not be fetched; the reconciliation pass was
    /// aborted with the outbox and local cache untouched.
    #[error("Sync unavailable: {0}")]
    SyncUnavailable(String),

    /// The initial task load failed both remotely and from the local cache.
    #[error("Tasks unavailable: {0}")]
    TasksUnavailable(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Local store failure classes.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Failures reported by the remote task service client.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport-level failure (connect, timeout, body).
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success response from the task service.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded into the expected shape.
    #[error("invalid response: {0}")]
    Decode(String),

    /// Missing or malformed credentials.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The request could not be built (bad base URL, missing configuration).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl RemoteError {
    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_exposes_status_code() {
        let err = RemoteError::Api {
            status: 503,
            message: "maintenance".to_string(),
        };
        assert_eq!(err.status_code(), Some(503));
        assert_eq!(RemoteError::Transport("offline".to_string()).status_code(), None);
    }

    #[test]
    fn remote_error_converts_into_top_level_error() {
        let err: Error = RemoteError::Auth("no token".to_string()).into();
        assert!(matches!(err, Error::Remote(RemoteError::Auth(_))));
    }
}

//! Error types for the task service client.

use thiserror::Error;

use tasknest_core::errors::RemoteError;

/// Result type alias for task service operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors that can occur while talking to the task service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API error response from the task service
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid request (missing configuration, bad base URL, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication error (malformed token)
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl ApiError {
    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ApiError> for RemoteError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Http(e) => RemoteError::Transport(e.to_string()),
            ApiError::Json(e) => RemoteError::Decode(e.to_string()),
            ApiError::Api { status, message } => RemoteError::Api { status, message },
            ApiError::InvalidRequest(message) => RemoteError::InvalidRequest(message),
            ApiError::Auth(message) => RemoteError::Auth(message),
        }
    }
}

//! HTTP client for the authoritative task service.

mod client;
mod error;
mod types;

pub use client::{RemoteTaskClient, API_URL_ENV};
pub use error::{ApiError, Result};
pub use types::ApiErrorResponse;

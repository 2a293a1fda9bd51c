//! Task service API client.
//!
//! The client holds the session credential explicitly: it is set on login,
//! cleared on logout, and threaded into each request as a bearer header.
//! Core logic never consults it.

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::sync::RwLock;
use std::time::Duration;

use tasknest_core::errors::RemoteError;
use tasknest_core::sync::RemoteTaskApi;
use tasknest_core::tasks::{RawTask, TaskPayload};

use crate::error::{ApiError, Result};
use crate::types::ApiErrorResponse;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;

/// Environment variable naming the task service base URL.
pub const API_URL_ENV: &str = "TASKNEST_API_URL";

/// Client for the tasknest task service API.
#[derive(Debug)]
pub struct RemoteTaskClient {
    client: reqwest::Client,
    base_url: String,
    access_token: RwLock<Option<String>>,
}

impl RemoteTaskClient {
    /// Create a new task service client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the task service (e.g.,
    ///   "https://api.tasknest.app")
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: RwLock::new(None),
        }
    }

    /// Create a client from the `TASKNEST_API_URL` environment variable.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(API_URL_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ApiError::invalid_request(format!(
                    "{API_URL_ENV} not configured. Task service operations are disabled."
                ))
            })?;
        Ok(Self::new(&base_url))
    }

    /// Install the session credential (on login/startup).
    pub fn set_access_token(&self, token: impl Into<String>) {
        if let Ok(mut guard) = self.access_token.write() {
            *guard = Some(token.into());
        }
    }

    /// Drop the session credential (on logout).
    pub fn clear_access_token(&self) {
        if let Ok(mut guard) = self.access_token.write() {
            *guard = None;
        }
    }

    fn tasks_url(&self) -> String {
        format!("{}/api/tasks", self.base_url)
    }

    fn task_url(&self, server_id: &str) -> String {
        format!("{}/api/tasks/{}", self.base_url, urlencoding::encode(server_id))
    }

    /// Create headers for an API request.
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let token = self.access_token.read().ok().and_then(|t| t.clone());
        if let Some(token) = token {
            let auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::auth("Invalid access token format"))?;
            headers.insert(AUTHORIZATION, auth_value);
        }

        Ok(headers)
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("[TaskSync] API response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("[TaskSync] API response error ({}): {}", status, preview);
    }

    /// Parse a JSON response body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(ApiError::api(
                    status.as_u16(),
                    format!("{}: {}", error.code, error.message),
                ));
            }
            return Err(ApiError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!(
                "[TaskSync] Failed to deserialize response. Body: {}, Error: {}",
                body,
                e
            );
            ApiError::api(status.as_u16(), format!("Failed to parse response: {}", e))
        })
    }

    /// Check a bodiless response while preserving API error handling.
    async fn ensure_success(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await?;
        Self::log_response(status, &body);
        if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
            return Err(ApiError::api(
                status.as_u16(),
                format!("{}: {}", error.code, error.message),
            ));
        }

        Err(ApiError::api(
            status.as_u16(),
            format!("Request failed: {}", body),
        ))
    }

    async fn list_tasks_impl(&self) -> Result<Vec<RawTask>> {
        let response = self
            .client
            .get(self.tasks_url())
            .headers(self.headers()?)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn create_task_impl(&self, payload: &TaskPayload) -> Result<RawTask> {
        let response = self
            .client
            .post(self.tasks_url())
            .headers(self.headers()?)
            .json(payload)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn update_task_impl(&self, server_id: &str, payload: &TaskPayload) -> Result<RawTask> {
        let response = self
            .client
            .put(self.task_url(server_id))
            .headers(self.headers()?)
            .json(payload)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn delete_task_impl(&self, server_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.task_url(server_id))
            .headers(self.headers()?)
            .send()
            .await?;
        Self::ensure_success(response).await
    }
}

#[async_trait]
impl RemoteTaskApi for RemoteTaskClient {
    async fn list_tasks(&self) -> std::result::Result<Vec<RawTask>, RemoteError> {
        self.list_tasks_impl().await.map_err(RemoteError::from)
    }

    async fn create_task(
        &self,
        payload: &TaskPayload,
    ) -> std::result::Result<RawTask, RemoteError> {
        self.create_task_impl(payload).await.map_err(RemoteError::from)
    }

    async fn update_task(
        &self,
        server_id: &str,
        payload: &TaskPayload,
    ) -> std::result::Result<RawTask, RemoteError> {
        self.update_task_impl(server_id, payload)
            .await
            .map_err(RemoteError::from)
    }

    async fn delete_task(&self, server_id: &str) -> std::result::Result<(), RemoteError> {
        self.delete_task_impl(server_id).await.map_err(RemoteError::from)
    }
}

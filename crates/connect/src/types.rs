//! Wire types specific to the task service API.

use serde::{Deserialize, Serialize};

/// Error envelope returned by the task service on non-success responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub code: String,
    pub message: String,
}

//! Task entity, wire shape, and ingest normalization.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title applied on ingest when the record carries none.
pub const DEFAULT_TASK_TITLE: &str = "Untitled task";

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Wire/storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// Lenient parse of the recognized statuses. Servers and older clients
    /// disagree on casing and separators, so all common spellings map in;
    /// anything else is `None` and normalizes to `Pending` on ingest.
    pub fn parse(value: &str) -> Option<TaskStatus> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(TaskStatus::Pending),
            "in_progress" | "in-progress" | "inprogress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

/// The domain entity held in the Entity Cache and rendered by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Authoritative identifier; `None` until the server assigns one.
    pub id: Option<String>,
    /// Stable client-generated correlation identifier. For tasks that
    /// originated on the server this equals `id`. Never reassigned.
    pub client_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

impl Task {
    /// Normalize a raw record into a domain task.
    ///
    /// Identifier resolution falls back `clienteId → _id/id → fresh UUID`;
    /// missing titles get the placeholder, unrecognized statuses become
    /// `Pending`, and `deleted` is coerced to a boolean.
    pub fn from_raw(raw: RawTask) -> Self {
        let server_id = raw.id.filter(|v| !v.trim().is_empty());
        let client_id = raw
            .client_id
            .filter(|v| !v.trim().is_empty())
            .or_else(|| server_id.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Task {
            id: server_id,
            client_id,
            title: raw
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TASK_TITLE.to_string()),
            description: raw.description.unwrap_or_default(),
            status: raw
                .status
                .as_deref()
                .and_then(TaskStatus::parse)
                .unwrap_or_default(),
            created_at: raw.created_at,
            deleted: coerce_deleted(raw.deleted.as_ref()),
        }
    }

    /// The mutation payload this task would produce for a create/update.
    pub fn payload(&self) -> TaskPayload {
        TaskPayload {
            title: self.title.clone(),
            status: self.status,
            description: self.description.clone(),
        }
    }
}

/// Mutation payload for create/update calls against the task service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub description: String,
}

/// Raw task record as returned by the server.
///
/// Field-name aliasing is tolerated on ingest: the legacy backend stores the
/// correlation identifier as `clienteId` and exposes its own key as `_id`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTask {
    #[serde(default, alias = "clienteId")]
    pub client_id: Option<String>,
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub deleted: Option<serde_json::Value>,
}

fn coerce_deleted(value: Option<&serde_json::Value>) -> bool {
    match value {
        Some(serde_json::Value::Bool(v)) => *v,
        Some(serde_json::Value::Number(v)) => v.as_i64().map(|n| n != 0).unwrap_or(false),
        Some(serde_json::Value::String(v)) => matches!(v.as_str(), "true" | "1"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_prefers_correlation_identifier() {
        let raw: RawTask = serde_json::from_str(
            r#"{"clienteId":"c-9","_id":"srv-9","title":"Water plants","status":"completed"}"#,
        )
        .unwrap();
        let task = Task::from_raw(raw);
        assert_eq!(task.client_id, "c-9");
        assert_eq!(task.id.as_deref(), Some("srv-9"));
        assert_eq!(task.status, TaskStatus::Completed);
    }

    #[test]
    fn normalization_falls_back_to_server_identifier() {
        let raw: RawTask =
            serde_json::from_str(r#"{"id":"srv-3","title":"Pay rent"}"#).unwrap();
        let task = Task::from_raw(raw);
        assert_eq!(task.client_id, "srv-3");
        assert_eq!(task.id.as_deref(), Some("srv-3"));
    }

    #[test]
    fn normalization_generates_identifier_when_none_present() {
        let task = Task::from_raw(RawTask::default());
        assert!(!task.client_id.is_empty());
        assert!(task.id.is_none());
    }

    #[test]
    fn missing_title_gets_placeholder_and_unknown_status_is_pending() {
        let raw: RawTask =
            serde_json::from_str(r#"{"id":"srv-1","title":"  ","status":"archived"}"#).unwrap();
        let task = Task::from_raw(raw);
        assert_eq!(task.title, DEFAULT_TASK_TITLE);
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn deleted_flag_coerces_to_boolean() {
        for (json, expected) in [
            (r#"{"id":"a","deleted":true}"#, true),
            (r#"{"id":"b","deleted":"true"}"#, true),
            (r#"{"id":"c","deleted":1}"#, true),
            (r#"{"id":"d","deleted":"no"}"#, false),
            (r#"{"id":"e"}"#, false),
        ] {
            let raw: RawTask = serde_json::from_str(json).unwrap();
            assert_eq!(Task::from_raw(raw).deleted, expected, "{json}");
        }
    }

    #[test]
    fn status_parse_accepts_common_spellings() {
        assert_eq!(TaskStatus::parse("In-Progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("inProgress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("PENDING"), Some(TaskStatus::Pending));
        assert_eq!(TaskStatus::parse("done"), None);
    }

    #[test]
    fn status_serialization_matches_backend_contract() {
        let actual = [
            TaskStatus::Pending,
            TaskStatus::InProgress,
            TaskStatus::Completed,
        ]
        .iter()
        .map(|status| serde_json::to_string(status).expect("serialize status"))
        .collect::<Vec<_>>();

        assert_eq!(actual, vec!["\"pending\"", "\"in_progress\"", "\"completed\""]);
    }
}

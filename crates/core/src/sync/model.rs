//! Sync domain models and the contracts consumed by the engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{RemoteError, Result};
use crate::tasks::{RawTask, TaskPayload};

/// Supported outbox operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxOp {
    Create,
    Update,
    Delete,
}

/// A pending mutation intent, durable until confirmed on the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxEntry {
    /// Entry identifier (UUIDv7): log position and dedup key.
    pub id: String,
    pub op: OutboxOp,
    /// Correlation identifier the mutation applies to.
    pub client_id: String,
    /// Mutation payload for create/update; `None` for delete.
    pub payload: Option<TaskPayload>,
    /// Epoch milliseconds assigned at enqueue time; the replay ordering key.
    pub ts: i64,
    pub created_at: String,
}

/// Intent recorded by user-action handlers; the outbox assigns id and
/// timestamps at enqueue time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOutboxEntry {
    pub op: OutboxOp,
    pub client_id: String,
    pub payload: Option<TaskPayload>,
}

impl NewOutboxEntry {
    pub fn create(client_id: impl Into<String>, payload: TaskPayload) -> Self {
        Self {
            op: OutboxOp::Create,
            client_id: client_id.into(),
            payload: Some(payload),
        }
    }

    pub fn update(client_id: impl Into<String>, payload: TaskPayload) -> Self {
        Self {
            op: OutboxOp::Update,
            client_id: client_id.into(),
            payload: Some(payload),
        }
    }

    pub fn delete(client_id: impl Into<String>) -> Self {
        Self {
            op: OutboxOp::Delete,
            client_id: client_id.into(),
            payload: None,
        }
    }
}

/// A durable `client_id → server_id` fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdMapping {
    pub client_id: String,
    pub server_id: String,
}

/// What started a reconciliation pass; recorded in pass logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileTrigger {
    ConnectivityRegained,
    Manual,
}

/// Lightweight metrics for one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileSummary {
    /// Outbox entries confirmed on the server and removed.
    pub replayed: usize,
    /// Local-only tasks uploaded.
    pub uploaded: usize,
    /// Entries discarded because their target was never created server-side.
    pub dropped: usize,
    /// Entries (or uploads) that failed and stay queued for the next pass.
    pub failed: usize,
    /// Cache size after convergence.
    pub total: usize,
    pub duration_ms: i64,
}

/// Outbox contract: append-only record of unconfirmed client intent.
#[async_trait]
pub trait OutboxRepositoryTrait: Send + Sync {
    async fn enqueue(&self, entry: NewOutboxEntry) -> Result<OutboxEntry>;

    /// All pending entries, ordered by `(ts, id)` ascending.
    fn list(&self) -> Result<Vec<OutboxEntry>>;

    async fn remove(&self, entry_id: &str) -> Result<()>;
}

/// Identifier Mapping Table contract. `set` is write-once per key: a second
/// call with a different value must leave the first mapping in place.
#[async_trait]
pub trait IdMappingRepositoryTrait: Send + Sync {
    async fn set(&self, client_id: &str, server_id: &str) -> Result<()>;

    fn get(&self, client_id: &str) -> Result<Option<String>>;

    /// Every known mapping; used for reverse resolution at converge time.
    fn all(&self) -> Result<Vec<IdMapping>>;
}

/// Remote task service contract (the authoritative task collection).
#[async_trait]
pub trait RemoteTaskApi: Send + Sync {
    async fn list_tasks(&self) -> std::result::Result<Vec<RawTask>, RemoteError>;

    async fn create_task(
        &self,
        payload: &TaskPayload,
    ) -> std::result::Result<RawTask, RemoteError>;

    async fn update_task(
        &self,
        server_id: &str,
        payload: &TaskPayload,
    ) -> std::result::Result<RawTask, RemoteError>;

    async fn delete_task(&self, server_id: &str) -> std::result::Result<(), RemoteError>;
}

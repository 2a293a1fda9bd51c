//! Task domain model and Entity Cache contract.

mod model;

pub use model::*;

use async_trait::async_trait;

use crate::errors::Result;

/// Entity Cache contract: persistent local store of [`Task`] records.
///
/// Rows are keyed by correlation identifier, with the server identifier as a
/// secondary key. Reads are synchronous; writes go through the storage
/// writer and are awaited.
#[async_trait]
pub trait TaskCacheRepositoryTrait: Send + Sync {
    fn get_all(&self) -> Result<Vec<Task>>;

    /// Upsert by server identifier, falling back to the correlation
    /// identifier when the task has none yet.
    async fn put(&self, task: Task) -> Result<()>;

    /// Remove the row whose server or correlation identifier matches `id`.
    async fn remove(&self, id: &str) -> Result<()>;

    /// Replace the entire cache with `tasks` in one atomic write.
    async fn replace_all(&self, tasks: Vec<Task>) -> Result<()>;
}

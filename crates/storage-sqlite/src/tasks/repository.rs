use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use tasknest_core::errors::Result;
use tasknest_core::tasks::{Task, TaskCacheRepositoryTrait};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::task_cache;

use super::model::CachedTaskDB;

pub struct TaskCacheRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl TaskCacheRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl TaskCacheRepositoryTrait for TaskCacheRepository {
    fn get_all(&self) -> Result<Vec<Task>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = task_cache::table
            .order(task_cache::client_id.asc())
            .load::<CachedTaskDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn put(&self, task: Task) -> Result<()> {
        let row = CachedTaskDB::from(task);
        self.writer
            .exec(move |conn| {
                if let Some(server_id) = row.server_id.clone() {
                    // A server round-trip may have landed the same task under
                    // its server identifier; keep one row per task.
                    diesel::delete(
                        task_cache::table
                            .filter(task_cache::server_id.eq(server_id))
                            .filter(task_cache::client_id.ne(row.client_id.clone())),
                    )
                    .execute(conn)
                    .map_err(StorageError::from)?;
                }

                diesel::insert_into(task_cache::table)
                    .values(&row)
                    .on_conflict(task_cache::client_id)
                    .do_update()
                    .set((
                        task_cache::server_id.eq(row.server_id.clone()),
                        task_cache::title.eq(row.title.clone()),
                        task_cache::description.eq(row.description.clone()),
                        task_cache::status.eq(row.status.clone()),
                        task_cache::created_at.eq(row.created_at.clone()),
                        task_cache::deleted.eq(row.deleted),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::delete(
                    task_cache::table.filter(
                        task_cache::server_id
                            .eq(id.clone())
                            .or(task_cache::client_id.eq(id.clone())),
                    ),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn replace_all(&self, tasks: Vec<Task>) -> Result<()> {
        let rows: Vec<CachedTaskDB> = tasks.into_iter().map(CachedTaskDB::from).collect();
        self.writer
            .exec(move |conn| {
                diesel::delete(task_cache::table)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if !rows.is_empty() {
                    diesel::insert_into(task_cache::table)
                        .values(&rows)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(())
            })
            .await
    }
}

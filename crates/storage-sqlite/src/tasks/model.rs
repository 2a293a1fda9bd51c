//! Database model for the Entity Cache.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use tasknest_core::tasks::{Task, TaskStatus};

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    Debug,
    Clone,
    Serialize,
    Deserialize,
)]
#[diesel(primary_key(client_id))]
#[diesel(table_name = crate::schema::task_cache)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CachedTaskDB {
    pub client_id: String,
    pub server_id: Option<String>,
    pub title: String,
    pub description: String,
    pub status: String,
    pub created_at: Option<String>,
    pub deleted: i32,
}

impl From<Task> for CachedTaskDB {
    fn from(task: Task) -> Self {
        Self {
            client_id: task.client_id,
            server_id: task.id,
            title: task.title,
            description: task.description,
            status: task.status.as_str().to_string(),
            created_at: task.created_at,
            deleted: i32::from(task.deleted),
        }
    }
}

impl From<CachedTaskDB> for Task {
    fn from(row: CachedTaskDB) -> Self {
        Task {
            id: row.server_id,
            client_id: row.client_id,
            title: row.title,
            description: row.description,
            // Stored records normalize like any other ingest.
            status: TaskStatus::parse(&row.status).unwrap_or_default(),
            created_at: row.created_at,
            deleted: row.deleted != 0,
        }
    }
}

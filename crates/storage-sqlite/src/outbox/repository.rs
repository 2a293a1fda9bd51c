use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use tasknest_core::errors::Result;
use tasknest_core::sync::{NewOutboxEntry, OutboxEntry, OutboxOp, OutboxRepositoryTrait};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::sync_outbox;

use super::model::OutboxEntryDB;

fn enum_to_db<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.trim_matches('"').to_string())
}

fn enum_from_db<T: serde::de::DeserializeOwned>(value: &str) -> Result<T> {
    Ok(serde_json::from_str(&format!("\"{}\"", value))?)
}

fn to_entry(row: OutboxEntryDB) -> Result<OutboxEntry> {
    Ok(OutboxEntry {
        id: row.event_id,
        op: enum_from_db::<OutboxOp>(&row.op)?,
        client_id: row.client_id,
        payload: serde_json::from_str(&row.payload)?,
        ts: row.ts,
        created_at: row.created_at,
    })
}

pub struct OutboxRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl OutboxRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl OutboxRepositoryTrait for OutboxRepository {
    async fn enqueue(&self, entry: NewOutboxEntry) -> Result<OutboxEntry> {
        let row = OutboxEntryDB {
            // UUIDv7 ids are time-ordered, so `(ts, event_id)` totals the log
            // even when two entries land in the same millisecond.
            event_id: Uuid::now_v7().to_string(),
            op: enum_to_db(&entry.op)?,
            client_id: entry.client_id,
            payload: serde_json::to_string(&entry.payload)?,
            ts: Utc::now().timestamp_millis(),
            created_at: Utc::now().to_rfc3339(),
        };

        let inserted = self
            .writer
            .exec(move |conn| {
                let inserted = diesel::insert_into(sync_outbox::table)
                    .values(&row)
                    .returning(OutboxEntryDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(inserted)
            })
            .await?;
        to_entry(inserted)
    }

    fn list(&self) -> Result<Vec<OutboxEntry>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = sync_outbox::table
            .order((sync_outbox::ts.asc(), sync_outbox::event_id.asc()))
            .load::<OutboxEntryDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(to_entry).collect()
    }

    async fn remove(&self, entry_id: &str) -> Result<()> {
        let entry_id = entry_id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::delete(sync_outbox::table.find(entry_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    use crate::db::{create_pool, init, run_migrations, write_actor::spawn_writer};
    use tasknest_core::tasks::TaskPayload;

    fn setup() -> OutboxRepository {
        let app_data = tempdir()
            .expect("tempdir")
            .keep()
            .to_string_lossy()
            .to_string();
        let db_path = init(&app_data).expect("init db");
        run_migrations(&db_path).expect("migrate db");
        let pool = create_pool(&db_path).expect("create pool");
        let writer = spawn_writer(pool.as_ref().clone());
        OutboxRepository::new(pool, writer)
    }

    #[tokio::test]
    async fn enqueue_assigns_monotonic_timestamps_and_distinct_ids() {
        let repo = setup();

        let first = repo
            .enqueue(NewOutboxEntry::create("c1", TaskPayload::default()))
            .await
            .expect("enqueue");
        let second = repo
            .enqueue(NewOutboxEntry::delete("c1"))
            .await
            .expect("enqueue");

        assert!(first.ts <= second.ts);
        assert_ne!(first.id, second.id);
        assert_eq!(first.op, OutboxOp::Create);
        assert_eq!(second.op, OutboxOp::Delete);
    }

    #[tokio::test]
    async fn list_orders_by_timestamp_regardless_of_insert_order() {
        let repo = setup();
        let mut conn = get_connection(&repo.pool).expect("conn");
        for (event_id, ts) in [("b-late", 500_i64), ("a-early", 100_i64)] {
            diesel::insert_into(sync_outbox::table)
                .values(OutboxEntryDB {
                    event_id: event_id.to_string(),
                    op: "update".to_string(),
                    client_id: "c1".to_string(),
                    payload: "null".to_string(),
                    ts,
                    created_at: "2026-08-06T00:00:00Z".to_string(),
                })
                .execute(&mut conn)
                .expect("insert");
        }

        let listed = repo.list().expect("list");
        let ids: Vec<&str> = listed.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a-early", "b-late"]);
    }

    #[tokio::test]
    async fn payload_round_trips_and_delete_carries_none() {
        let repo = setup();
        let payload = TaskPayload {
            title: "Buy milk".to_string(),
            ..Default::default()
        };

        repo.enqueue(NewOutboxEntry::create("c1", payload.clone()))
            .await
            .expect("enqueue create");
        repo.enqueue(NewOutboxEntry::delete("c2"))
            .await
            .expect("enqueue delete");

        let listed = repo.list().expect("list");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].payload.as_ref(), Some(&payload));
        assert!(listed[1].payload.is_none());
    }

    #[tokio::test]
    async fn remove_deletes_single_entry() {
        let repo = setup();
        let kept = repo
            .enqueue(NewOutboxEntry::create("c1", TaskPayload::default()))
            .await
            .expect("enqueue");
        let removed = repo
            .enqueue(NewOutboxEntry::create("c2", TaskPayload::default()))
            .await
            .expect("enqueue");

        repo.remove(&removed.id).await.expect("remove");

        let listed = repo.list().expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, kept.id);
    }
}

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;

use tasknest_core::errors::Result;
use tasknest_core::sync::{IdMapping, IdMappingRepositoryTrait};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::id_mappings;

use super::model::IdMappingDB;

pub struct IdMappingRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl IdMappingRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl IdMappingRepositoryTrait for IdMappingRepository {
    async fn set(&self, client_id: &str, server_id: &str) -> Result<()> {
        let row = IdMappingDB {
            client_id: client_id.to_string(),
            server_id: server_id.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        self.writer
            .exec(move |conn| {
                // Write-once per key: a later write for the same correlation
                // id is ignored, never overwritten to a different value.
                diesel::insert_into(id_mappings::table)
                    .values(&row)
                    .on_conflict(id_mappings::client_id)
                    .do_nothing()
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    fn get(&self, client_id: &str) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;
        let row = id_mappings::table
            .find(client_id)
            .first::<IdMappingDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(|r| r.server_id))
    }

    fn all(&self) -> Result<Vec<IdMapping>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = id_mappings::table
            .load::<IdMappingDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| IdMapping {
                client_id: row.client_id,
                server_id: row.server_id,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    use crate::db::{create_pool, init, run_migrations, write_actor::spawn_writer};

    fn setup() -> IdMappingRepository {
        let app_data = tempdir()
            .expect("tempdir")
            .keep()
            .to_string_lossy()
            .to_string();
        let db_path = init(&app_data).expect("init db");
        run_migrations(&db_path).expect("migrate db");
        let pool = create_pool(&db_path).expect("create pool");
        let writer = spawn_writer(pool.as_ref().clone());
        IdMappingRepository::new(pool, writer)
    }

    #[tokio::test]
    async fn mapping_is_write_once() {
        let repo = setup();

        repo.set("c1", "s1").await.expect("set");
        repo.set("c1", "s2").await.expect("second set is a no-op");

        assert_eq!(repo.get("c1").expect("get").as_deref(), Some("s1"));
    }

    #[tokio::test]
    async fn absent_mapping_reads_as_none() {
        let repo = setup();
        assert!(repo.get("never-created").expect("get").is_none());
    }

    #[tokio::test]
    async fn all_returns_every_known_pair() {
        let repo = setup();
        repo.set("c1", "s1").await.expect("set");
        repo.set("c2", "s2").await.expect("set");

        let mut pairs: Vec<(String, String)> = repo
            .all()
            .expect("all")
            .into_iter()
            .map(|m| (m.client_id, m.server_id))
            .collect();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("c1".to_string(), "s1".to_string()),
                ("c2".to_string(), "s2".to_string()),
            ]
        );
    }
}

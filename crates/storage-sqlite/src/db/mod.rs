//! SQLite pool, embedded migrations, and the serialized write path.

pub mod write_actor;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel::Connection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tasknest_core::errors::{DatabaseError, Error, Result};

use crate::errors::StorageError;

pub use write_actor::{spawn_writer, WriteHandle};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const DB_FILE_NAME: &str = "tasknest.db";

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Ensure the application data directory exists and return the database path.
pub fn init(app_data_dir: &str) -> Result<String> {
    std::fs::create_dir_all(app_data_dir).map_err(StorageError::from)?;
    let db_path = Path::new(app_data_dir).join(DB_FILE_NAME);
    Ok(db_path.to_string_lossy().to_string())
}

/// Run any pending embedded migrations.
pub fn run_migrations(db_path: &str) -> Result<()> {
    let mut conn = SqliteConnection::establish(db_path).map_err(StorageError::from)?;
    conn.run_pending_migrations(MIGRATIONS)
        .map(|_| ())
        .map_err(|e| StorageError::Migration(e.to_string()))?;
    Ok(())
}

#[derive(Debug)]
struct ConnectionOptions;

impl diesel::r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error>
    for ConnectionOptions
{
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA journal_mode = WAL; \
             PRAGMA synchronous = NORMAL; \
             PRAGMA busy_timeout = 5000; \
             PRAGMA foreign_keys = ON;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Build the shared connection pool.
pub fn create_pool(db_path: &str) -> Result<Arc<DbPool>> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool = Pool::builder()
        .max_size(8)
        .connection_timeout(Duration::from_secs(5))
        .connection_customizer(Box::new(ConnectionOptions))
        .build(manager)
        .map_err(StorageError::from)?;
    Ok(Arc::new(pool))
}

pub fn get_connection(pool: &Arc<DbPool>) -> Result<DbConnection> {
    pool.get()
        .map_err(|e| Error::Database(DatabaseError::Unavailable(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::prelude::*;
    use tempfile::tempdir;

    use crate::schema::id_mappings;

    fn setup() -> (Arc<DbPool>, WriteHandle) {
        let app_data = tempdir()
            .expect("tempdir")
            .keep()
            .to_string_lossy()
            .to_string();
        let db_path = init(&app_data).expect("init db");
        run_migrations(&db_path).expect("migrate db");
        let pool = create_pool(&db_path).expect("create pool");
        let writer = spawn_writer(pool.as_ref().clone());
        (pool, writer)
    }

    #[tokio::test]
    async fn migrations_create_sync_tables() {
        let (pool, _writer) = setup();
        let mut conn = get_connection(&pool).expect("conn");
        for table in ["task_cache", "sync_outbox", "id_mappings"] {
            let sql = format!(
                "SELECT COUNT(*) as c FROM sqlite_master WHERE type='table' AND name='{}'",
                table
            );
            #[derive(diesel::QueryableByName)]
            struct CountRow {
                #[diesel(sql_type = diesel::sql_types::BigInt)]
                c: i64,
            }
            let row = diesel::sql_query(sql)
                .get_result::<CountRow>(&mut conn)
                .expect("table exists");
            assert_eq!(row.c, 1, "missing table {table}");
        }
    }

    #[tokio::test]
    async fn writer_rolls_back_failed_jobs() {
        let (pool, writer) = setup();

        let result = writer
            .exec(|conn| {
                diesel::insert_into(id_mappings::table)
                    .values((
                        id_mappings::client_id.eq("c-rollback"),
                        id_mappings::server_id.eq("s-rollback"),
                        id_mappings::created_at.eq("2026-08-06T00:00:00Z"),
                    ))
                    .execute(conn)
                    .map_err(crate::errors::StorageError::from)?;
                Err::<(), _>(Error::Database(DatabaseError::Internal(
                    "forced failure".to_string(),
                )))
            })
            .await;

        assert!(result.is_err(), "job should surface its error");

        let mut conn = get_connection(&pool).expect("conn");
        let count: i64 = id_mappings::table
            .filter(id_mappings::client_id.eq("c-rollback"))
            .count()
            .get_result(&mut conn)
            .expect("count");
        assert_eq!(count, 0, "insert should be rolled back");
    }

    #[tokio::test]
    async fn writer_serializes_and_commits_jobs() {
        let (pool, writer) = setup();

        for n in 0..5 {
            writer
                .exec(move |conn| {
                    diesel::insert_into(id_mappings::table)
                        .values((
                            id_mappings::client_id.eq(format!("c{n}")),
                            id_mappings::server_id.eq(format!("s{n}")),
                            id_mappings::created_at.eq("2026-08-06T00:00:00Z"),
                        ))
                        .execute(conn)
                        .map_err(crate::errors::StorageError::from)?;
                    Ok(())
                })
                .await
                .expect("write");
        }

        let mut conn = get_connection(&pool).expect("conn");
        let count: i64 = id_mappings::table
            .count()
            .get_result(&mut conn)
            .expect("count");
        assert_eq!(count, 5);
    }
}

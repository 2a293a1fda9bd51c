//! SQLite persistence for tasknest: Entity Cache, Outbox, and Identifier
//! Mapping Table.

pub mod db;
pub mod errors;
pub mod id_map;
pub mod outbox;
pub mod schema;
pub mod tasks;

pub use db::{create_pool, get_connection, init, run_migrations, DbPool, WriteHandle};
pub use id_map::IdMappingRepository;
pub use outbox::OutboxRepository;
pub use tasks::TaskCacheRepository;

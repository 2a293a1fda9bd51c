//! Outbox backed by the `sync_outbox` table.

mod model;
mod repository;

pub use model::OutboxEntryDB;
pub use repository::OutboxRepository;

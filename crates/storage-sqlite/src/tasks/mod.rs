//! Entity Cache backed by the `task_cache` table.

mod model;
mod repository;

pub use model::CachedTaskDB;
pub use repository::TaskCacheRepository;

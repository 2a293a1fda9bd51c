//! Identifier Mapping Table backed by the `id_mappings` table.

mod model;
mod repository;

pub use model::IdMappingDB;
pub use repository::IdMappingRepository;

//! Outbox model, sync contracts, and the reconciliation engine.

mod engine;
mod model;

pub use engine::*;
pub use model::*;

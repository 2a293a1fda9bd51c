//! Core domain model and reconciliation engine for tasknest.
//!
//! This crate is transport- and storage-agnostic: the Entity Cache, Outbox,
//! Identifier Mapping Table, and remote task service are consumed through
//! traits defined here and implemented by the sibling crates.

pub mod errors;
pub mod sync;
pub mod tasks;

pub use errors::{Error, Result};

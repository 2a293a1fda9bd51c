//! Database model for the outbox.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

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
#[diesel(primary_key(event_id))]
#[diesel(table_name = crate::schema::sync_outbox)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OutboxEntryDB {
    pub event_id: String,
    pub op: String,
    pub client_id: String,
    pub payload: String,
    pub ts: i64,
    pub created_at: String,
}

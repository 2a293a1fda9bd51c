//! Database model for the identifier mapping table.

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
#[diesel(primary_key(client_id))]
#[diesel(table_name = crate::schema::id_mappings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct IdMappingDB {
    pub client_id: String,
    pub server_id: String,
    pub created_at: String,
}

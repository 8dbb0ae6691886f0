//! Database models for the run ledger tables.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    Selectable,
    Debug,
    Clone,
    Serialize,
    Deserialize,
)]
#[diesel(table_name = crate::schema::sync_runs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncRunDB {
    pub id: String,
    pub source: String,
    pub status: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub watermark: Option<String>,
    /// JSON object keyed by entity type.
    pub entity_stats: String,
    pub total_synced: i64,
    pub total_errors: i64,
}

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
#[diesel(primary_key(source))]
#[diesel(table_name = crate::schema::sync_run_leases)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncRunLeaseDB {
    pub source: String,
    pub run_id: String,
    pub acquired_at: String,
    pub expires_at: String,
}

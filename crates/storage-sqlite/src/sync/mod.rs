//! SQLite storage for the matter sync: synchronized records and run ledger.

pub mod ledger;
pub mod records;

use chrono::{DateTime, SecondsFormat, Utc};

use docketsync_core::errors::Result;

use crate::errors::StorageError;

pub use ledger::{SyncLedgerRepository, SyncRunDB, SyncRunLeaseDB};
pub use records::SyncRecordRepository;

/// Fixed-width UTC timestamps so lexical order matches time order.
pub(crate) fn timestamp_to_db(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn timestamp_from_db(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Decode(format!("Invalid timestamp '{}': {}", value, e)))?)
}

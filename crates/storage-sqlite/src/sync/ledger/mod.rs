//! Sync run ledger and run-in-progress lease.

mod model;
mod repository;

pub use model::{SyncRunDB, SyncRunLeaseDB};
pub use repository::SyncLedgerRepository;

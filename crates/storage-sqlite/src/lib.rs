//! SQLite storage for Docketsync.
//!
//! Holds the synchronized matter tables and the sync run ledger. Reads go
//! through an r2d2 pool; every write is funneled through a single writer
//! actor so SQLite never sees concurrent writers.

pub mod db;
pub mod errors;
pub mod schema;
pub mod sync;

pub use db::{create_pool, get_connection, init, run_migrations, DbPool, WriteHandle};
pub use errors::StorageError;
pub use sync::{SyncLedgerRepository, SyncRecordRepository};

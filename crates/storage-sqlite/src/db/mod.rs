//! Database bootstrap: file location, migrations, pool and writer actor.

pub mod write_actor;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel::Connection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::info;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use docketsync_core::errors::{DatabaseError, Error, Result};

use crate::errors::StorageError;

pub use write_actor::{spawn_writer, WriteHandle};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// File name of the database inside the data directory.
pub const DB_FILE_NAME: &str = "docketsync.db";

const BUSY_TIMEOUT_MS: u32 = 5_000;
const POOL_MAX_SIZE: u32 = 8;
const POOL_CONNECTION_TIMEOUT_SECS: u64 = 30;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Per-connection pragmas applied whenever the pool hands out a connection.
#[derive(Debug, Clone, Copy)]
struct ConnectionOptions {
    busy_timeout_ms: u32,
}

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            self.busy_timeout_ms
        ))
        .map_err(r2d2::Error::QueryError)
    }
}

/// Make sure the data directory exists and return the database path.
pub fn init(app_data_dir: &str) -> Result<String> {
    let dir = Path::new(app_data_dir);
    std::fs::create_dir_all(dir).map_err(|e| {
        Error::Database(DatabaseError::ConnectionFailed(format!(
            "Cannot create data directory '{}': {}",
            app_data_dir, e
        )))
    })?;
    Ok(dir.join(DB_FILE_NAME).to_string_lossy().to_string())
}

/// Apply pending embedded migrations and switch the file to WAL.
pub fn run_migrations(db_path: &str) -> Result<()> {
    let mut conn = SqliteConnection::establish(db_path).map_err(StorageError::from)?;
    conn.batch_execute("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")
        .map_err(StorageError::from)?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| StorageError::Migration(e.to_string()))?;
    if !applied.is_empty() {
        info!("Applied {} database migration(s) to {}", applied.len(), db_path);
    }
    Ok(())
}

pub fn create_pool(db_path: &str) -> Result<Arc<DbPool>> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool = Pool::builder()
        .max_size(POOL_MAX_SIZE)
        .connection_timeout(Duration::from_secs(POOL_CONNECTION_TIMEOUT_SECS))
        .connection_customizer(Box::new(ConnectionOptions {
            busy_timeout_ms: BUSY_TIMEOUT_MS,
        }))
        .build(manager)
        .map_err(StorageError::from)?;
    Ok(Arc::new(pool))
}

pub fn get_connection(pool: &DbPool) -> Result<DbConnection> {
    Ok(pool.get().map_err(StorageError::from)?)
}

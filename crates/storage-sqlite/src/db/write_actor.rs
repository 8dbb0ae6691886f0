//! Single writer actor: every write job runs on one dedicated thread, in
//! its own transaction.

use diesel::sqlite::SqliteConnection;
use diesel::Connection;
use log::error;
use tokio::sync::{mpsc, oneshot};

use docketsync_core::errors::{DatabaseError, Error, Result};

use super::DbPool;
use crate::errors::StorageError;

type Job = Box<dyn FnOnce(&mut SqliteConnection) + Send + 'static>;

/// Cheap, cloneable handle for submitting write jobs.
#[derive(Clone, Debug)]
pub struct WriteHandle {
    tx: mpsc::UnboundedSender<Job>,
}

impl WriteHandle {
    /// Run `job` on the writer thread inside a transaction and wait for it.
    ///
    /// An `Err` from the job rolls the transaction back. Nested
    /// `conn.transaction` calls inside the job become savepoints.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel::<Result<T>>();
        let wrapped: Job = Box::new(move |conn: &mut SqliteConnection| {
            let result = conn
                .transaction::<T, StorageError, _>(|conn| job(conn).map_err(StorageError::Core))
                .map_err(Error::from);
            let _ = reply_tx.send(result);
        });

        self.tx.send(wrapped).map_err(|_| {
            Error::Database(DatabaseError::ConnectionFailed(
                "Database writer is not running".to_string(),
            ))
        })?;

        reply_rx.await.map_err(|_| {
            Error::Database(DatabaseError::ConnectionFailed(
                "Database writer dropped the write job".to_string(),
            ))
        })?
    }
}

/// Start the writer thread. It stops when every handle has been dropped.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

    let spawned = std::thread::Builder::new()
        .name("docketsync-db-writer".to_string())
        .spawn(move || {
            while let Some(job) = rx.blocking_recv() {
                match pool.get() {
                    Ok(mut conn) => job(&mut conn),
                    Err(err) => {
                        // Dropping the job closes its reply channel.
                        error!("Database writer could not get a connection: {}", err);
                    }
                }
            }
        });
    if let Err(err) = spawned {
        error!("Failed to start database writer thread: {}", err);
    }

    WriteHandle { tx }
}

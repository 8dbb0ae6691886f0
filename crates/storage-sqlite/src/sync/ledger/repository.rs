//! Repository for the sync run ledger.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

use docketsync_core::errors::Result;
use docketsync_core::sync::ports::SyncLedger;
use docketsync_core::sync::{EntitySyncStats, SyncEntity, SyncRun, SyncRunStatus};

use super::model::{SyncRunDB, SyncRunLeaseDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{sync_run_leases, sync_runs};
use crate::sync::{timestamp_from_db, timestamp_to_db};

fn enum_to_db<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.trim_matches('"').to_string())
}

fn enum_from_db<T: serde::de::DeserializeOwned>(value: &str) -> Result<T> {
    Ok(serde_json::from_str(&format!("\"{}\"", value))?)
}

fn to_run_db(run: &SyncRun) -> Result<SyncRunDB> {
    Ok(SyncRunDB {
        id: run.id.clone(),
        source: run.source.clone(),
        status: enum_to_db(&run.status)?,
        started_at: timestamp_to_db(run.started_at),
        completed_at: run.completed_at.map(timestamp_to_db),
        watermark: run.watermark.map(timestamp_to_db),
        entity_stats: serde_json::to_string(&run.entity_stats)?,
        total_synced: run.total_synced as i64,
        total_errors: run.total_errors as i64,
    })
}

fn to_sync_run(row: SyncRunDB) -> Result<SyncRun> {
    let entity_stats: BTreeMap<SyncEntity, EntitySyncStats> =
        serde_json::from_str(&row.entity_stats)?;
    Ok(SyncRun {
        status: enum_from_db::<SyncRunStatus>(&row.status)?,
        started_at: timestamp_from_db(&row.started_at)?,
        completed_at: row.completed_at.as_deref().map(timestamp_from_db).transpose()?,
        watermark: row.watermark.as_deref().map(timestamp_from_db).transpose()?,
        entity_stats,
        total_synced: row.total_synced.max(0) as usize,
        total_errors: row.total_errors.max(0) as usize,
        id: row.id,
        source: row.source,
    })
}

pub struct SyncLedgerRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SyncLedgerRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    /// Take the lease for `source` unless another unexpired lease exists.
    /// Check and set happen in one write transaction.
    pub async fn acquire_lease(&self, source: &str, run_id: &str, ttl_secs: i64) -> Result<bool> {
        let source = source.to_string();
        let run_id = run_id.to_string();
        self.writer
            .exec(move |conn| {
                let now = Utc::now();
                let existing = sync_run_leases::table
                    .find(&source)
                    .select(SyncRunLeaseDB::as_select())
                    .first::<SyncRunLeaseDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?;

                if let Some(lease) = existing {
                    if lease.expires_at > timestamp_to_db(now) {
                        return Ok(false);
                    }
                    warn!(
                        "[MatterSync] Taking over expired run lease {} for '{}' (expired {})",
                        lease.run_id, source, lease.expires_at
                    );
                }

                let lease = SyncRunLeaseDB {
                    source: source.clone(),
                    run_id: run_id.clone(),
                    acquired_at: timestamp_to_db(now),
                    expires_at: timestamp_to_db(now + Duration::seconds(ttl_secs.max(1))),
                };
                diesel::insert_into(sync_run_leases::table)
                    .values(&lease)
                    .on_conflict(sync_run_leases::source)
                    .do_update()
                    .set(&lease)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(true)
            })
            .await
    }

    /// Release the lease only if `run_id` still holds it.
    pub async fn release_lease(&self, source: &str, run_id: &str) -> Result<()> {
        let source = source.to_string();
        let run_id = run_id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::delete(
                    sync_run_leases::table
                        .filter(sync_run_leases::source.eq(&source))
                        .filter(sync_run_leases::run_id.eq(&run_id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    pub fn get_lease(&self, source: &str) -> Result<Option<SyncRunLeaseDB>> {
        let mut conn = get_connection(&self.pool)?;
        Ok(sync_run_leases::table
            .find(source)
            .select(SyncRunLeaseDB::as_select())
            .first::<SyncRunLeaseDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?)
    }

    pub fn last_success_completed_at(&self, source: &str) -> Result<Option<DateTime<Utc>>> {
        let mut conn = get_connection(&self.pool)?;
        let success = enum_to_db(&SyncRunStatus::Success)?;
        let completed = sync_runs::table
            .filter(sync_runs::source.eq(source))
            .filter(sync_runs::status.eq(success))
            .filter(sync_runs::completed_at.is_not_null())
            .order(sync_runs::completed_at.desc())
            .select(sync_runs::completed_at)
            .first::<Option<String>>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .flatten();
        completed.as_deref().map(timestamp_from_db).transpose()
    }

    /// Append one run. Rows are never updated afterwards.
    pub async fn insert_run(&self, run: SyncRun) -> Result<()> {
        let row = to_run_db(&run)?;
        self.writer
            .exec(move |conn| {
                diesel::insert_into(sync_runs::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await?;
        info!(
            "[MatterSync] Recorded run {} ({}) for '{}'",
            run.id, run.status, run.source
        );
        Ok(())
    }

    /// Most recent runs first.
    pub fn get_runs(&self, source: &str, limit: i64) -> Result<Vec<SyncRun>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = sync_runs::table
            .filter(sync_runs::source.eq(source))
            .order(sync_runs::started_at.desc())
            .limit(limit.max(0))
            .select(SyncRunDB::as_select())
            .load::<SyncRunDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(to_sync_run).collect()
    }
}

#[async_trait]
impl SyncLedger for SyncLedgerRepository {
    async fn acquire_run_lease(
        &self,
        source: &str,
        run_id: &str,
        ttl_secs: i64,
    ) -> std::result::Result<bool, String> {
        self.acquire_lease(source, run_id, ttl_secs)
            .await
            .map_err(|e| e.to_string())
    }

    async fn release_run_lease(
        &self,
        source: &str,
        run_id: &str,
    ) -> std::result::Result<(), String> {
        self.release_lease(source, run_id)
            .await
            .map_err(|e| e.to_string())
    }

    async fn last_successful_run(
        &self,
        source: &str,
    ) -> std::result::Result<Option<DateTime<Utc>>, String> {
        self.last_success_completed_at(source)
            .map_err(|e| e.to_string())
    }

    async fn record_run(&self, run: SyncRun) -> std::result::Result<(), String> {
        self.insert_run(run).await.map_err(|e| e.to_string())
    }

    async fn list_runs(
        &self,
        source: &str,
        limit: i64,
    ) -> std::result::Result<Vec<SyncRun>, String> {
        self.get_runs(source, limit).map_err(|e| e.to_string())
    }
}

//! Seams between the orchestrator and its collaborators.
//!
//! Storage, transport and credentials are supplied by other crates; the
//! orchestrator only sees these traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::{BatchResult, FetchError, SyncEntity, SyncRecord, SyncRun};

/// Supplies a bearer token that is valid right now. Refresh is the
/// provider's business.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn get_valid_access_token(&self) -> Result<String, String>;
}

/// Paginated retrieval of one entity type from the matter API.
#[async_trait]
pub trait EntitySource: Send + Sync {
    /// Fetch every page for `entity`. `since` is passed through as an
    /// "updated since" filter; `None` means a full listing.
    async fn fetch(
        &self,
        token: &str,
        entity: SyncEntity,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<serde_json::Value>, FetchError>;
}

/// Bulk external-id to internal-id lookup against the internal store.
#[async_trait]
pub trait IdentifierLookup: Send + Sync {
    /// Returns only the ids that are known; misses are simply absent.
    async fn resolve_external_ids(
        &self,
        entity: SyncEntity,
        external_ids: Vec<String>,
    ) -> Result<HashMap<String, i64>, String>;
}

/// Idempotent create-or-update keyed by external id.
#[async_trait]
pub trait UpsertWriter: Send + Sync {
    /// `Err` means the store could not be used at all; rejected records are
    /// reported inside the `BatchResult`.
    async fn upsert_records(
        &self,
        entity: SyncEntity,
        records: Vec<SyncRecord>,
    ) -> Result<BatchResult, String>;
}

/// Append-only run log plus the run-in-progress lease.
#[async_trait]
pub trait SyncLedger: Send + Sync {
    /// Atomically take the lease for `source`. Returns false when another
    /// unexpired lease exists.
    async fn acquire_run_lease(
        &self,
        source: &str,
        run_id: &str,
        ttl_secs: i64,
    ) -> Result<bool, String>;

    async fn release_run_lease(&self, source: &str, run_id: &str) -> Result<(), String>;

    /// Completion time of the most recent `success` run for `source`.
    async fn last_successful_run(&self, source: &str) -> Result<Option<DateTime<Utc>>, String>;

    async fn record_run(&self, run: SyncRun) -> Result<(), String>;

    async fn list_runs(&self, source: &str, limit: i64) -> Result<Vec<SyncRun>, String>;
}

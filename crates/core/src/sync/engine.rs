//! Sync run orchestration: lease, watermark, ordered entity steps and ledger.

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::sync::Arc;

use super::ports::{AccessTokenProvider, EntitySource, IdentifierLookup, SyncLedger, UpsertWriter};
use super::transform::{parse_batch, ExternalEntity};
use super::{
    BatchResult, EntitySyncStats, ExternalContact, ExternalExpense, ExternalInvoice,
    ExternalMatter, ExternalTask, ExternalUser, ResolverContext, SyncEntity, SyncRun,
    SyncRunError, SYNC_ORDER,
};

/// Source label used when none is configured.
pub const DEFAULT_SYNC_SOURCE: &str = "matter_api";

/// A lease older than this is considered abandoned and may be taken over.
pub const DEFAULT_RUN_LEASE_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub source: String,
    pub lease_ttl_secs: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SYNC_SOURCE.to_string(),
            lease_ttl_secs: DEFAULT_RUN_LEASE_TTL_SECS,
        }
    }
}

/// Runs one full or incremental sync from the matter API into the store.
pub struct SyncOrchestrator {
    lookup: Arc<dyn IdentifierLookup>,
    writer: Arc<dyn UpsertWriter>,
    ledger: Arc<dyn SyncLedger>,
    config: SyncConfig,
}

impl SyncOrchestrator {
    pub fn new(
        lookup: Arc<dyn IdentifierLookup>,
        writer: Arc<dyn UpsertWriter>,
        ledger: Arc<dyn SyncLedger>,
        config: SyncConfig,
    ) -> Self {
        Self {
            lookup,
            writer,
            ledger,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Execute one run. Refused with `AlreadyRunning` (and nothing recorded)
    /// when another run holds the lease; otherwise exactly one run record is
    /// written and the lease is released.
    pub async fn run_sync(
        &self,
        fetcher: &dyn EntitySource,
        tokens: &dyn AccessTokenProvider,
    ) -> Result<SyncRun, SyncRunError> {
        let source = self.config.source.as_str();
        let run_id = uuid::Uuid::now_v7().to_string();

        let acquired = self
            .ledger
            .acquire_run_lease(source, &run_id, self.config.lease_ttl_secs)
            .await
            .map_err(SyncRunError::Ledger)?;
        if !acquired {
            info!(
                "[MatterSync] Run refused: another run holds the lease for '{}'",
                source
            );
            return Err(SyncRunError::AlreadyRunning {
                source_label: source.to_string(),
            });
        }

        let run = self.execute(&run_id, fetcher, tokens).await;
        let recorded = self.ledger.record_run(run.clone()).await;

        if let Err(err) = self.ledger.release_run_lease(source, &run_id).await {
            warn!(
                "[MatterSync] Failed to release run lease {} for '{}': {}",
                run_id, source, err
            );
        }

        recorded.map_err(SyncRunError::Ledger)?;
        Ok(run)
    }

    async fn execute(
        &self,
        run_id: &str,
        fetcher: &dyn EntitySource,
        tokens: &dyn AccessTokenProvider,
    ) -> SyncRun {
        let source = self.config.source.as_str();
        let mut run = SyncRun::start(run_id, source, Utc::now());

        let watermark = match self.ledger.last_successful_run(source).await {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    "[MatterSync] Could not read last successful run for '{}', running full sync: {}",
                    source, err
                );
                None
            }
        };
        run.watermark = watermark;

        let token = match tokens.get_valid_access_token().await {
            Ok(token) => token,
            Err(err) => {
                error!("[MatterSync] Run {} cannot start: {}", run_id, err);
                run.fail(Utc::now());
                return run;
            }
        };

        info!(
            "[MatterSync] Run {} started for '{}' ({})",
            run_id,
            source,
            match watermark {
                Some(since) => format!("incremental since {}", since.to_rfc3339()),
                None => "full".to_string(),
            }
        );

        for entity in SYNC_ORDER {
            let stats = self.sync_entity_step(fetcher, &token, entity, watermark).await;
            run.record_step(entity, stats);
        }

        run.finish(Utc::now());
        info!(
            "[MatterSync] Run {} finished: status={} synced={} errors={}",
            run_id, run.status, run.total_synced, run.total_errors
        );
        run
    }

    async fn sync_entity_step(
        &self,
        fetcher: &dyn EntitySource,
        token: &str,
        entity: SyncEntity,
        watermark: Option<DateTime<Utc>>,
    ) -> EntitySyncStats {
        match entity {
            SyncEntity::Case => self.sync_step::<ExternalMatter>(fetcher, token, watermark).await,
            SyncEntity::Contact => {
                self.sync_step::<ExternalContact>(fetcher, token, watermark)
                    .await
            }
            SyncEntity::User => self.sync_step::<ExternalUser>(fetcher, token, watermark).await,
            SyncEntity::Task => self.sync_step::<ExternalTask>(fetcher, token, watermark).await,
            SyncEntity::Invoice => {
                self.sync_step::<ExternalInvoice>(fetcher, token, watermark)
                    .await
            }
            SyncEntity::Expense => {
                self.sync_step::<ExternalExpense>(fetcher, token, watermark)
                    .await
            }
        }
    }

    /// Fetch, map, resolve and write one entity type. Never fails: every
    /// problem ends up in the returned error count.
    async fn sync_step<E: ExternalEntity>(
        &self,
        fetcher: &dyn EntitySource,
        token: &str,
        watermark: Option<DateTime<Utc>>,
    ) -> EntitySyncStats {
        let entity = E::ENTITY;
        let mut stats = EntitySyncStats::default();

        let raw_records = match fetcher.fetch(token, entity, watermark).await {
            Ok(records) => records,
            Err(err) => {
                error!(
                    "[MatterSync] {} step failed ({:?}): {}",
                    entity,
                    err.retry_class(),
                    err
                );
                stats.errors += 1;
                return stats;
            }
        };
        debug!("[MatterSync] Fetched {} {} records", raw_records.len(), entity);

        let (parsed, parse_errors) = parse_batch::<E>(raw_records);
        for err in &parse_errors {
            warn!("[MatterSync] {}", err);
        }
        stats.errors += parse_errors.len();

        if parsed.is_empty() {
            return stats;
        }

        let context = match ResolverContext::build(self.lookup.as_ref(), &parsed).await {
            Ok(context) => context,
            Err(err) => {
                error!(
                    "[MatterSync] {} step failed resolving references: {}",
                    entity, err
                );
                stats.errors += 1;
                return stats;
            }
        };

        let mut records = Vec::with_capacity(parsed.len());
        for external in parsed {
            match external.transform(&context) {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!("[MatterSync] {}", err);
                    stats.errors += 1;
                }
            }
        }

        if records.is_empty() {
            return stats;
        }

        let attempted = records.len();
        match self.writer.upsert_records(entity, records).await {
            Ok(BatchResult::AllSucceeded { count }) => {
                stats.synced += count;
            }
            Ok(BatchResult::PartiallyFailed { succeeded, failed }) => {
                for failure in &failed {
                    warn!(
                        "[MatterSync] Could not write {} record {}: {}",
                        entity, failure.external_id, failure.reason
                    );
                }
                stats.synced += succeeded;
                stats.errors += failed.len();
            }
            Err(err) => {
                error!(
                    "[MatterSync] {} step failed writing {} records: {}",
                    entity, attempted, err
                );
                stats.errors += attempted;
            }
        }

        debug!(
            "[MatterSync] {} step done: synced={} errors={}",
            entity, stats.synced, stats.errors
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{
        FailedRecord, FetchError, FetchErrorKind, SyncRecord, SyncRunStatus,
    };
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct TestPorts {
        pages: HashMap<SyncEntity, Vec<serde_json::Value>>,
        failing_fetch: Vec<SyncEntity>,
        rejected_ids: Vec<String>,
        token_error: Mutex<Option<String>>,
        lease_held: Mutex<bool>,
        lease_busy: bool,
        fetch_calls: Arc<Mutex<Vec<(SyncEntity, Option<DateTime<Utc>>)>>>,
        store: Mutex<HashMap<(SyncEntity, String), i64>>,
        written: Arc<Mutex<Vec<SyncRecord>>>,
        runs: Arc<Mutex<Vec<SyncRun>>>,
    }

    #[async_trait]
    impl AccessTokenProvider for TestPorts {
        async fn get_valid_access_token(&self) -> Result<String, String> {
            match self.token_error.lock().unwrap().as_ref() {
                Some(err) => Err(err.clone()),
                None => Ok("token-1".to_string()),
            }
        }
    }

    #[async_trait]
    impl EntitySource for TestPorts {
        async fn fetch(
            &self,
            token: &str,
            entity: SyncEntity,
            since: Option<DateTime<Utc>>,
        ) -> Result<Vec<serde_json::Value>, FetchError> {
            assert_eq!(token, "token-1");
            self.fetch_calls.lock().unwrap().push((entity, since));
            if self.failing_fetch.contains(&entity) {
                return Err(
                    FetchError::new(entity, FetchErrorKind::Api, "HTTP 500").with_status(500)
                );
            }
            Ok(self.pages.get(&entity).cloned().unwrap_or_default())
        }
    }

    #[async_trait]
    impl IdentifierLookup for TestPorts {
        async fn resolve_external_ids(
            &self,
            entity: SyncEntity,
            external_ids: Vec<String>,
        ) -> Result<HashMap<String, i64>, String> {
            let store = self.store.lock().unwrap();
            Ok(external_ids
                .into_iter()
                .filter_map(|id| store.get(&(entity, id.clone())).map(|v| (id, *v)))
                .collect())
        }
    }

    #[async_trait]
    impl UpsertWriter for TestPorts {
        async fn upsert_records(
            &self,
            entity: SyncEntity,
            records: Vec<SyncRecord>,
        ) -> Result<BatchResult, String> {
            let mut store = self.store.lock().unwrap();
            let mut written = self.written.lock().unwrap();
            let mut failed = Vec::new();
            let mut succeeded = 0;
            for record in records {
                let external_id = record.external_id().to_string();
                if self.rejected_ids.contains(&external_id) {
                    failed.push(FailedRecord {
                        external_id,
                        reason: "constraint violated".to_string(),
                    });
                    continue;
                }
                let next_id = store.len() as i64 + 1;
                store.entry((entity, external_id)).or_insert(next_id);
                written.push(record);
                succeeded += 1;
            }
            Ok(BatchResult::from_outcome(succeeded, failed))
        }
    }

    #[async_trait]
    impl SyncLedger for TestPorts {
        async fn acquire_run_lease(
            &self,
            _source: &str,
            _run_id: &str,
            _ttl_secs: i64,
        ) -> Result<bool, String> {
            if self.lease_busy {
                return Ok(false);
            }
            let mut held = self.lease_held.lock().unwrap();
            if *held {
                return Ok(false);
            }
            *held = true;
            Ok(true)
        }

        async fn release_run_lease(&self, _source: &str, _run_id: &str) -> Result<(), String> {
            *self.lease_held.lock().unwrap() = false;
            Ok(())
        }

        async fn last_successful_run(
            &self,
            source: &str,
        ) -> Result<Option<DateTime<Utc>>, String> {
            Ok(self
                .runs
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|run| run.source == source && run.status == SyncRunStatus::Success)
                .and_then(|run| run.completed_at))
        }

        async fn record_run(&self, run: SyncRun) -> Result<(), String> {
            self.runs.lock().unwrap().push(run);
            Ok(())
        }

        async fn list_runs(&self, _source: &str, limit: i64) -> Result<Vec<SyncRun>, String> {
            Ok(self
                .runs
                .lock()
                .unwrap()
                .iter()
                .rev()
                .take(limit as usize)
                .cloned()
                .collect())
        }
    }

    fn orchestrator(ports: &Arc<TestPorts>) -> SyncOrchestrator {
        SyncOrchestrator::new(
            ports.clone(),
            ports.clone(),
            ports.clone(),
            SyncConfig::default(),
        )
    }

    fn sample_pages() -> HashMap<SyncEntity, Vec<serde_json::Value>> {
        HashMap::from([
            (
                SyncEntity::Case,
                vec![serde_json::json!({ "id": "m-1", "display_name": "Doe v. Roe", "status": "Open" })],
            ),
            (
                SyncEntity::Contact,
                vec![serde_json::json!({ "id": "c-1", "display_name": "Jane Doe" })],
            ),
            (
                SyncEntity::User,
                vec![serde_json::json!({ "id": "u-1", "email": "lead@firm.example" })],
            ),
            (
                SyncEntity::Task,
                vec![serde_json::json!({
                    "id": "t-1",
                    "subject": "Draft complaint",
                    "matter_ref": { "id": "m-1" },
                    "assigned_to_users": [{ "id": "u-1" }]
                })],
            ),
            (
                SyncEntity::Invoice,
                vec![serde_json::json!({
                    "id": "i-1",
                    "total": 10000,
                    "total_paid": 0,
                    "total_outstanding": 10000,
                    "matter_ref": { "id": "m-1" },
                    "contact_ref": { "id": "c-1" }
                })],
            ),
            (
                SyncEntity::Expense,
                vec![serde_json::json!({ "id": "e-1", "price": 500, "matter_ref": { "id": "m-1" } })],
            ),
        ])
    }

    #[tokio::test]
    async fn full_run_syncs_every_entity_in_order() {
        let ports = Arc::new(TestPorts {
            pages: sample_pages(),
            ..Default::default()
        });

        let run = orchestrator(&ports)
            .run_sync(ports.as_ref(), ports.as_ref())
            .await
            .expect("run");

        assert_eq!(run.status, SyncRunStatus::Success);
        assert_eq!(run.total_synced, 6);
        assert_eq!(run.watermark, None);
        let fetched: Vec<SyncEntity> = ports
            .fetch_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(entity, _)| *entity)
            .collect();
        assert_eq!(fetched, SYNC_ORDER.to_vec());

        let written = ports.written.lock().unwrap();
        let task = written
            .iter()
            .find_map(|record| match record {
                SyncRecord::Task(task) => Some(task.clone()),
                _ => None,
            })
            .expect("task written");
        assert!(task.case_id.is_some());
        assert!(task.assigned_user_id.is_some());
        assert_eq!(ports.runs.lock().unwrap().len(), 1);
        assert!(!*ports.lease_held.lock().unwrap());
    }

    #[tokio::test]
    async fn failing_step_does_not_stop_later_steps() {
        let ports = Arc::new(TestPorts {
            pages: sample_pages(),
            failing_fetch: vec![SyncEntity::Task],
            ..Default::default()
        });

        let run = orchestrator(&ports)
            .run_sync(ports.as_ref(), ports.as_ref())
            .await
            .expect("run");

        assert_eq!(run.status, SyncRunStatus::Partial);
        assert_eq!(
            run.stats_for(SyncEntity::Task),
            EntitySyncStats { synced: 0, errors: 1 }
        );
        assert_eq!(
            run.stats_for(SyncEntity::Invoice),
            EntitySyncStats { synced: 1, errors: 0 }
        );
        assert_eq!(
            run.stats_for(SyncEntity::Expense),
            EntitySyncStats { synced: 1, errors: 0 }
        );
        assert_eq!(run.total_errors, 1);
    }

    #[tokio::test]
    async fn second_run_uses_previous_success_as_watermark() {
        let ports = Arc::new(TestPorts {
            pages: sample_pages(),
            ..Default::default()
        });
        let orchestrator = orchestrator(&ports);

        let first = orchestrator
            .run_sync(ports.as_ref(), ports.as_ref())
            .await
            .expect("first run");
        ports.fetch_calls.lock().unwrap().clear();
        let second = orchestrator
            .run_sync(ports.as_ref(), ports.as_ref())
            .await
            .expect("second run");

        assert_eq!(second.watermark, first.completed_at);
        let calls = ports.fetch_calls.lock().unwrap();
        assert_eq!(calls.len(), SYNC_ORDER.len());
        assert!(calls.iter().all(|(_, since)| *since == first.completed_at));
    }

    #[tokio::test]
    async fn partial_run_is_not_a_watermark() {
        let ports = Arc::new(TestPorts {
            pages: sample_pages(),
            failing_fetch: vec![SyncEntity::Contact],
            ..Default::default()
        });
        let orchestrator = orchestrator(&ports);

        orchestrator
            .run_sync(ports.as_ref(), ports.as_ref())
            .await
            .expect("first run");
        let second = orchestrator
            .run_sync(ports.as_ref(), ports.as_ref())
            .await
            .expect("second run");

        assert_eq!(second.watermark, None);
    }

    #[tokio::test]
    async fn missing_token_fails_run_without_steps() {
        let ports = Arc::new(TestPorts {
            pages: sample_pages(),
            token_error: Mutex::new(Some("No access token configured".to_string())),
            ..Default::default()
        });

        let run = orchestrator(&ports)
            .run_sync(ports.as_ref(), ports.as_ref())
            .await
            .expect("run is recorded");

        assert_eq!(run.status, SyncRunStatus::Failed);
        assert!(run.completed_at.is_some());
        assert!(ports.fetch_calls.lock().unwrap().is_empty());
        assert_eq!(ports.runs.lock().unwrap().len(), 1);
        assert!(!*ports.lease_held.lock().unwrap());
    }

    #[tokio::test]
    async fn run_after_failed_run_is_a_full_sync() {
        let ports = Arc::new(TestPorts {
            pages: sample_pages(),
            token_error: Mutex::new(Some("token expired".to_string())),
            ..Default::default()
        });
        let orchestrator = orchestrator(&ports);

        let first = orchestrator
            .run_sync(ports.as_ref(), ports.as_ref())
            .await
            .expect("first run");
        assert_eq!(first.status, SyncRunStatus::Failed);

        *ports.token_error.lock().unwrap() = None;
        let second = orchestrator
            .run_sync(ports.as_ref(), ports.as_ref())
            .await
            .expect("second run");

        assert_eq!(second.status, SyncRunStatus::Success);
        assert_eq!(second.watermark, None);
        let calls = ports.fetch_calls.lock().unwrap();
        assert_eq!(calls.len(), SYNC_ORDER.len());
        assert!(calls.iter().all(|(_, since)| since.is_none()));
    }

    #[tokio::test]
    async fn held_lease_refuses_run_without_record() {
        let ports = Arc::new(TestPorts {
            pages: sample_pages(),
            lease_busy: true,
            ..Default::default()
        });

        let err = orchestrator(&ports)
            .run_sync(ports.as_ref(), ports.as_ref())
            .await
            .expect_err("refused");

        assert!(matches!(err, SyncRunError::AlreadyRunning { .. }));
        assert!(ports.runs.lock().unwrap().is_empty());
        assert!(ports.fetch_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_and_unmappable_records_are_counted() {
        let mut pages = sample_pages();
        pages.insert(
            SyncEntity::User,
            vec![
                serde_json::json!({ "id": "u-1", "email": "lead@firm.example" }),
                serde_json::json!({ "id": "u-2" }),
            ],
        );
        pages.insert(
            SyncEntity::Case,
            vec![
                serde_json::json!({ "id": "m-1", "display_name": "Doe v. Roe" }),
                serde_json::json!({ "id": "m-2", "display_name": "Smith v. Jones" }),
            ],
        );
        let ports = Arc::new(TestPorts {
            pages,
            rejected_ids: vec!["m-2".to_string()],
            ..Default::default()
        });

        let run = orchestrator(&ports)
            .run_sync(ports.as_ref(), ports.as_ref())
            .await
            .expect("run");

        assert_eq!(
            run.stats_for(SyncEntity::Case),
            EntitySyncStats { synced: 1, errors: 1 }
        );
        assert_eq!(
            run.stats_for(SyncEntity::User),
            EntitySyncStats { synced: 1, errors: 1 }
        );
        assert_eq!(run.status, SyncRunStatus::Partial);
    }
}

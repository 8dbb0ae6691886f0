//! Run ledger and batch-write result models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::SyncEntity;

/// Lifecycle of one sync run: `running` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunStatus {
    Running,
    Success,
    Partial,
    Failed,
}

impl SyncRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncRunStatus::Running => "running",
            SyncRunStatus::Success => "success",
            SyncRunStatus::Partial => "partial",
            SyncRunStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncRunStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "running" => Ok(SyncRunStatus::Running),
            "success" => Ok(SyncRunStatus::Success),
            "partial" => Ok(SyncRunStatus::Partial),
            "failed" => Ok(SyncRunStatus::Failed),
            other => Err(format!("Unknown sync run status '{}'", other)),
        }
    }
}

/// Per-entity-type counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySyncStats {
    pub synced: usize,
    pub errors: usize,
}

/// One row of the run ledger; also the summary returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRun {
    pub id: String,
    pub source: String,
    pub status: SyncRunStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Incremental filter used by this run; `None` for a full sync.
    pub watermark: Option<DateTime<Utc>>,
    pub entity_stats: BTreeMap<SyncEntity, EntitySyncStats>,
    pub total_synced: usize,
    pub total_errors: usize,
}

impl SyncRun {
    pub fn start(id: impl Into<String>, source: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            status: SyncRunStatus::Running,
            started_at,
            completed_at: None,
            watermark: None,
            entity_stats: BTreeMap::new(),
            total_synced: 0,
            total_errors: 0,
        }
    }

    pub fn record_step(&mut self, entity: SyncEntity, stats: EntitySyncStats) {
        let entry = self.entity_stats.entry(entity).or_default();
        entry.synced += stats.synced;
        entry.errors += stats.errors;
        self.total_synced += stats.synced;
        self.total_errors += stats.errors;
    }

    /// Close a run whose steps all executed.
    pub fn finish(&mut self, completed_at: DateTime<Utc>) {
        self.status = if self.total_errors == 0 {
            SyncRunStatus::Success
        } else {
            SyncRunStatus::Partial
        };
        self.completed_at = Some(completed_at);
    }

    /// Close a run that could not begin any step.
    pub fn fail(&mut self, completed_at: DateTime<Utc>) {
        self.status = SyncRunStatus::Failed;
        self.completed_at = Some(completed_at);
    }

    pub fn stats_for(&self, entity: SyncEntity) -> EntitySyncStats {
        self.entity_stats.get(&entity).copied().unwrap_or_default()
    }
}

/// A record the writer could not persist, even on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedRecord {
    pub external_id: String,
    pub reason: String,
}

/// Outcome of writing one entity-type batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchResult {
    AllSucceeded {
        count: usize,
    },
    PartiallyFailed {
        succeeded: usize,
        failed: Vec<FailedRecord>,
    },
}

impl BatchResult {
    pub fn from_outcome(succeeded: usize, failed: Vec<FailedRecord>) -> Self {
        if failed.is_empty() {
            BatchResult::AllSucceeded { count: succeeded }
        } else {
            BatchResult::PartiallyFailed { succeeded, failed }
        }
    }

    pub fn succeeded(&self) -> usize {
        match self {
            BatchResult::AllSucceeded { count } => *count,
            BatchResult::PartiallyFailed { succeeded, .. } => *succeeded,
        }
    }

    pub fn failed(&self) -> &[FailedRecord] {
        match self {
            BatchResult::AllSucceeded { .. } => &[],
            BatchResult::PartiallyFailed { failed, .. } => failed,
        }
    }
}

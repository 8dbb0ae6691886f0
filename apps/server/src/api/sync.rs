//! Matter sync endpoints: trigger a run, list run history, current status.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use docketsync_core::sync::{SyncEntity, SyncRun, SYNC_ORDER};

use crate::error::{ApiError, ApiResult};
use crate::main_lib::AppState;

const DEFAULT_RUNS_LIMIT: i64 = 20;
const MAX_RUNS_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct RunsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusResponse {
    pub source: String,
    pub running: bool,
    pub last_run: Option<SyncRun>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub scheduler_enabled: bool,
    pub sync_interval_secs: u64,
    pub synced_counts: BTreeMap<SyncEntity, i64>,
}

async fn run_sync(State(state): State<Arc<AppState>>) -> ApiResult<Json<SyncRun>> {
    info!("[MatterSync] Manual sync run requested");
    let run = state.run_sync().await?;
    Ok(Json(run))
}

async fn list_runs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RunsQuery>,
) -> ApiResult<Json<Vec<SyncRun>>> {
    let limit = query.limit.unwrap_or(DEFAULT_RUNS_LIMIT);
    if !(1..=MAX_RUNS_LIMIT).contains(&limit) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_RUNS_LIMIT
        )));
    }
    let runs = state.ledger.get_runs(&state.config.source, limit)?;
    Ok(Json(runs))
}

async fn get_status(State(state): State<Arc<AppState>>) -> ApiResult<Json<SyncStatusResponse>> {
    let source = state.config.source.clone();
    let now = Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
    let running = state
        .ledger
        .get_lease(&source)?
        .map(|lease| lease.expires_at > now)
        .unwrap_or(false);
    let last_run = state.ledger.get_runs(&source, 1)?.into_iter().next();
    let last_success_at = state.ledger.last_success_completed_at(&source)?;

    let mut synced_counts = BTreeMap::new();
    for entity in SYNC_ORDER {
        match state.records.count_synced(entity) {
            Ok(count) => {
                synced_counts.insert(entity, count);
            }
            Err(err) => warn!("Failed to count synced {} rows: {}", entity, err),
        }
    }

    Ok(Json(SyncStatusResponse {
        source,
        running,
        last_run,
        last_success_at,
        scheduler_enabled: state.config.scheduler_enabled(),
        sync_interval_secs: state.config.sync_interval_secs,
        synced_counts,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sync/run", post(run_sync))
        .route("/sync/runs", get(list_runs))
        .route("/sync/status", get(get_status))
}

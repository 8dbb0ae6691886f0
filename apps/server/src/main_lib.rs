//! Application state wiring: storage, matter client and orchestrator.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

use docketsync_core::sync::ports::AccessTokenProvider;
use docketsync_core::sync::{SyncOrchestrator, SyncRun, SyncRunError};
use docketsync_matter_client::MatterApiClient;
use docketsync_storage_sqlite::db::{self, spawn_writer};
use docketsync_storage_sqlite::{SyncLedgerRepository, SyncRecordRepository};

use crate::api;
use crate::config::AppConfig;
use crate::token::StaticTokenProvider;

pub struct AppState {
    pub config: AppConfig,
    pub orchestrator: SyncOrchestrator,
    pub client: MatterApiClient,
    pub tokens: Arc<dyn AccessTokenProvider>,
    pub ledger: Arc<SyncLedgerRepository>,
    pub records: Arc<SyncRecordRepository>,
    pub scheduler_task: Mutex<Option<JoinHandle<()>>>,
}

impl AppState {
    /// One sync run against the configured matter API.
    pub async fn run_sync(&self) -> Result<SyncRun, SyncRunError> {
        self.orchestrator
            .run_sync(&self.client, self.tokens.as_ref())
            .await
    }
}

pub async fn build_state(config: AppConfig) -> anyhow::Result<Arc<AppState>> {
    let data_dir = config.data_dir.to_string_lossy().to_string();
    let db_path = db::init(&data_dir).context("Failed to prepare data directory")?;
    db::run_migrations(&db_path).context("Failed to run database migrations")?;
    let pool = db::create_pool(&db_path).context("Failed to open database pool")?;
    let writer = spawn_writer(pool.as_ref().clone());
    info!("Database ready at {}", db_path);

    let records = Arc::new(SyncRecordRepository::new(pool.clone(), writer.clone()));
    let ledger = Arc::new(SyncLedgerRepository::new(pool, writer));
    let client =
        MatterApiClient::new(config.client_config()).context("Failed to create matter API client")?;
    let tokens: Arc<dyn AccessTokenProvider> =
        Arc::new(StaticTokenProvider::new(config.matter_api_token.clone()));

    let orchestrator = SyncOrchestrator::new(
        records.clone(),
        records.clone(),
        ledger.clone(),
        config.sync_config(),
    );

    Ok(Arc::new(AppState {
        config,
        orchestrator,
        client,
        tokens,
        ledger,
        records,
        scheduler_task: Mutex::new(None),
    }))
}

pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api/v1", api::router())
        .with_state(state)
}

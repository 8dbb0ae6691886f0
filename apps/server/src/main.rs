//! Docketsync server: HTTP API plus the optional periodic matter sync.

mod api;
mod config;
mod error;
mod main_lib;
mod scheduler;
mod token;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::main_lib::{app_router, build_state};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env()?;
    let listen_addr = config.listen_addr;
    let state = build_state(config).await?;

    scheduler::start(state.clone()).await;

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!("Docketsync server listening on {}", listen_addr);
    axum::serve(listener, app_router(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler::stop(&state).await;
    Ok(())
}

//! Periodic sync runs with jitter and failure backoff.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, info, warn};

use docketsync_core::sync::{SyncRunError, SyncRunStatus};

use crate::main_lib::AppState;

/// Maximum jitter (seconds) added to each scheduled interval.
pub const SYNC_INTERVAL_JITTER_SECS: u64 = 30;

/// Floor for the first retry after a failed run.
pub const MIN_RETRY_DELAY_SECS: u64 = 15;
/// The first retry waits this fraction of the sync interval.
const FIRST_RETRY_DIVISOR: u64 = 8;

/// Wait after `consecutive_failures` failed runs in a row: an eighth of the
/// interval, doubling on each further failure, never longer than the interval.
pub fn failure_delay_secs(interval_secs: u64, consecutive_failures: u32) -> u64 {
    let first = (interval_secs / FIRST_RETRY_DIVISOR).max(MIN_RETRY_DELAY_SECS);
    let doublings = consecutive_failures.saturating_sub(1).min(16);
    first
        .saturating_mul(1_u64 << doublings)
        .min(interval_secs)
}

/// Delay before the next scheduled run, jitter included.
pub fn next_delay(interval_secs: u64, consecutive_failures: u32, jitter_secs: u64) -> Duration {
    let base = if consecutive_failures > 0 {
        failure_delay_secs(interval_secs, consecutive_failures)
    } else {
        interval_secs
    };
    Duration::from_secs(base.saturating_add(jitter_secs))
}

fn random_jitter_secs() -> u64 {
    rand::thread_rng().gen_range(0..=SYNC_INTERVAL_JITTER_SECS)
}

/// Spawn the scheduler loop unless it is disabled or already running.
pub async fn start(state: Arc<AppState>) {
    if !state.config.scheduler_enabled() {
        info!("[MatterSync] Scheduler disabled (interval 0)");
        return;
    }

    let mut guard = state.scheduler_task.lock().await;
    if let Some(handle) = guard.as_ref() {
        if !handle.is_finished() {
            return;
        }
        guard.take();
    }

    let interval_secs = state.config.sync_interval_secs;
    let loop_state = Arc::clone(&state);
    let handle = tokio::spawn(async move {
        let mut consecutive_failures: u32 = 0;
        loop {
            match loop_state.run_sync().await {
                Ok(run) if run.status == SyncRunStatus::Failed => {
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    warn!(
                        "[MatterSync] Scheduled run {} failed ({} in a row)",
                        run.id, consecutive_failures
                    );
                }
                Ok(run) => {
                    consecutive_failures = 0;
                    debug!(
                        "[MatterSync] Scheduled run {} complete status={} synced={} errors={}",
                        run.id, run.status, run.total_synced, run.total_errors
                    );
                }
                Err(SyncRunError::AlreadyRunning { .. }) => {
                    debug!("[MatterSync] Scheduled run skipped: another run in progress");
                }
                Err(err) => {
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    warn!("[MatterSync] Scheduled run error: {}", err);
                }
            }

            let delay = next_delay(interval_secs, consecutive_failures, random_jitter_secs());
            debug!("[MatterSync] Next scheduled run in {}s", delay.as_secs());
            tokio::time::sleep(delay).await;
        }
    });
    *guard = Some(handle);
    info!(
        "[MatterSync] Scheduler started (every {}s + up to {}s jitter)",
        interval_secs, SYNC_INTERVAL_JITTER_SECS
    );
}

pub async fn stop(state: &AppState) {
    let mut guard = state.scheduler_task.lock().await;
    if let Some(handle) = guard.take() {
        handle.abort();
        info!("[MatterSync] Scheduler stopped");
    }
}

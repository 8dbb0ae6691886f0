//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};
use docketsync_core::sync::{SyncConfig, DEFAULT_RUN_LEASE_TTL_SECS, DEFAULT_SYNC_SOURCE};
use docketsync_matter_client::client::DEFAULT_MIN_REQUEST_INTERVAL_MS;
use docketsync_matter_client::MatterClientConfig;

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8088";
/// Scheduler cadence when unset; 0 disables the scheduler.
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 15 * 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub listen_addr: SocketAddr,
    pub matter_api_url: String,
    pub matter_api_token: Option<String>,
    pub source: String,
    pub sync_interval_secs: u64,
    pub min_request_interval: Duration,
    pub lease_ttl_secs: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; values are trimmed and blanks count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let matter_api_url = get("MATTER_API_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .ok_or_else(|| anyhow!("MATTER_API_URL must be set"))?;

        let listen_addr = get("DOCKETSYNC_LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("DOCKETSYNC_LISTEN_ADDR is not a socket address")?;

        let sync_interval_secs = match get("DOCKETSYNC_SYNC_INTERVAL_SECS") {
            Some(value) => value
                .parse::<u64>()
                .context("DOCKETSYNC_SYNC_INTERVAL_SECS must be a whole number of seconds")?,
            None => DEFAULT_SYNC_INTERVAL_SECS,
        };

        let min_request_interval = match get("DOCKETSYNC_MIN_REQUEST_INTERVAL_MS") {
            Some(value) => Duration::from_millis(
                value
                    .parse::<u64>()
                    .context("DOCKETSYNC_MIN_REQUEST_INTERVAL_MS must be a whole number")?,
            ),
            None => Duration::from_millis(DEFAULT_MIN_REQUEST_INTERVAL_MS),
        };

        let lease_ttl_secs = match get("DOCKETSYNC_LEASE_TTL_SECS") {
            Some(value) => value
                .parse::<i64>()
                .context("DOCKETSYNC_LEASE_TTL_SECS must be a whole number")?,
            None => DEFAULT_RUN_LEASE_TTL_SECS,
        };

        Ok(Self {
            data_dir: PathBuf::from(
                get("DOCKETSYNC_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
            ),
            listen_addr,
            matter_api_url,
            matter_api_token: get("MATTER_API_TOKEN"),
            source: get("DOCKETSYNC_SOURCE").unwrap_or_else(|| DEFAULT_SYNC_SOURCE.to_string()),
            sync_interval_secs,
            min_request_interval,
            lease_ttl_secs,
        })
    }

    pub fn scheduler_enabled(&self) -> bool {
        self.sync_interval_secs > 0
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            source: self.source.clone(),
            lease_ttl_secs: self.lease_ttl_secs,
        }
    }

    pub fn client_config(&self) -> MatterClientConfig {
        MatterClientConfig::new(self.matter_api_url.clone())
            .with_min_request_interval(self.min_request_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[("MATTER_API_URL", " https://matters.example/api/ ")])
            .expect("config");
        assert_eq!(config.matter_api_url, "https://matters.example/api");
        assert_eq!(config.source, DEFAULT_SYNC_SOURCE);
        assert_eq!(config.sync_interval_secs, DEFAULT_SYNC_INTERVAL_SECS);
        assert_eq!(config.matter_api_token, None);
        assert_eq!(config.listen_addr.to_string(), DEFAULT_LISTEN_ADDR);
        assert!(config.scheduler_enabled());
    }

    #[test]
    fn zero_interval_disables_scheduler() {
        let config = config_from(&[
            ("MATTER_API_URL", "https://matters.example"),
            ("DOCKETSYNC_SYNC_INTERVAL_SECS", "0"),
            ("MATTER_API_TOKEN", "  "),
            ("DOCKETSYNC_SOURCE", "firm_a"),
        ])
        .expect("config");
        assert!(!config.scheduler_enabled());
        assert_eq!(config.matter_api_token, None);
        assert_eq!(config.sync_config().source, "firm_a");
    }

    #[test]
    fn missing_api_url_is_rejected() {
        assert!(config_from(&[]).is_err());
        assert!(config_from(&[
            ("MATTER_API_URL", "https://matters.example"),
            ("DOCKETSYNC_SYNC_INTERVAL_SECS", "soon"),
        ])
        .is_err());
    }
}

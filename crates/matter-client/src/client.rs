//! Matter API client: bearer-authenticated, paginated list endpoints.
//!
//! GET {base}/{resource}?offset=&limit=[&updated_since=]

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use docketsync_core::sync::ports::EntitySource;
use docketsync_core::sync::{FetchError, SyncEntity};

use crate::error::{MatterApiError, Result};
use crate::types::{has_more_pages, ApiErrorResponse, PageEnvelope};

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default minimum spacing between two page requests.
pub const DEFAULT_MIN_REQUEST_INTERVAL_MS: u64 = 250;
const MAX_LOG_BODY_CHARS: usize = 512;

/// Page size the API accepts for each resource.
pub fn default_page_size(entity: SyncEntity) -> i64 {
    match entity {
        SyncEntity::Contact => 50,
        SyncEntity::Case | SyncEntity::User | SyncEntity::Invoice => 100,
        SyncEntity::Expense => 200,
        SyncEntity::Task => 500,
    }
}

#[derive(Debug, Clone)]
pub struct MatterClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub page_sizes: BTreeMap<SyncEntity, i64>,
    /// Rate limit: no two page requests start closer together than this.
    pub min_request_interval: Duration,
}

impl MatterClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            page_sizes: BTreeMap::new(),
            min_request_interval: Duration::from_millis(DEFAULT_MIN_REQUEST_INTERVAL_MS),
        }
    }

    pub fn with_min_request_interval(mut self, interval: Duration) -> Self {
        self.min_request_interval = interval;
        self
    }

    pub fn page_size(&self, entity: SyncEntity) -> i64 {
        self.page_sizes
            .get(&entity)
            .copied()
            .filter(|size| *size > 0)
            .unwrap_or_else(|| default_page_size(entity))
    }
}

/// Client for the matter-management list API.
#[derive(Debug)]
pub struct MatterApiClient {
    client: reqwest::Client,
    config: MatterClientConfig,
    last_request: Mutex<Option<Instant>>,
}

impl MatterApiClient {
    pub fn new(mut config: MatterClientConfig) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(MatterApiError::invalid_request(format!(
                "Matter API URL must be http(s): '{}'",
                config.base_url
            )));
        }
        config.base_url = base_url;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            config,
            last_request: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &MatterClientConfig {
        &self.config
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("[MatterApi] Response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("[MatterApi] Response error ({}): {}", status, preview);
    }

    fn headers(token: &str) -> Result<HeaderMap> {
        let token = token.trim();
        if token.is_empty() {
            return Err(MatterApiError::auth("No access token provided"));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| MatterApiError::auth("Invalid access token format"))?;
        headers.insert(AUTHORIZATION, auth_value);
        Ok(headers)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                let message = match error.code {
                    Some(code) => format!("{}: {}", code, error.message),
                    None => error.message,
                };
                return Err(MatterApiError::api(status.as_u16(), message));
            }
            return Err(MatterApiError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            ));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Build the list URL for one page.
    pub fn page_url(
        &self,
        entity: SyncEntity,
        offset: i64,
        limit: i64,
        since: Option<DateTime<Utc>>,
    ) -> String {
        let mut url = format!(
            "{}/{}?offset={}&limit={}",
            self.config.base_url,
            entity.api_resource(),
            offset,
            limit
        );
        if let Some(since) = since {
            let since = since.to_rfc3339_opts(SecondsFormat::Secs, true);
            url.push_str("&updated_since=");
            url.push_str(&urlencoding::encode(&since));
        }
        url
    }

    /// Wait until the minimum request interval has elapsed since the last call.
    async fn throttle(&self) {
        let mut last_request = self.last_request.lock().await;
        if let Some(previous) = *last_request {
            let wait = remaining_delay(previous.elapsed(), self.config.min_request_interval);
            if !wait.is_zero() {
                sleep(wait).await;
            }
        }
        *last_request = Some(Instant::now());
    }

    /// Fetch a single page.
    pub async fn list_page(
        &self,
        token: &str,
        entity: SyncEntity,
        offset: i64,
        limit: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<PageEnvelope> {
        let headers = Self::headers(token)?;
        let url = self.page_url(entity, offset, limit, since);
        self.throttle().await;
        debug!("[MatterApi] GET {}", url);

        let response = self.client.get(&url).headers(headers).send().await?;
        Self::parse_response(response).await
    }

    /// Fetch every page of `entity`, in order.
    pub async fn fetch_all(
        &self,
        token: &str,
        entity: SyncEntity,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<serde_json::Value>> {
        let page_limit = self.config.page_size(entity);
        let mut offset: i64 = 0;
        let mut records = Vec::new();

        loop {
            let page = self
                .list_page(token, entity, offset, page_limit, since)
                .await?;

            let received = page.data.len() as i64;
            if received == 0 {
                break;
            }
            records.extend(page.data);

            let next_offset = offset + received;
            let has_more = has_more_pages(page.pagination.as_ref(), next_offset, received);
            offset = next_offset;

            if !has_more {
                break;
            }
        }

        info!(
            "[MatterApi] Fetched {} {} records ({})",
            records.len(),
            entity.api_resource(),
            if since.is_some() { "incremental" } else { "full" }
        );
        Ok(records)
    }
}

/// Time still to wait so that `interval` separates two requests.
fn remaining_delay(elapsed: Duration, interval: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

#[async_trait]
impl EntitySource for MatterApiClient {
    async fn fetch(
        &self,
        token: &str,
        entity: SyncEntity,
        since: Option<DateTime<Utc>>,
    ) -> std::result::Result<Vec<serde_json::Value>, FetchError> {
        self.fetch_all(token, entity, since)
            .await
            .map_err(|err| err.into_fetch_error(entity))
    }
}

//! Per-record, per-step and per-run failures of a sync.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::SyncEntity;

/// A single external record that could not be mapped to its internal shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Cannot transform {entity} record {}: {reason}",
    .external_id.as_deref().unwrap_or("<unknown>")
)]
pub struct TransformError {
    pub entity: SyncEntity,
    pub external_id: Option<String>,
    pub reason: String,
}

impl TransformError {
    pub fn new(entity: SyncEntity, external_id: Option<&str>, reason: impl Into<String>) -> Self {
        Self {
            entity,
            external_id: external_id.map(str::to_string),
            reason: reason.into(),
        }
    }
}

/// What went wrong while fetching one entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Missing or rejected bearer token
    Auth,
    /// Connection, timeout or body read failure
    Transport,
    /// Non-success HTTP status from the API
    Api,
    /// Response body was not the expected envelope
    Decode,
}

/// What a failed step means for the next scheduled run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRetryClass {
    /// The API asked us to slow down (429)
    RateLimited,
    /// Network trouble or a server-side error; the next run may succeed
    Transient,
    /// The token is missing, expired or lacks access to the resource
    ReauthRequired,
    /// Retrying the same request will fail the same way
    Permanent,
}

/// Failure reaching the matter API for one entity-type step.
#[derive(Debug, Clone, Error)]
#[error("Failed to fetch {entity} records: {message}")]
pub struct FetchError {
    pub entity: SyncEntity,
    pub kind: FetchErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl FetchError {
    pub fn new(entity: SyncEntity, kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            entity,
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn retry_class(&self) -> SyncRetryClass {
        match (self.kind, self.status) {
            (FetchErrorKind::Auth, _) | (_, Some(401 | 403)) => SyncRetryClass::ReauthRequired,
            (_, Some(429)) => SyncRetryClass::RateLimited,
            (_, Some(408 | 500..=599)) => SyncRetryClass::Transient,
            (FetchErrorKind::Transport, _) => SyncRetryClass::Transient,
            (FetchErrorKind::Api | FetchErrorKind::Decode, _) => SyncRetryClass::Permanent,
        }
    }
}

/// Reasons a sync run is refused or cannot be recorded.
#[derive(Debug, Error)]
pub enum SyncRunError {
    /// Another run holds the lease for this source
    #[error("A sync run is already in progress for source '{source_label}'")]
    AlreadyRunning { source_label: String },

    /// The run ledger could not be read or written
    #[error("Sync ledger error: {0}")]
    Ledger(String),
}

//! Error types for the matter API client.

use docketsync_core::sync::{FetchError, FetchErrorKind, SyncEntity};
use thiserror::Error;

/// Result type alias for matter API operations.
pub type Result<T> = std::result::Result<T, MatterApiError>;

/// Errors that can occur while talking to the matter API.
#[derive(Debug, Error)]
pub enum MatterApiError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success response from the API
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid request (bad base URL, malformed parameters)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication error (missing or malformed token)
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl MatterApiError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Convert into the orchestrator's per-step fetch failure.
    pub fn into_fetch_error(self, entity: SyncEntity) -> FetchError {
        let kind = match &self {
            Self::Auth(_) => FetchErrorKind::Auth,
            Self::Api { status: 401 | 403, .. } => FetchErrorKind::Auth,
            Self::Api { .. } | Self::InvalidRequest(_) => FetchErrorKind::Api,
            Self::Http(_) => FetchErrorKind::Transport,
            Self::Json(_) => FetchErrorKind::Decode,
        };
        let status = self.status_code();
        let error = FetchError::new(entity, kind, self.to_string());
        match status {
            Some(status) => error.with_status(status),
            None => error,
        }
    }
}

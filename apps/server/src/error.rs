//! HTTP error type for API handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use docketsync_core::sync::SyncRunError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("API error: {}", self);
        }
        let body = ErrorBody {
            code: status.as_u16(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<SyncRunError> for ApiError {
    fn from(err: SyncRunError) -> Self {
        match err {
            SyncRunError::AlreadyRunning { .. } => ApiError::Conflict(err.to_string()),
            SyncRunError::Ledger(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<docketsync_core::Error> for ApiError {
    fn from(err: docketsync_core::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

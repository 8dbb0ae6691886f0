//! REST endpoints.

mod sync;

use std::sync::Arc;

use axum::Router;

use crate::main_lib::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().merge(sync::router())
}

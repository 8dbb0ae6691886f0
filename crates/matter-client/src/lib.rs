//! Client for the external matter-management API.
//!
//! Lists every synchronized resource page by page with bearer authentication
//! and plugs into the sync orchestrator as its `EntitySource`.

pub mod client;
pub mod error;
pub mod types;

pub use client::{MatterApiClient, MatterClientConfig};
pub use error::{MatterApiError, Result};
pub use types::{ApiErrorResponse, PageEnvelope, Pagination};

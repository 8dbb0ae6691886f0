//! Docketsync core: domain records, per-entity transformers and the sync orchestrator.
//!
//! Storage and transport live in their own crates and plug in through the
//! port traits in [`sync::ports`].

pub mod errors;
pub mod sync;
pub mod utils;

pub use errors::{DatabaseError, Error, Result};

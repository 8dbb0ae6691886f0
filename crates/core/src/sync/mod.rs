//! Matter API synchronization: entity model, transformers, ports and orchestration.

mod engine;
mod errors;
mod external_model;
mod record_model;
mod resolver;
mod run_model;
mod sync_entity;

pub mod ports;
pub mod transform;

pub use engine::*;
pub use errors::*;
pub use external_model::*;
pub use record_model::*;
pub use resolver::ResolverContext;
pub use run_model::*;
pub use sync_entity::*;

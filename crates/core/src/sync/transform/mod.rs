//! Pure per-type mapping from matter API records to internal records.

mod case;
mod contact;
mod expense;
mod invoice;
mod task;
mod user;

pub use case::map_case_status;
pub use contact::classify_account;
pub use invoice::derive_invoice_status;
pub use task::{map_task_priority, map_task_status};

use serde::de::DeserializeOwned;

use super::{ResolverContext, SyncEntity, SyncRecord, TransformError};

/// An external record type the sync knows how to map.
pub trait ExternalEntity: DeserializeOwned + Send + Sync {
    const ENTITY: SyncEntity;

    fn external_id(&self) -> &str;

    /// Foreign references this record makes, as `(entity type, external id)`.
    fn references(&self) -> Vec<(SyncEntity, &str)> {
        Vec::new()
    }

    fn transform(self, context: &ResolverContext) -> Result<SyncRecord, TransformError>;
}

/// Decode one raw API record into its typed external shape.
pub fn parse_record<E: ExternalEntity>(raw: serde_json::Value) -> Result<E, TransformError> {
    let external_id = raw.get("id").and_then(|id| match id {
        serde_json::Value::String(value) => Some(value.clone()),
        serde_json::Value::Number(value) => Some(value.to_string()),
        _ => None,
    });
    serde_json::from_value::<E>(raw)
        .map_err(|err| TransformError::new(E::ENTITY, external_id.as_deref(), err.to_string()))
}

/// Decode a page of raw records, keeping the ones that parse.
pub fn parse_batch<E: ExternalEntity>(
    raw_records: Vec<serde_json::Value>,
) -> (Vec<E>, Vec<TransformError>) {
    let mut parsed = Vec::with_capacity(raw_records.len());
    let mut errors = Vec::new();
    for raw in raw_records {
        match parse_record::<E>(raw) {
            Ok(record) => parsed.push(record),
            Err(err) => errors.push(err),
        }
    }
    (parsed, errors)
}

/// Trimmed, non-empty text or `None`.
pub(crate) fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

//! Per-step bulk resolution of external foreign keys.

use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::ports::IdentifierLookup;
use super::transform::ExternalEntity;
use super::{ExternalRef, SyncEntity};

/// Index of `(entity type, external id) -> internal id` for one batch.
///
/// Built once per entity-type step with one lookup per referenced type, then
/// consulted by the transformers without further round-trips.
#[derive(Debug, Clone, Default)]
pub struct ResolverContext {
    index: HashMap<SyncEntity, HashMap<String, i64>>,
}

impl ResolverContext {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Collect every reference made by `batch` and resolve them in bulk.
    pub async fn build<E: ExternalEntity>(
        lookup: &dyn IdentifierLookup,
        batch: &[E],
    ) -> Result<Self, String> {
        let mut wanted: BTreeMap<SyncEntity, BTreeSet<String>> = BTreeMap::new();
        for record in batch {
            for (entity, external_id) in record.references() {
                wanted
                    .entry(entity)
                    .or_default()
                    .insert(external_id.to_string());
            }
        }

        let mut context = Self::empty();
        for (entity, external_ids) in wanted {
            let requested = external_ids.len();
            let found = lookup
                .resolve_external_ids(entity, external_ids.into_iter().collect())
                .await?;
            debug!(
                "[MatterSync] Resolved {}/{} {} references for {} batch",
                found.len(),
                requested,
                entity,
                E::ENTITY
            );
            context.insert_all(entity, found);
        }
        Ok(context)
    }

    pub fn insert(&mut self, entity: SyncEntity, external_id: impl Into<String>, internal_id: i64) {
        self.index
            .entry(entity)
            .or_default()
            .insert(external_id.into(), internal_id);
    }

    fn insert_all(&mut self, entity: SyncEntity, ids: HashMap<String, i64>) {
        self.index.entry(entity).or_default().extend(ids);
    }

    pub fn resolve(&self, entity: SyncEntity, external_id: &str) -> Option<i64> {
        self.index.get(&entity)?.get(external_id).copied()
    }

    /// Resolve an optional reference; unresolved or absent yields `None`.
    pub fn resolve_ref(&self, entity: SyncEntity, reference: Option<&ExternalRef>) -> Option<i64> {
        let reference = reference?;
        let resolved = self.resolve(entity, &reference.id);
        if resolved.is_none() {
            debug!(
                "[MatterSync] Unresolved {} reference '{}'",
                entity, reference.id
            );
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::ExternalTask;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingLookup {
        known: HashMap<(SyncEntity, String), i64>,
        calls: Mutex<Vec<(SyncEntity, Vec<String>)>>,
    }

    #[async_trait]
    impl IdentifierLookup for RecordingLookup {
        async fn resolve_external_ids(
            &self,
            entity: SyncEntity,
            external_ids: Vec<String>,
        ) -> Result<HashMap<String, i64>, String> {
            self.calls
                .lock()
                .unwrap()
                .push((entity, external_ids.clone()));
            Ok(external_ids
                .into_iter()
                .filter_map(|id| {
                    self.known
                        .get(&(entity, id.clone()))
                        .map(|internal| (id, *internal))
                })
                .collect())
        }
    }

    fn task(id: &str, matter: Option<&str>, user: Option<&str>) -> ExternalTask {
        let mut value = serde_json::json!({ "id": id });
        if let Some(matter) = matter {
            value["matter_ref"] = serde_json::json!({ "id": matter });
        }
        if let Some(user) = user {
            value["assigned_to_users"] = serde_json::json!([{ "id": user }]);
        }
        serde_json::from_value(value).expect("task")
    }

    #[tokio::test]
    async fn one_lookup_per_referenced_type() {
        let lookup = RecordingLookup {
            known: HashMap::from([((SyncEntity::Case, "m-1".to_string()), 10)]),
            calls: Mutex::new(Vec::new()),
        };
        let batch = vec![
            task("t-1", Some("m-1"), Some("u-1")),
            task("t-2", Some("m-1"), None),
            task("t-3", Some("m-404"), None),
        ];

        let context = ResolverContext::build(&lookup, &batch).await.expect("build");

        let calls = lookup.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            (
                SyncEntity::Case,
                vec!["m-1".to_string(), "m-404".to_string()]
            )
        );
        assert_eq!(calls[1], (SyncEntity::User, vec!["u-1".to_string()]));
        assert_eq!(context.resolve(SyncEntity::Case, "m-1"), Some(10));
        assert_eq!(context.resolve(SyncEntity::Case, "m-404"), None);
        assert_eq!(context.resolve(SyncEntity::User, "u-1"), None);
    }

    #[tokio::test]
    async fn batch_without_references_skips_lookup() {
        let lookup = RecordingLookup {
            known: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        };
        let batch = vec![task("t-1", None, None)];

        ResolverContext::build(&lookup, &batch).await.expect("build");

        assert!(lookup.calls.lock().unwrap().is_empty());
    }
}

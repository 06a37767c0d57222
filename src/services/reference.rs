//! Reference service: attaches terms to external entities.
//!
//! References are written with replace semantics. Setting `(term, namespace,
//! entities)` first removes the existing triples for those entities and then
//! inserts them again, inside one unit of work, so repeating a set is
//! idempotent and a failed set leaves the previous references untouched.

use std::collections::{HashMap, HashSet};

use crate::context::{AppReferences, AppTransactions, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::models::{
    EntityTerms, NamespaceId, NewReference, Reference, ReferenceFilter, ReferenceQuery, Term,
    TermId,
};
use crate::services::finish;
use crate::services::namespace::NamespaceService;
use crate::services::term::TermService;

#[derive(FromContext, Clone)]
pub struct ReferenceService {
    references: AppReferences,
    namespaces: NamespaceService,
    terms: TermService,
    transactions: AppTransactions,
}

impl ReferenceService {
    /// Attaches `term_id` to each entity in `namespace`.
    ///
    /// Duplicate entity ids keep their first occurrence.
    pub async fn create(
        &self,
        term_id: TermId,
        namespace: &str,
        entity_ids: Vec<String>,
    ) -> Result<Vec<Reference>, AppError> {
        let (namespace_id, entity_ids) = self.resolve(term_id, namespace, entity_ids).await?;
        if entity_ids.is_empty() {
            return Ok(Vec::new());
        }

        let new: Vec<NewReference> = entity_ids
            .iter()
            .map(|entity_id| NewReference {
                term_id,
                namespace_id,
                entity_id: entity_id.clone(),
            })
            .collect();

        let uow = self.transactions.begin().await?;
        let result = async {
            uow.references()
                .delete(term_id, namespace_id, &entity_ids)
                .await?;
            uow.references().create(&new).await
        }
        .await
        .map_err(|e| AppError::not_created("reference", e));
        let created = finish(uow, result).await?;

        tracing::info!(
            term = %term_id,
            namespace,
            count = created.len(),
            "Set references"
        );
        Ok(created)
    }

    /// Detaches `term_id` from each entity in `namespace`, returning how many
    /// references were removed.
    pub async fn delete(
        &self,
        term_id: TermId,
        namespace: &str,
        entity_ids: Vec<String>,
    ) -> Result<u64, AppError> {
        let (namespace_id, entity_ids) = self.resolve(term_id, namespace, entity_ids).await?;
        if entity_ids.is_empty() {
            return Ok(0);
        }

        let uow = self.transactions.begin().await?;
        let result = uow
            .references()
            .delete(term_id, namespace_id, &entity_ids)
            .await
            .map_err(|e| AppError::not_deleted("reference", term_id.get(), e));
        let removed = finish(uow, result).await?;

        tracing::info!(term = %term_id, namespace, removed, "Unset references");
        Ok(removed)
    }

    /// Lists references matching `filter` in ascending id order.
    pub async fn get(&self, filter: &ReferenceFilter) -> Result<Vec<Reference>, AppError> {
        let namespace_ids = self.namespaces.resolve(&filter.namespaces).await?;

        let query = ReferenceQuery {
            term_groups: filter.term_groups.clone(),
            term_ids: Vec::new(),
            namespace_ids,
            entity_ids: filter.entity_ids.clone(),
            after: filter.after,
            limit: filter.limit,
        };

        tracing::debug!(
            groups = query.term_groups.len(),
            namespaces = query.namespace_ids.len(),
            entities = query.entity_ids.len(),
            "Filtering references"
        );
        self.references.get(&query).await
    }

    /// Returns the terms attached to each entity, in the order the entities
    /// were given. Entities without terms are left out.
    pub async fn get_terms_by_entities(
        &self,
        namespace: &str,
        entity_ids: &[String],
    ) -> Result<Vec<EntityTerms>, AppError> {
        if entity_ids.is_empty() {
            return Ok(Vec::new());
        }

        let namespace_id = self.namespaces.get_by_name(namespace).await?.id;
        let references = self
            .references
            .get(&ReferenceQuery {
                namespace_ids: vec![namespace_id],
                entity_ids: entity_ids.to_vec(),
                ..Default::default()
            })
            .await?;

        let mut resolved: HashMap<TermId, Option<Term>> = HashMap::new();
        let mut by_entity: HashMap<&str, Vec<Term>> = HashMap::new();

        for reference in &references {
            if !resolved.contains_key(&reference.term_id) {
                let term = match self.terms.get_by_id(reference.term_id).await {
                    Ok(term) => Some(term),
                    Err(err) => {
                        tracing::warn!(
                            term = %reference.term_id,
                            entity = %reference.entity_id,
                            error = %err,
                            "Skipping reference with unresolvable term"
                        );
                        None
                    }
                };
                resolved.insert(reference.term_id, term);
            }

            if let Some(Some(term)) = resolved.get(&reference.term_id) {
                by_entity
                    .entry(reference.entity_id.as_str())
                    .or_default()
                    .push(term.clone());
            }
        }

        let mut seen = HashSet::new();
        Ok(entity_ids
            .iter()
            .filter(|entity_id| seen.insert(entity_id.as_str()))
            .filter_map(|entity_id| {
                by_entity.remove(entity_id.as_str()).map(|terms| EntityTerms {
                    entity_id: entity_id.clone(),
                    terms,
                })
            })
            .collect())
    }

    /// Resolves the namespace, checks the term and normalizes entity ids.
    async fn resolve(
        &self,
        term_id: TermId,
        namespace: &str,
        entity_ids: Vec<String>,
    ) -> Result<(NamespaceId, Vec<String>), AppError> {
        let namespace_id = self.namespaces.get_by_name(namespace).await?.id;
        self.terms.get_by_id(term_id).await?;
        Ok((namespace_id, normalize(entity_ids)?))
    }
}

/// Rejects empty entity ids and drops repeated ones, keeping the first.
fn normalize(entity_ids: Vec<String>) -> Result<Vec<String>, AppError> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(entity_ids.len());

    for entity_id in entity_ids {
        if entity_id.is_empty() {
            return Err(AppError::Validation(
                "entity id must not be empty".to_string(),
            ));
        }
        if seen.insert(entity_id.clone()) {
            unique.push(entity_id);
        }
    }

    Ok(unique)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::config::Config;
    use crate::di::FromRef;
    use crate::error::ErrorKind;
    use crate::models::{NamespaceInput, TermFilter, TermInput, VocabularyInput};
    use crate::repositories::{
        MemoryStore, NamespaceRepository, ReferenceRepository, TermRepository,
        TransactionProvider, UnitOfWork, VocabularyRepository,
    };
    use crate::services::{NamespaceService, TermService, VocabularyService};

    struct Fixture {
        store: MemoryStore,
        references: ReferenceService,
        oled: TermId,
        ips: TermId,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let ctx = Context::from_store(store.clone(), Config::default());

        NamespaceService::from_ref(&ctx)
            .create(NamespaceInput {
                name: "catalog".into(),
                title: "Catalog".into(),
            })
            .await
            .unwrap();
        let matrix = VocabularyService::from_ref(&ctx)
            .create(VocabularyInput {
                name: "matrix".into(),
                title: "Matrix type".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let terms = TermService::from_ref(&ctx);
        let mut ids = Vec::new();
        for name in ["oled", "ips"] {
            let term = terms
                .create(TermInput {
                    name: name.into(),
                    title: name.to_uppercase(),
                    vocabulary_ids: vec![matrix.id],
                    ..Default::default()
                })
                .await
                .unwrap();
            ids.push(term.id);
        }

        Fixture {
            references: ReferenceService::from_ref(&ctx),
            store,
            oled: ids[0],
            ips: ids[1],
        }
    }

    fn entities(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    async fn entity_ids(references: &ReferenceService, term: TermId) -> Vec<String> {
        let mut ids: Vec<String> = references
            .get(&ReferenceFilter {
                term_groups: vec![vec![term]],
                ..Default::default()
            })
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.entity_id)
            .collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_set_deduplicates_first_occurrence_wins() {
        let f = fixture().await;
        let created = f
            .references
            .create(f.oled, "catalog", entities(&["dellX", "dellX", "asusX"]))
            .await
            .unwrap();

        let order: Vec<_> = created.iter().map(|r| r.entity_id.as_str()).collect();
        assert_eq!(order, ["dellX", "asusX"]);
        assert_eq!(entity_ids(&f.references, f.oled).await, ["asusX", "dellX"]);
    }

    #[tokio::test]
    async fn test_set_is_idempotent() {
        let f = fixture().await;
        for _ in 0..3 {
            f.references
                .create(f.oled, "catalog", entities(&["dellX"]))
                .await
                .unwrap();
        }
        assert_eq!(entity_ids(&f.references, f.oled).await, ["dellX"]);
    }

    #[tokio::test]
    async fn test_set_validates_inputs() {
        let f = fixture().await;

        let err = f
            .references
            .create(f.oled, "blog", entities(&["dellX"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NamespaceNotFound(name) if name == "blog"));

        let err = f
            .references
            .create(TermId(999), "catalog", entities(&["dellX"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TermNotFound(TermId(999))));

        let err = f
            .references
            .create(f.oled, "catalog", entities(&["dellX", ""]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
        assert!(entity_ids(&f.references, f.oled).await.is_empty());
    }

    #[tokio::test]
    async fn test_unset_removes_named_triples_only() {
        let f = fixture().await;
        f.references
            .create(f.oled, "catalog", entities(&["dellX", "asusX"]))
            .await
            .unwrap();
        f.references
            .create(f.ips, "catalog", entities(&["dellX"]))
            .await
            .unwrap();

        let removed = f
            .references
            .delete(f.oled, "catalog", entities(&["dellX", "missing"]))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(entity_ids(&f.references, f.oled).await, ["asusX"]);
        assert_eq!(entity_ids(&f.references, f.ips).await, ["dellX"]);
    }

    #[tokio::test]
    async fn test_get_rejects_unknown_namespace() {
        let f = fixture().await;
        let err = f
            .references
            .get(&ReferenceFilter {
                namespaces: vec!["catalog".into(), "blog".into()],
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_terms_by_entities_keeps_caller_order() {
        let f = fixture().await;
        f.references
            .create(f.oled, "catalog", entities(&["asusX", "dellX"]))
            .await
            .unwrap();
        f.references
            .create(f.ips, "catalog", entities(&["dellX"]))
            .await
            .unwrap();

        let result = f
            .references
            .get_terms_by_entities("catalog", &entities(&["dellX", "nobody", "asusX"]))
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].entity_id, "dellX");
        let dell: Vec<_> = result[0].terms.iter().map(|t| t.id).collect();
        assert_eq!(dell, vec![f.oled, f.ips]);
        assert_eq!(result[1].entity_id, "asusX");

        assert!(f
            .references
            .get_terms_by_entities("catalog", &[])
            .await
            .unwrap()
            .is_empty());
    }

    /// Wraps a store but fails every reference insert.
    struct FailingInserts {
        store: MemoryStore,
    }

    struct FailingUnitOfWork {
        inner: Box<dyn UnitOfWork>,
    }

    struct FailingReferences<'a> {
        inner: Box<dyn ReferenceRepository + 'a>,
    }

    #[async_trait]
    impl ReferenceRepository for FailingReferences<'_> {
        async fn create(&self, _: &[NewReference]) -> Result<Vec<Reference>, AppError> {
            Err(AppError::Constraint("insert rejected".into()))
        }

        async fn delete(
            &self,
            term: TermId,
            namespace: NamespaceId,
            entity_ids: &[String],
        ) -> Result<u64, AppError> {
            self.inner.delete(term, namespace, entity_ids).await
        }

        async fn get(&self, query: &ReferenceQuery) -> Result<Vec<Reference>, AppError> {
            self.inner.get(query).await
        }
    }

    #[async_trait]
    impl UnitOfWork for FailingUnitOfWork {
        fn namespaces(&self) -> Box<dyn NamespaceRepository + '_> {
            self.inner.namespaces()
        }

        fn vocabularies(&self) -> Box<dyn VocabularyRepository + '_> {
            self.inner.vocabularies()
        }

        fn terms(&self) -> Box<dyn TermRepository + '_> {
            self.inner.terms()
        }

        fn references(&self) -> Box<dyn ReferenceRepository + '_> {
            Box::new(FailingReferences {
                inner: self.inner.references(),
            })
        }

        async fn commit(self: Box<Self>) -> Result<(), AppError> {
            self.inner.commit().await
        }

        async fn rollback(self: Box<Self>) -> Result<(), AppError> {
            self.inner.rollback().await
        }
    }

    #[async_trait]
    impl TransactionProvider for FailingInserts {
        async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AppError> {
            Ok(Box::new(FailingUnitOfWork {
                inner: self.store.begin().await?,
            }))
        }
    }

    #[tokio::test]
    async fn test_failed_insert_rolls_back_and_keeps_prior_references() {
        let f = fixture().await;
        f.references
            .create(f.oled, "catalog", entities(&["dellX"]))
            .await
            .unwrap();

        let store = f.store.clone();
        let failing = Context::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(FailingInserts { store }),
            Config::default(),
        );
        let references = ReferenceService::from_ref(&failing);

        let err = references
            .create(f.oled, "catalog", entities(&["dellX", "asusX"]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotCreated);
        assert!(matches!(err.root(), AppError::Constraint(_)));

        assert_eq!(entity_ids(&f.references, f.oled).await, ["dellX"]);
    }

    /// Term storage that fails every lookup touching one id.
    struct UnreadableTerm {
        store: MemoryStore,
        broken: TermId,
    }

    #[async_trait]
    impl TermRepository for UnreadableTerm {
        async fn create(&self, input: &TermInput) -> Result<Term, AppError> {
            TermRepository::create(&self.store, input).await
        }

        async fn update(&self, term: &Term) -> Result<Term, AppError> {
            TermRepository::update(&self.store, term).await
        }

        async fn delete(&self, id: TermId) -> Result<(), AppError> {
            TermRepository::delete(&self.store, id).await
        }

        async fn get(&self, filter: &TermFilter) -> Result<Vec<Term>, AppError> {
            if filter.ids.contains(&self.broken) {
                return Err(AppError::Internal("connection reset".into()));
            }
            TermRepository::get(&self.store, filter).await
        }
    }

    #[tokio::test]
    async fn test_terms_by_entities_skips_unresolvable_terms() {
        let f = fixture().await;
        f.references
            .create(f.oled, "catalog", entities(&["dellX", "asusX"]))
            .await
            .unwrap();
        f.references
            .create(f.ips, "catalog", entities(&["dellX", "lenovoA"]))
            .await
            .unwrap();

        let store = f.store.clone();
        let flaky = Context::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(UnreadableTerm {
                store: store.clone(),
                broken: f.ips,
            }),
            Arc::new(store.clone()),
            Arc::new(store),
            Config::default(),
        );

        let result = ReferenceService::from_ref(&flaky)
            .get_terms_by_entities("catalog", &entities(&["dellX", "lenovoA", "asusX"]))
            .await
            .unwrap();

        let summary: Vec<(&str, Vec<TermId>)> = result
            .iter()
            .map(|e| (e.entity_id.as_str(), e.terms.iter().map(|t| t.id).collect()))
            .collect();
        assert_eq!(
            summary,
            vec![("dellX", vec![f.oled]), ("asusX", vec![f.oled])]
        );
    }
}

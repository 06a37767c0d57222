//! In-memory repositories.
//!
//! [`MemoryStore`] implements every repository trait plus
//! [`TransactionProvider`] over a single shared state. It mirrors the
//! constraints of the PostgreSQL schema (unique names, foreign keys, restrict
//! on delete) so services behave the same on both backends.
//!
//! A unit of work holds the store's write lock for its whole life and works on
//! a snapshot; commit swaps the snapshot in, rollback drops it. Calls made
//! directly on the store wait until the unit of work finishes.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::error::AppError;
use crate::models::{
    Namespace, NamespaceFilter, NamespaceId, NamespaceInput, NewReference, ParentFilter,
    Reference, ReferenceId, ReferenceQuery, Term, TermFilter, TermId, TermInput, Vocabulary,
    VocabularyFilter, VocabularyId, VocabularyInput,
};
use crate::repositories::traits::{
    NamespaceRepository, ReferenceRepository, TermRepository, TransactionProvider, UnitOfWork,
    VocabularyRepository,
};

#[derive(Debug, Clone, Default)]
struct Sequences {
    namespace: i64,
    vocabulary: i64,
    term: i64,
    reference: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    namespaces: BTreeMap<NamespaceId, Namespace>,
    vocabularies: BTreeMap<VocabularyId, Vocabulary>,
    /// Terms with empty relation sets; relations live in `relations`.
    terms: BTreeMap<TermId, Term>,
    /// `(super, sub)` pairs.
    relations: BTreeSet<(TermId, TermId)>,
    references: BTreeMap<ReferenceId, Reference>,
    sequences: Sequences,
}

impl MemoryState {
    fn hydrate(&self, term: &Term) -> Term {
        let id = term.id;
        let mut term = term.clone();
        term.super_term_ids = self
            .relations
            .iter()
            .filter(|(_, sub)| *sub == id)
            .map(|(sup, _)| *sup)
            .collect();
        term.sub_term_ids = self
            .relations
            .iter()
            .filter(|(sup, _)| *sup == id)
            .map(|(_, sub)| *sub)
            .collect();
        term
    }

    fn check_namespace_name(&self, name: &str, except: Option<NamespaceId>) -> Result<(), AppError> {
        if self
            .namespaces
            .values()
            .any(|n| n.name == name && Some(n.id) != except)
        {
            return Err(unique("namespaces_name_key", name));
        }
        Ok(())
    }

    fn check_vocabulary_slot(
        &self,
        name: &str,
        parent: Option<VocabularyId>,
        except: Option<VocabularyId>,
    ) -> Result<(), AppError> {
        if let Some(parent) = parent {
            if !self.vocabularies.contains_key(&parent) {
                return Err(AppError::Constraint(format!(
                    "parent vocabulary {} does not exist",
                    parent
                )));
            }
        }
        if self
            .vocabularies
            .values()
            .any(|v| v.name == name && v.parent_id == parent && Some(v.id) != except)
        {
            return Err(unique("vocabularies_name_parent_key", name));
        }
        Ok(())
    }

    fn check_term_links(
        &self,
        id: Option<TermId>,
        vocabulary_ids: &[VocabularyId],
        super_term_ids: &[TermId],
        sub_term_ids: &[TermId],
    ) -> Result<(), AppError> {
        if vocabulary_ids.is_empty() {
            return Err(AppError::Validation(
                "a term must belong to at least one vocabulary".into(),
            ));
        }
        if let Some(missing) = vocabulary_ids
            .iter()
            .find(|v| !self.vocabularies.contains_key(*v))
        {
            return Err(AppError::Constraint(format!(
                "vocabulary {} does not exist",
                missing
            )));
        }
        for related in super_term_ids.iter().chain(sub_term_ids) {
            if Some(*related) == id {
                return Err(AppError::Constraint(format!(
                    "term {} cannot be related to itself",
                    related
                )));
            }
            if !self.terms.contains_key(related) {
                return Err(AppError::Constraint(format!(
                    "term {} does not exist",
                    related
                )));
            }
        }
        Ok(())
    }

    fn link_term(&mut self, id: TermId, super_term_ids: &[TermId], sub_term_ids: &[TermId]) {
        self.relations.retain(|(sup, sub)| *sup != id && *sub != id);
        self.relations
            .extend(super_term_ids.iter().map(|sup| (*sup, id)));
        self.relations.extend(sub_term_ids.iter().map(|sub| (id, *sub)));
    }

    /// Whether `reference` satisfies every filter of `query`.
    fn matches(&self, reference: &Reference, query: &ReferenceQuery) -> bool {
        if !query.term_ids.is_empty() && !query.term_ids.contains(&reference.term_id) {
            return false;
        }
        if !query.namespace_ids.is_empty() && !query.namespace_ids.contains(&reference.namespace_id)
        {
            return false;
        }
        if !query.entity_ids.is_empty() && !query.entity_ids.contains(&reference.entity_id) {
            return false;
        }

        query.term_groups.iter().all(|group| {
            self.references.values().any(|other| {
                other.entity_id == reference.entity_id
                    && group.contains(&other.term_id)
                    && (query.namespace_ids.is_empty()
                        || query.namespace_ids.contains(&other.namespace_id))
            })
        })
    }
}

fn unique(constraint: &str, value: &str) -> AppError {
    AppError::UniqueViolation {
        constraint: Some(constraint.to_string()),
        message: format!("duplicate key value violates unique constraint: {}", value),
    }
}

/// Applies keyset and offset pagination over an id-ordered sequence.
fn page<K: Ord + Copy, T>(
    items: impl Iterator<Item = (K, T)>,
    after: Option<K>,
    offset: Option<usize>,
    limit: Option<usize>,
) -> Vec<T> {
    items
        .filter(|(id, _)| after.map_or(true, |after| *id > after))
        .skip(offset.unwrap_or(0))
        .take(limit.unwrap_or(usize::MAX))
        .map(|(_, item)| item)
        .collect()
}

/// Shared in-memory storage implementing all repositories.
///
/// Cloning yields another handle to the same state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn detached(state: MemoryState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }
}

#[async_trait]
impl NamespaceRepository for MemoryStore {
    async fn create(&self, input: &NamespaceInput) -> Result<Namespace, AppError> {
        let mut state = self.state.write().await;
        state.check_namespace_name(&input.name, None)?;

        let namespace = Namespace {
            id: NamespaceId(next(&mut state.sequences.namespace)),
            name: input.name.clone(),
            title: input.title.clone(),
        };
        state.namespaces.insert(namespace.id, namespace.clone());
        Ok(namespace)
    }

    async fn update(&self, namespace: &Namespace) -> Result<Namespace, AppError> {
        let mut state = self.state.write().await;
        if !state.namespaces.contains_key(&namespace.id) {
            return Err(AppError::NamespaceNotFound(namespace.id.to_string()));
        }
        state.check_namespace_name(&namespace.name, Some(namespace.id))?;

        state.namespaces.insert(namespace.id, namespace.clone());
        Ok(namespace.clone())
    }

    async fn delete(&self, id: NamespaceId) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if state.references.values().any(|r| r.namespace_id == id) {
            return Err(AppError::Constraint(format!(
                "namespace {} is still referenced",
                id
            )));
        }
        state
            .namespaces
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NamespaceNotFound(id.to_string()))
    }

    async fn get(&self, filter: &NamespaceFilter) -> Result<Vec<Namespace>, AppError> {
        let state = self.state.read().await;
        let items = state
            .namespaces
            .values()
            .filter(|n| filter.ids.is_empty() || filter.ids.contains(&n.id))
            .filter(|n| filter.names.is_empty() || filter.names.contains(&n.name))
            .map(|n| (n.id, n.clone()));
        Ok(page(items, filter.after, None, filter.limit))
    }
}

#[async_trait]
impl VocabularyRepository for MemoryStore {
    async fn create(&self, input: &VocabularyInput) -> Result<Vocabulary, AppError> {
        let mut state = self.state.write().await;
        state.check_vocabulary_slot(&input.name, input.parent_id, None)?;

        let vocabulary = Vocabulary {
            id: VocabularyId(next(&mut state.sequences.vocabulary)),
            name: input.name.clone(),
            title: input.title.clone(),
            description: input.description.clone(),
            parent_id: input.parent_id,
        };
        state.vocabularies.insert(vocabulary.id, vocabulary.clone());
        Ok(vocabulary)
    }

    async fn update(&self, vocabulary: &Vocabulary) -> Result<Vocabulary, AppError> {
        let mut state = self.state.write().await;
        if !state.vocabularies.contains_key(&vocabulary.id) {
            return Err(AppError::VocabularyNotFound(vocabulary.id));
        }
        state.check_vocabulary_slot(&vocabulary.name, vocabulary.parent_id, Some(vocabulary.id))?;

        state.vocabularies.insert(vocabulary.id, vocabulary.clone());
        Ok(vocabulary.clone())
    }

    async fn delete(&self, id: VocabularyId) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if state.terms.values().any(|t| t.vocabulary_ids.contains(&id)) {
            return Err(AppError::Constraint(format!(
                "vocabulary {} still has terms",
                id
            )));
        }
        if state.vocabularies.values().any(|v| v.parent_id == Some(id)) {
            return Err(AppError::Constraint(format!(
                "vocabulary {} still has child vocabularies",
                id
            )));
        }
        state
            .vocabularies
            .remove(&id)
            .map(|_| ())
            .ok_or(AppError::VocabularyNotFound(id))
    }

    async fn get(&self, filter: &VocabularyFilter) -> Result<Vec<Vocabulary>, AppError> {
        let state = self.state.read().await;
        let items = state
            .vocabularies
            .values()
            .filter(|v| filter.ids.is_empty() || filter.ids.contains(&v.id))
            .filter(|v| filter.name.as_ref().map_or(true, |name| &v.name == name))
            .filter(|v| match filter.parent {
                None => true,
                Some(ParentFilter::Root) => v.parent_id.is_none(),
                Some(ParentFilter::Of(parent)) => v.parent_id == Some(parent),
            })
            .map(|v| (v.id, v.clone()));
        Ok(page(items, filter.after, None, filter.limit))
    }
}

#[async_trait]
impl TermRepository for MemoryStore {
    async fn create(&self, input: &TermInput) -> Result<Term, AppError> {
        let mut state = self.state.write().await;
        state.check_term_links(
            None,
            &input.vocabulary_ids,
            &input.super_term_ids,
            &input.sub_term_ids,
        )?;

        let id = TermId(next(&mut state.sequences.term));
        let term = Term {
            id,
            name: input.name.clone(),
            title: input.title.clone(),
            description: input.description.clone(),
            vocabulary_ids: dedup(&input.vocabulary_ids),
            super_term_ids: Vec::new(),
            sub_term_ids: Vec::new(),
        };
        state.terms.insert(id, term.clone());
        state.link_term(id, &input.super_term_ids, &input.sub_term_ids);
        Ok(state.hydrate(&term))
    }

    async fn update(&self, term: &Term) -> Result<Term, AppError> {
        let mut state = self.state.write().await;
        if !state.terms.contains_key(&term.id) {
            return Err(AppError::TermNotFound(term.id));
        }
        state.check_term_links(
            Some(term.id),
            &term.vocabulary_ids,
            &term.super_term_ids,
            &term.sub_term_ids,
        )?;

        let stored = Term {
            vocabulary_ids: dedup(&term.vocabulary_ids),
            super_term_ids: Vec::new(),
            sub_term_ids: Vec::new(),
            ..term.clone()
        };
        state.terms.insert(term.id, stored.clone());
        state.link_term(term.id, &term.super_term_ids, &term.sub_term_ids);
        Ok(state.hydrate(&stored))
    }

    async fn delete(&self, id: TermId) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if state.references.values().any(|r| r.term_id == id) {
            return Err(AppError::Constraint(format!("term {} is still referenced", id)));
        }
        state.terms.remove(&id).ok_or(AppError::TermNotFound(id))?;
        state.relations.retain(|(sup, sub)| *sup != id && *sub != id);
        Ok(())
    }

    async fn get(&self, filter: &TermFilter) -> Result<Vec<Term>, AppError> {
        let state = self.state.read().await;
        let items = state
            .terms
            .values()
            .filter(|t| filter.ids.is_empty() || filter.ids.contains(&t.id))
            .filter(|t| {
                filter.vocabulary_ids.is_empty()
                    || t.vocabulary_ids
                        .iter()
                        .any(|v| filter.vocabulary_ids.contains(v))
            })
            .filter(|t| {
                filter
                    .super_term
                    .map_or(true, |sup| state.relations.contains(&(sup, t.id)))
            })
            .filter(|t| {
                filter
                    .sub_term
                    .map_or(true, |sub| state.relations.contains(&(t.id, sub)))
            })
            .filter(|t| filter.name.as_ref().map_or(true, |name| &t.name == name))
            .map(|t| (t.id, state.hydrate(t)));
        Ok(page(items, filter.after, filter.offset, filter.limit))
    }
}

#[async_trait]
impl ReferenceRepository for MemoryStore {
    async fn create(&self, references: &[NewReference]) -> Result<Vec<Reference>, AppError> {
        let mut state = self.state.write().await;
        let mut created = Vec::with_capacity(references.len());

        for new in references {
            if !state.terms.contains_key(&new.term_id) {
                return Err(AppError::Constraint(format!(
                    "term {} does not exist",
                    new.term_id
                )));
            }
            if !state.namespaces.contains_key(&new.namespace_id) {
                return Err(AppError::Constraint(format!(
                    "namespace {} does not exist",
                    new.namespace_id
                )));
            }
            if state.references.values().any(|r| {
                r.term_id == new.term_id
                    && r.namespace_id == new.namespace_id
                    && r.entity_id == new.entity_id
            }) {
                return Err(unique("term_references_term_namespace_entity_key", &new.entity_id));
            }

            let reference = Reference {
                id: ReferenceId(next(&mut state.sequences.reference)),
                term_id: new.term_id,
                namespace_id: new.namespace_id,
                entity_id: new.entity_id.clone(),
                created_at: Utc::now(),
            };
            state.references.insert(reference.id, reference.clone());
            created.push(reference);
        }

        Ok(created)
    }

    async fn delete(
        &self,
        term: TermId,
        namespace: NamespaceId,
        entity_ids: &[String],
    ) -> Result<u64, AppError> {
        let mut state = self.state.write().await;
        let before = state.references.len();
        state.references.retain(|_, r| {
            !(r.term_id == term && r.namespace_id == namespace && entity_ids.contains(&r.entity_id))
        });
        Ok((before - state.references.len()) as u64)
    }

    async fn get(&self, query: &ReferenceQuery) -> Result<Vec<Reference>, AppError> {
        let state = self.state.read().await;
        let items = state
            .references
            .values()
            .filter(|r| state.matches(r, query))
            .map(|r| (r.id, r.clone()));
        Ok(page(items, query.after, None, query.limit))
    }
}

fn dedup<T: Ord + Copy>(ids: &[T]) -> Vec<T> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Unit of work over a snapshot of a [`MemoryStore`].
struct MemoryUnitOfWork {
    guard: OwnedRwLockWriteGuard<MemoryState>,
    working: MemoryStore,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    fn namespaces(&self) -> Box<dyn NamespaceRepository + '_> {
        Box::new(self.working.clone())
    }

    fn vocabularies(&self) -> Box<dyn VocabularyRepository + '_> {
        Box::new(self.working.clone())
    }

    fn terms(&self) -> Box<dyn TermRepository + '_> {
        Box::new(self.working.clone())
    }

    fn references(&self) -> Box<dyn ReferenceRepository + '_> {
        Box::new(self.working.clone())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemoryUnitOfWork { mut guard, working } = *self;
        *guard = std::mem::take(&mut *working.state.write().await);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        Ok(())
    }
}

#[async_trait]
impl TransactionProvider for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AppError> {
        let guard = self.state.clone().write_owned().await;
        let working = MemoryStore::detached((*guard).clone());
        Ok(Box::new(MemoryUnitOfWork { guard, working }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (MemoryStore, Vocabulary, Namespace) {
        let store = MemoryStore::new();
        let vocabulary = VocabularyRepository::create(
            &store,
            &VocabularyInput {
                name: "matrix".into(),
                title: "Matrix type".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let namespace = NamespaceRepository::create(
            &store,
            &NamespaceInput {
                name: "catalog".into(),
                title: "Catalog".into(),
            },
        )
        .await
        .unwrap();
        (store, vocabulary, namespace)
    }

    fn term_input(name: &str, vocabulary: VocabularyId) -> TermInput {
        TermInput {
            name: name.into(),
            title: name.to_uppercase(),
            vocabulary_ids: vec![vocabulary],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_namespace_name_is_unique() {
        let (store, _, _) = seeded().await;
        let err = NamespaceRepository::create(
            &store,
            &NamespaceInput {
                name: "catalog".into(),
                title: String::new(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_vocabulary_name_is_unique_per_parent() {
        let (store, root, _) = seeded().await;
        let child = VocabularyInput {
            name: "matrix".into(),
            title: "Nested".into(),
            parent_id: Some(root.id),
            ..Default::default()
        };
        // same name under a different parent is fine
        VocabularyRepository::create(&store, &child).await.unwrap();
        let err = VocabularyRepository::create(&store, &child).await.unwrap_err();
        assert!(matches!(err, AppError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_term_without_vocabulary_is_rejected() {
        let (store, _, _) = seeded().await;
        let err = TermRepository::create(
            &store,
            &TermInput {
                name: "orphan".into(),
                title: "Orphan".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_term_relations_are_symmetric() {
        let (store, vocabulary, _) = seeded().await;
        let display = TermRepository::create(&store, &term_input("display", vocabulary.id))
            .await
            .unwrap();
        let oled = TermRepository::create(
            &store,
            &TermInput {
                super_term_ids: vec![display.id],
                ..term_input("oled", vocabulary.id)
            },
        )
        .await
        .unwrap();

        assert_eq!(oled.super_term_ids, vec![display.id]);
        let subs = TermRepository::get(
            &store,
            &TermFilter {
                super_term: Some(display.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].id, oled.id);

        let display = TermRepository::get(&store, &TermFilter::by_id(display.id))
            .await
            .unwrap();
        assert_eq!(display[0].sub_term_ids, vec![oled.id]);
    }

    #[tokio::test]
    async fn test_duplicate_reference_is_a_unique_violation() {
        let (store, vocabulary, namespace) = seeded().await;
        let term = TermRepository::create(&store, &term_input("oled", vocabulary.id))
            .await
            .unwrap();
        let new = NewReference {
            term_id: term.id,
            namespace_id: namespace.id,
            entity_id: "dellX".into(),
        };

        ReferenceRepository::create(&store, &[new.clone()]).await.unwrap();
        let err = ReferenceRepository::create(&store, &[new]).await.unwrap_err();
        assert!(matches!(err, AppError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_pagination_after_and_limit() {
        let (store, _, _) = seeded().await;
        for name in ["a", "b", "c", "d"] {
            NamespaceRepository::create(
                &store,
                &NamespaceInput {
                    name: name.into(),
                    title: String::new(),
                },
            )
            .await
            .unwrap();
        }

        let page = NamespaceRepository::get(
            &store,
            &NamespaceFilter {
                after: Some(NamespaceId(2)),
                limit: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let names: Vec<_> = page.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_unit_of_work_commit_and_rollback() {
        let (store, _, _) = seeded().await;

        let uow = store.begin().await.unwrap();
        uow.namespaces()
            .create(&NamespaceInput {
                name: "discarded".into(),
                title: String::new(),
            })
            .await
            .unwrap();
        uow.rollback().await.unwrap();

        let uow = store.begin().await.unwrap();
        uow.namespaces()
            .create(&NamespaceInput {
                name: "kept".into(),
                title: String::new(),
            })
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let names: Vec<_> = NamespaceRepository::get(&store, &NamespaceFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.name)
            .collect();
        assert_eq!(names, vec!["catalog", "kept"]);
    }
}

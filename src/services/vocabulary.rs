//! Vocabulary service.

use std::collections::HashSet;

use crate::context::{AppTransactions, AppVocabularies, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::models::{
    Patch, TermFilter, Vocabulary, VocabularyFilter, VocabularyId, VocabularyInput,
    VocabularyPatch,
};
use crate::repositories::UnitOfWork;
use crate::services::namespace::single;
use crate::services::{finish, require};

/// Manages the vocabulary tree.
#[derive(FromContext, Clone)]
pub struct VocabularyService {
    vocabularies: AppVocabularies,
    transactions: AppTransactions,
}

impl VocabularyService {
    pub async fn create(&self, input: VocabularyInput) -> Result<Vocabulary, AppError> {
        require("name", &input.name)?;
        require("title", &input.title)?;

        if let Some(parent) = input.parent_id {
            self.get_by_id(parent).await?;
        }

        let vocabulary = self.vocabularies.create(&input).await.map_err(|e| {
            AppError::not_created("vocabulary", e.or_duplicate("vocabulary", &input.name))
        })?;

        tracing::info!(
            id = %vocabulary.id,
            name = %vocabulary.name,
            parent = ?vocabulary.parent_id,
            "Created vocabulary"
        );
        Ok(vocabulary)
    }

    /// Applies `patch` to the vocabulary.
    ///
    /// A new parent must exist, must not be the vocabulary itself and must
    /// not have the vocabulary among its ancestors.
    pub async fn update(
        &self,
        id: VocabularyId,
        patch: VocabularyPatch,
    ) -> Result<Vocabulary, AppError> {
        if let Some(name) = &patch.name {
            require("name", name)?;
        }
        if let Some(title) = &patch.title {
            require("title", title)?;
        }

        let current = self.get_by_id(id).await?;

        if let Patch::Set(parent) = patch.parent_id {
            if parent == id {
                return Err(AppError::SelfParent(id));
            }
            self.check_ancestry(id, parent).await?;
        }

        let merged = patch.merge(current);
        let vocabulary = self.vocabularies.update(&merged).await.map_err(|e| {
            AppError::not_updated("vocabulary", id.get(), e.or_duplicate("vocabulary", &merged.name))
        })?;

        tracing::info!(id = %vocabulary.id, parent = ?vocabulary.parent_id, "Updated vocabulary");
        Ok(vocabulary)
    }

    /// Walks up from `parent` and fails if `id` is met on the way.
    async fn check_ancestry(&self, id: VocabularyId, parent: VocabularyId) -> Result<(), AppError> {
        let mut visited = HashSet::new();
        let mut cursor = Some(self.get_by_id(parent).await?);

        while let Some(ancestor) = cursor {
            if ancestor.id == id {
                return Err(AppError::ParentCycle { id, parent });
            }
            if !visited.insert(ancestor.id) {
                tracing::warn!(id = %ancestor.id, "Vocabulary ancestry already loops");
                break;
            }
            cursor = match ancestor.parent_id {
                Some(next) => Some(self.get_by_id(next).await?),
                None => None,
            };
        }

        Ok(())
    }

    /// Deletes a vocabulary that owns no terms.
    pub async fn delete(&self, id: VocabularyId) -> Result<(), AppError> {
        let uow = self.transactions.begin().await?;
        let result = Self::delete_in(uow.as_ref(), id).await;
        finish(uow, result).await?;

        tracing::info!(id = %id, "Deleted vocabulary");
        Ok(())
    }

    async fn delete_in(uow: &dyn UnitOfWork, id: VocabularyId) -> Result<(), AppError> {
        single(uow.vocabularies().get(&VocabularyFilter::by_id(id)).await?)
            .ok_or(AppError::VocabularyNotFound(id))?;

        let guard = TermFilter {
            limit: Some(1),
            ..TermFilter::by_vocabulary(id)
        };
        if !uow.terms().get(&guard).await?.is_empty() {
            return Err(AppError::VocabularyHasTerms(id));
        }

        uow.vocabularies()
            .delete(id)
            .await
            .map_err(|e| AppError::not_deleted("vocabulary", id.get(), e))
    }

    pub async fn get_by_id(&self, id: VocabularyId) -> Result<Vocabulary, AppError> {
        tracing::debug!(id = %id, "Looking up vocabulary");
        single(self.vocabularies.get(&VocabularyFilter::by_id(id)).await?)
            .ok_or(AppError::VocabularyNotFound(id))
    }

    pub async fn get(&self, filter: &VocabularyFilter) -> Result<Vec<Vocabulary>, AppError> {
        self.vocabularies.get(filter).await
    }

    /// Fails with `VocabularyNotFound` on the first id that does not exist.
    pub async fn ensure_exists(&self, ids: &[VocabularyId]) -> Result<(), AppError> {
        for &id in ids {
            self.get_by_id(id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::di::FromRef;
    use crate::error::ErrorKind;
    use crate::models::{ParentFilter, TermInput};
    use crate::repositories::{MemoryStore, TermRepository};

    fn service(store: &MemoryStore) -> VocabularyService {
        VocabularyService::from_ref(&Context::from_store(store.clone(), Config::default()))
    }

    fn input(name: &str, parent_id: Option<VocabularyId>) -> VocabularyInput {
        VocabularyInput {
            name: name.into(),
            title: name.to_uppercase(),
            description: None,
            parent_id,
        }
    }

    fn reparent(parent: VocabularyId) -> VocabularyPatch {
        VocabularyPatch {
            parent_id: Patch::Set(parent),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_requires_existing_parent() {
        let vocabularies = service(&MemoryStore::new());
        let err = vocabularies
            .create(input("ram", Some(VocabularyId(42))))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::VocabularyNotFound(VocabularyId(42))));
    }

    #[tokio::test]
    async fn test_create_requires_title() {
        let vocabularies = service(&MemoryStore::new());
        let err = vocabularies
            .create(VocabularyInput {
                name: "ram".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    }

    #[tokio::test]
    async fn test_same_name_under_same_parent_is_duplicate() {
        let vocabularies = service(&MemoryStore::new());
        let hardware = vocabularies.create(input("hardware", None)).await.unwrap();
        vocabularies
            .create(input("ram", Some(hardware.id)))
            .await
            .unwrap();

        let err = vocabularies
            .create(input("ram", Some(hardware.id)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotCreated);
        assert!(matches!(err.root(), AppError::DuplicateName { .. }));

        // same name at the root is a different slot
        vocabularies.create(input("ram", None)).await.unwrap();
    }

    #[tokio::test]
    async fn test_self_parent_is_rejected() {
        let vocabularies = service(&MemoryStore::new());
        let color = vocabularies.create(input("color", None)).await.unwrap();

        let err = vocabularies
            .update(color.id, reparent(color.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SelfParent(id) if id == color.id));
    }

    #[tokio::test]
    async fn test_valid_reparent_and_move_to_root() {
        let vocabularies = service(&MemoryStore::new());
        let display = vocabularies.create(input("display", None)).await.unwrap();
        let matrix = vocabularies.create(input("matrix", None)).await.unwrap();

        let moved = vocabularies
            .update(matrix.id, reparent(display.id))
            .await
            .unwrap();
        assert_eq!(moved.parent_id, Some(display.id));

        let children = vocabularies
            .get(&VocabularyFilter {
                parent: Some(ParentFilter::Of(display.id)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(children, vec![moved]);

        let root = vocabularies
            .update(
                matrix.id,
                VocabularyPatch {
                    parent_id: Patch::Clear,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(root.parent_id, None);
        assert_eq!(root.title, "MATRIX");
    }

    #[tokio::test]
    async fn test_ancestor_cycle_is_rejected() {
        let vocabularies = service(&MemoryStore::new());
        let a = vocabularies.create(input("a", None)).await.unwrap();
        let b = vocabularies.create(input("b", Some(a.id))).await.unwrap();
        let c = vocabularies.create(input("c", Some(b.id))).await.unwrap();

        let err = vocabularies.update(a.id, reparent(c.id)).await.unwrap_err();
        assert!(matches!(err, AppError::ParentCycle { id, parent } if id == a.id && parent == c.id));
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    }

    #[tokio::test]
    async fn test_reparent_to_missing_vocabulary() {
        let vocabularies = service(&MemoryStore::new());
        let a = vocabularies.create(input("a", None)).await.unwrap();
        let err = vocabularies
            .update(a.id, reparent(VocabularyId(77)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_is_blocked_by_terms() {
        let store = MemoryStore::new();
        let vocabularies = service(&store);
        let ram = vocabularies.create(input("ram", None)).await.unwrap();

        let term = TermRepository::create(
            &store,
            &TermInput {
                name: "512".into(),
                title: "512 GB".into(),
                vocabulary_ids: vec![ram.id],
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let err = vocabularies.delete(ram.id).await.unwrap_err();
        assert!(matches!(err, AppError::VocabularyHasTerms(id) if id == ram.id));

        TermRepository::delete(&store, term.id).await.unwrap();
        vocabularies.delete(ram.id).await.unwrap();
        assert_eq!(
            vocabularies.get_by_id(ram.id).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_delete_with_children_is_not_deleted() {
        let vocabularies = service(&MemoryStore::new());
        let parent = vocabularies.create(input("parent", None)).await.unwrap();
        vocabularies
            .create(input("child", Some(parent.id)))
            .await
            .unwrap();

        let err = vocabularies.delete(parent.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotDeleted);
        assert!(matches!(err.root(), AppError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_ensure_exists_fails_fast() {
        let vocabularies = service(&MemoryStore::new());
        let a = vocabularies.create(input("a", None)).await.unwrap();

        vocabularies.ensure_exists(&[a.id]).await.unwrap();
        let err = vocabularies
            .ensure_exists(&[a.id, VocabularyId(8), VocabularyId(9)])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::VocabularyNotFound(VocabularyId(8))));
    }
}

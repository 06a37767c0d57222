//! Term service.

use crate::context::{AppTerms, AppTransactions, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::models::{ReferenceQuery, Term, TermFilter, TermId, TermInput, TermPatch};
use crate::repositories::UnitOfWork;
use crate::services::namespace::single;
use crate::services::vocabulary::VocabularyService;
use crate::services::{finish, require};

/// Manages terms, their vocabulary membership and the term hierarchy.
#[derive(FromContext, Clone)]
pub struct TermService {
    terms: AppTerms,
    vocabularies: VocabularyService,
    transactions: AppTransactions,
}

impl TermService {
    pub async fn create(&self, input: TermInput) -> Result<Term, AppError> {
        require("name", &input.name)?;
        require("title", &input.title)?;

        self.vocabularies.ensure_exists(&input.vocabulary_ids).await?;
        self.ensure_exists(&input.super_term_ids).await?;
        self.ensure_exists(&input.sub_term_ids).await?;

        let term = self
            .terms
            .create(&input)
            .await
            .map_err(|e| AppError::not_created("term", e))?;

        tracing::info!(
            id = %term.id,
            name = %term.name,
            vocabularies = term.vocabulary_ids.len(),
            "Created term"
        );
        Ok(term)
    }

    /// Applies `patch` to the term. Supplied sets replace the stored ones.
    pub async fn update(&self, id: TermId, patch: TermPatch) -> Result<Term, AppError> {
        if let Some(name) = &patch.name {
            require("name", name)?;
        }
        if let Some(title) = &patch.title {
            require("title", title)?;
        }

        let current = self.get_by_id(id).await?;

        if let Some(vocabulary_ids) = &patch.vocabulary_ids {
            self.vocabularies.ensure_exists(vocabulary_ids).await?;
        }
        for related in [&patch.super_term_ids, &patch.sub_term_ids].into_iter().flatten() {
            if related.contains(&id) {
                return Err(AppError::Validation(format!(
                    "term {} cannot be related to itself",
                    id
                )));
            }
            self.ensure_exists(related).await?;
        }

        let merged = patch.merge(current);
        let term = self
            .terms
            .update(&merged)
            .await
            .map_err(|e| AppError::not_updated("term", id.get(), e))?;

        tracing::info!(id = %term.id, name = %term.name, "Updated term");
        Ok(term)
    }

    /// Deletes a term that no reference points to.
    pub async fn delete(&self, id: TermId) -> Result<(), AppError> {
        let uow = self.transactions.begin().await?;
        let result = Self::delete_in(uow.as_ref(), id).await;
        finish(uow, result).await?;

        tracing::info!(id = %id, "Deleted term");
        Ok(())
    }

    async fn delete_in(uow: &dyn UnitOfWork, id: TermId) -> Result<(), AppError> {
        single(uow.terms().get(&TermFilter::by_id(id)).await?)
            .ok_or(AppError::TermNotFound(id))?;

        let guard = ReferenceQuery {
            term_ids: vec![id],
            limit: Some(1),
            ..Default::default()
        };
        if !uow.references().get(&guard).await?.is_empty() {
            return Err(AppError::TermReferenceExists(id));
        }

        uow.terms()
            .delete(id)
            .await
            .map_err(|e| AppError::not_deleted("term", id.get(), e))
    }

    pub async fn get_by_id(&self, id: TermId) -> Result<Term, AppError> {
        tracing::debug!(id = %id, "Looking up term");
        single(self.terms.get(&TermFilter::by_id(id)).await?).ok_or(AppError::TermNotFound(id))
    }

    pub async fn get(&self, filter: &TermFilter) -> Result<Vec<Term>, AppError> {
        self.terms.get(filter).await
    }

    async fn ensure_exists(&self, ids: &[TermId]) -> Result<(), AppError> {
        for &id in ids {
            self.get_by_id(id).await?;
        }
        Ok(())
    }
}

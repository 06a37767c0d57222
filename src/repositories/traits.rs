//! Repository and unit-of-work capabilities consumed by the services.

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{
    Namespace, NamespaceFilter, NamespaceId, NamespaceInput, NewReference, Reference,
    ReferenceQuery, Term, TermFilter, TermId, TermInput, Vocabulary, VocabularyFilter,
    VocabularyId, VocabularyInput,
};

/// Storage for namespaces.
///
/// Name uniqueness is enforced here and reported as `UniqueViolation`.
#[async_trait]
pub trait NamespaceRepository: Send + Sync {
    async fn create(&self, input: &NamespaceInput) -> Result<Namespace, AppError>;

    /// Replaces the stored record with `namespace`. `NamespaceNotFound` when
    /// the id does not exist.
    async fn update(&self, namespace: &Namespace) -> Result<Namespace, AppError>;

    async fn delete(&self, id: NamespaceId) -> Result<(), AppError>;

    async fn get(&self, filter: &NamespaceFilter) -> Result<Vec<Namespace>, AppError>;
}

/// Storage for vocabularies.
///
/// `(name, parent)` uniqueness is enforced here.
#[async_trait]
pub trait VocabularyRepository: Send + Sync {
    async fn create(&self, input: &VocabularyInput) -> Result<Vocabulary, AppError>;

    async fn update(&self, vocabulary: &Vocabulary) -> Result<Vocabulary, AppError>;

    async fn delete(&self, id: VocabularyId) -> Result<(), AppError>;

    async fn get(&self, filter: &VocabularyFilter) -> Result<Vec<Vocabulary>, AppError>;
}

/// Storage for terms, their vocabulary membership and term relations.
///
/// A term without vocabularies is rejected with a validation error.
#[async_trait]
pub trait TermRepository: Send + Sync {
    async fn create(&self, input: &TermInput) -> Result<Term, AppError>;

    /// Replaces the stored record, including membership and relation sets.
    async fn update(&self, term: &Term) -> Result<Term, AppError>;

    async fn delete(&self, id: TermId) -> Result<(), AppError>;

    async fn get(&self, filter: &TermFilter) -> Result<Vec<Term>, AppError>;
}

/// Storage for references.
#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    /// Inserts the given references. A `(term, namespace, entity)` triple
    /// that already exists is a `UniqueViolation`.
    async fn create(&self, references: &[NewReference]) -> Result<Vec<Reference>, AppError>;

    /// Removes the references of `term` in `namespace` for any of the given
    /// entities, returning how many were removed.
    async fn delete(
        &self,
        term: TermId,
        namespace: NamespaceId,
        entity_ids: &[String],
    ) -> Result<u64, AppError>;

    async fn get(&self, query: &ReferenceQuery) -> Result<Vec<Reference>, AppError>;
}

/// A transaction with repositories bound to it.
///
/// Work done through the accessors becomes visible to others only after
/// [`commit`](UnitOfWork::commit). Both `commit` and `rollback` consume the
/// unit of work.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn namespaces(&self) -> Box<dyn NamespaceRepository + '_>;

    fn vocabularies(&self) -> Box<dyn VocabularyRepository + '_>;

    fn terms(&self) -> Box<dyn TermRepository + '_>;

    fn references(&self) -> Box<dyn ReferenceRepository + '_>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;

    async fn rollback(self: Box<Self>) -> Result<(), AppError>;
}

/// Starts units of work.
#[async_trait]
pub trait TransactionProvider: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AppError>;
}

//! Business logic services for the taxonomy.
//!
//! Services enforce the integrity rules on top of the repositories and are
//! built with the `FromContext` derive macro for dependency injection.
//! Guarded deletes and reference writes run inside one unit of work.

mod namespace;
mod reference;
mod term;
mod vocabulary;

pub use namespace::NamespaceService;
pub use reference::ReferenceService;
pub use term::TermService;
pub use vocabulary::VocabularyService;

use crate::error::AppError;
use crate::repositories::UnitOfWork;

/// Rejects blank values for a required text field.
fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Commits `uow` when `result` is a success and rolls it back otherwise.
///
/// A failed rollback is logged and the original error is returned.
async fn finish<T>(uow: Box<dyn UnitOfWork>, result: Result<T, AppError>) -> Result<T, AppError> {
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                tracing::error!(error = %rollback_err, cause = %err, "Rollback failed");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MemoryStore, NamespaceRepository, TransactionProvider};
    use crate::models::{NamespaceFilter, NamespaceInput};

    #[test]
    fn test_require_rejects_blank() {
        assert!(require("name", "  ").is_err());
        assert!(require("name", "catalog").is_ok());
    }

    #[tokio::test]
    async fn test_finish_commits_on_success_and_rolls_back_on_error() {
        let store = MemoryStore::new();
        let input = NamespaceInput {
            name: "catalog".into(),
            title: String::new(),
        };

        let uow = store.begin().await.unwrap();
        let result = uow.namespaces().create(&input).await;
        let result: Result<(), AppError> = result.and(Err(AppError::Internal("boom".into())));
        assert!(finish(uow, result).await.is_err());
        assert!(NamespaceRepository::get(&store, &NamespaceFilter::default())
            .await
            .unwrap()
            .is_empty());

        let uow = store.begin().await.unwrap();
        let result = uow.namespaces().create(&input).await;
        finish(uow, result).await.unwrap();
        assert_eq!(
            NamespaceRepository::get(&store, &NamespaceFilter::default())
                .await
                .unwrap()
                .len(),
            1
        );
    }
}

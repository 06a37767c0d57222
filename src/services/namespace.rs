//! Namespace service.

use crate::context::{AppNamespaces, AppTransactions, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::models::{
    Namespace, NamespaceFilter, NamespaceId, NamespaceInput, NamespacePatch, ReferenceQuery,
};
use crate::repositories::UnitOfWork;
use crate::services::{finish, require};

/// Manages the namespaces that scope references.
#[derive(FromContext, Clone)]
pub struct NamespaceService {
    namespaces: AppNamespaces,
    transactions: AppTransactions,
}

impl NamespaceService {
    pub async fn create(&self, input: NamespaceInput) -> Result<Namespace, AppError> {
        require("name", &input.name)?;

        let namespace = self.namespaces.create(&input).await.map_err(|e| {
            AppError::not_created("namespace", e.or_duplicate("namespace", &input.name))
        })?;

        tracing::info!(id = %namespace.id, name = %namespace.name, "Created namespace");
        Ok(namespace)
    }

    pub async fn update(
        &self,
        id: NamespaceId,
        patch: NamespacePatch,
    ) -> Result<Namespace, AppError> {
        if let Some(name) = &patch.name {
            require("name", name)?;
        }

        let current = self.get_by_id(id).await?;
        let merged = patch.merge(current);

        let namespace = self.namespaces.update(&merged).await.map_err(|e| {
            AppError::not_updated("namespace", id.get(), e.or_duplicate("namespace", &merged.name))
        })?;

        tracing::info!(id = %namespace.id, name = %namespace.name, "Updated namespace");
        Ok(namespace)
    }

    /// Deletes a namespace that holds no references.
    pub async fn delete(&self, id: NamespaceId) -> Result<(), AppError> {
        let uow = self.transactions.begin().await?;
        let result = Self::delete_in(uow.as_ref(), id).await;
        finish(uow, result).await?;

        tracing::info!(id = %id, "Deleted namespace");
        Ok(())
    }

    async fn delete_in(uow: &dyn UnitOfWork, id: NamespaceId) -> Result<(), AppError> {
        single(uow.namespaces().get(&NamespaceFilter::by_id(id)).await?)
            .ok_or_else(|| AppError::NamespaceNotFound(id.to_string()))?;

        let guard = ReferenceQuery {
            namespace_ids: vec![id],
            limit: Some(1),
            ..Default::default()
        };
        if !uow.references().get(&guard).await?.is_empty() {
            return Err(AppError::NamespaceReferenceExists(id));
        }

        uow.namespaces()
            .delete(id)
            .await
            .map_err(|e| AppError::not_deleted("namespace", id.get(), e))
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Namespace, AppError> {
        tracing::debug!(name, "Looking up namespace");
        single(self.namespaces.get(&NamespaceFilter::by_name(name)).await?)
            .ok_or_else(|| AppError::NamespaceNotFound(name.to_string()))
    }

    pub async fn get_by_id(&self, id: NamespaceId) -> Result<Namespace, AppError> {
        single(self.namespaces.get(&NamespaceFilter::by_id(id)).await?)
            .ok_or_else(|| AppError::NamespaceNotFound(id.to_string()))
    }

    /// Lists namespaces in id order.
    pub async fn get(
        &self,
        after: Option<NamespaceId>,
        limit: Option<usize>,
    ) -> Result<Vec<Namespace>, AppError> {
        self.namespaces
            .get(&NamespaceFilter {
                after,
                limit,
                ..Default::default()
            })
            .await
    }

    /// Resolves namespace names to ids, failing on the first unknown name.
    pub async fn resolve(&self, names: &[String]) -> Result<Vec<NamespaceId>, AppError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let found = self
            .namespaces
            .get(&NamespaceFilter {
                names: names.to_vec(),
                ..Default::default()
            })
            .await?;

        names
            .iter()
            .map(|name| {
                found
                    .iter()
                    .find(|n| &n.name == name)
                    .map(|n| n.id)
                    .ok_or_else(|| AppError::NamespaceNotFound(name.clone()))
            })
            .collect()
    }
}

/// Returns the only element of an identity lookup.
pub(crate) fn single<T>(mut rows: Vec<T>) -> Option<T> {
    if rows.len() == 1 {
        rows.pop()
    } else {
        None
    }
}

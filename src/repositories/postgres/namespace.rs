//! Namespace repository over PostgreSQL.

use async_trait::async_trait;

use super::{paging, raw_ids};
use crate::db::{Conditions, Query, QueryExt, Row, SqlExecutor};
use crate::error::AppError;
use crate::models::{Namespace, NamespaceFilter, NamespaceId, NamespaceInput};
use crate::repositories::traits::NamespaceRepository;

const COLUMNS: &str = "id, name, title";

pub struct PgNamespaceRepository<E> {
    db: E,
}

impl<E: SqlExecutor> PgNamespaceRepository<E> {
    pub fn new(db: E) -> Self {
        Self { db }
    }

    fn row_to_namespace(row: &Row) -> Result<Namespace, AppError> {
        Ok(Namespace {
            id: row.get("id")?,
            name: row.get("name")?,
            title: row.get("title")?,
        })
    }
}

#[async_trait]
impl<E: SqlExecutor> NamespaceRepository for PgNamespaceRepository<E> {
    async fn create(&self, input: &NamespaceInput) -> Result<Namespace, AppError> {
        let sql = format!(
            "INSERT INTO namespaces (name, title) VALUES ($1, $2) RETURNING {}",
            COLUMNS
        );
        let row = self
            .db
            .query(&sql)
            .bind(input.name.clone())
            .bind(input.title.clone())
            .fetch_one()
            .await?
            .ok_or_else(|| AppError::Internal("INSERT returned no row".into()))?;

        Self::row_to_namespace(&row)
    }

    async fn update(&self, namespace: &Namespace) -> Result<Namespace, AppError> {
        let sql = format!(
            "UPDATE namespaces SET name = $2, title = $3 WHERE id = $1 RETURNING {}",
            COLUMNS
        );
        let row = self
            .db
            .query(&sql)
            .bind(namespace.id.get())
            .bind(namespace.name.clone())
            .bind(namespace.title.clone())
            .fetch_one()
            .await?
            .ok_or_else(|| AppError::NamespaceNotFound(namespace.id.to_string()))?;

        Self::row_to_namespace(&row)
    }

    async fn delete(&self, id: NamespaceId) -> Result<(), AppError> {
        let removed = self
            .db
            .query("DELETE FROM namespaces WHERE id = $1")
            .bind(id.get())
            .execute()
            .await?;

        if removed == 0 {
            return Err(AppError::NamespaceNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn get(&self, filter: &NamespaceFilter) -> Result<Vec<Namespace>, AppError> {
        let mut conditions = Conditions::new();
        if !filter.ids.is_empty() {
            conditions.push("id = ANY({})", raw_ids(&filter.ids));
        }
        if !filter.names.is_empty() {
            conditions.push("name = ANY({})", filter.names.clone());
        }
        if let Some(after) = filter.after {
            conditions.push("id > {}", after.get());
        }

        let tail = paging(&mut conditions, filter.limit, None);
        let sql = format!(
            "SELECT {} FROM namespaces {} ORDER BY id{}",
            COLUMNS,
            conditions.where_clause(),
            tail
        );

        let rows = Query::with_params(&self.db, sql, conditions.into_params())
            .fetch_all()
            .await?;
        rows.iter().map(Self::row_to_namespace).collect()
    }
}

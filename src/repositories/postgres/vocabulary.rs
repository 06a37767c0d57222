//! Vocabulary repository over PostgreSQL.

use async_trait::async_trait;

use super::{paging, raw_ids};
use crate::db::{Conditions, Query, QueryExt, Row, SqlExecutor};
use crate::error::AppError;
use crate::models::{ParentFilter, Vocabulary, VocabularyFilter, VocabularyId, VocabularyInput};
use crate::repositories::traits::VocabularyRepository;

const COLUMNS: &str = "id, name, title, description, parent_id";

pub struct PgVocabularyRepository<E> {
    db: E,
}

impl<E: SqlExecutor> PgVocabularyRepository<E> {
    pub fn new(db: E) -> Self {
        Self { db }
    }

    fn row_to_vocabulary(row: &Row) -> Result<Vocabulary, AppError> {
        Ok(Vocabulary {
            id: row.get("id")?,
            name: row.get("name")?,
            title: row.get("title")?,
            description: row.get_opt("description")?,
            parent_id: row.get_opt("parent_id")?,
        })
    }
}

#[async_trait]
impl<E: SqlExecutor> VocabularyRepository for PgVocabularyRepository<E> {
    async fn create(&self, input: &VocabularyInput) -> Result<Vocabulary, AppError> {
        let sql = format!(
            "INSERT INTO vocabularies (name, title, description, parent_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            COLUMNS
        );
        let row = self
            .db
            .query(&sql)
            .bind(input.name.clone())
            .bind(input.title.clone())
            .bind(input.description.clone())
            .bind(input.parent_id.map(VocabularyId::get))
            .fetch_one()
            .await?
            .ok_or_else(|| AppError::Internal("INSERT returned no row".into()))?;

        Self::row_to_vocabulary(&row)
    }

    async fn update(&self, vocabulary: &Vocabulary) -> Result<Vocabulary, AppError> {
        let sql = format!(
            "UPDATE vocabularies
             SET name = $2, title = $3, description = $4, parent_id = $5
             WHERE id = $1
             RETURNING {}",
            COLUMNS
        );
        let row = self
            .db
            .query(&sql)
            .bind(vocabulary.id.get())
            .bind(vocabulary.name.clone())
            .bind(vocabulary.title.clone())
            .bind(vocabulary.description.clone())
            .bind(vocabulary.parent_id.map(VocabularyId::get))
            .fetch_one()
            .await?
            .ok_or(AppError::VocabularyNotFound(vocabulary.id))?;

        Self::row_to_vocabulary(&row)
    }

    async fn delete(&self, id: VocabularyId) -> Result<(), AppError> {
        let removed = self
            .db
            .query("DELETE FROM vocabularies WHERE id = $1")
            .bind(id.get())
            .execute()
            .await?;

        if removed == 0 {
            return Err(AppError::VocabularyNotFound(id));
        }
        Ok(())
    }

    async fn get(&self, filter: &VocabularyFilter) -> Result<Vec<Vocabulary>, AppError> {
        let mut conditions = Conditions::new();
        if !filter.ids.is_empty() {
            conditions.push("id = ANY({})", raw_ids(&filter.ids));
        }
        if let Some(name) = &filter.name {
            conditions.push("name = {}", name.clone());
        }
        match filter.parent {
            Some(ParentFilter::Root) => {
                conditions.push_raw("parent_id IS NULL");
            }
            Some(ParentFilter::Of(parent)) => {
                conditions.push("parent_id = {}", parent.get());
            }
            None => {}
        }
        if let Some(after) = filter.after {
            conditions.push("id > {}", after.get());
        }

        let tail = paging(&mut conditions, filter.limit, None);
        let sql = format!(
            "SELECT {} FROM vocabularies {} ORDER BY id{}",
            COLUMNS,
            conditions.where_clause(),
            tail
        );

        let rows = Query::with_params(&self.db, sql, conditions.into_params())
            .fetch_all()
            .await?;
        rows.iter().map(Self::row_to_vocabulary).collect()
    }
}

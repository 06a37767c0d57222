//! Term repository over PostgreSQL.
//!
//! Membership lives in `term_vocabularies` and the super/sub hierarchy in
//! `term_relations`; both are written in the same statement as the term row
//! through data-modifying CTEs.

use std::collections::BTreeSet;

use async_trait::async_trait;

use super::{paging, raw_ids};
use crate::db::{Conditions, Query, QueryExt, Row, SqlExecutor};
use crate::error::AppError;
use crate::models::{Term, TermFilter, TermId, TermInput, VocabularyId};
use crate::repositories::traits::TermRepository;

const SELECT_TERMS: &str = "SELECT t.id, t.name, t.title, t.description,
        ARRAY(SELECT tv.vocabulary_id FROM term_vocabularies tv
              WHERE tv.term_id = t.id ORDER BY tv.vocabulary_id) AS vocabulary_ids,
        ARRAY(SELECT r.super_id FROM term_relations r
              WHERE r.sub_id = t.id ORDER BY r.super_id) AS super_term_ids,
        ARRAY(SELECT r.sub_id FROM term_relations r
              WHERE r.super_id = t.id ORDER BY r.sub_id) AS sub_term_ids
    FROM terms t";

const INSERT_TERM: &str = "WITH t AS (
        INSERT INTO terms (name, title, description) VALUES ($1, $2, $3) RETURNING id
    ),
    v AS (
        INSERT INTO term_vocabularies (term_id, vocabulary_id)
        SELECT t.id, unnest($4::BIGINT[]) FROM t
    ),
    sup AS (
        INSERT INTO term_relations (super_id, sub_id)
        SELECT unnest($5::BIGINT[]), t.id FROM t
    ),
    sub AS (
        INSERT INTO term_relations (super_id, sub_id)
        SELECT t.id, unnest($6::BIGINT[]) FROM t
    )
    SELECT id FROM t";

// Rows outside the new sets are deleted and the new sets inserted with
// ON CONFLICT DO NOTHING, so no sub-statement touches the same key twice.
const UPDATE_TERM: &str = "WITH t AS (
        UPDATE terms SET name = $2, title = $3, description = $4 WHERE id = $1 RETURNING id
    ),
    dv AS (
        DELETE FROM term_vocabularies
        WHERE term_id IN (SELECT id FROM t) AND vocabulary_id <> ALL($5::BIGINT[])
    ),
    v AS (
        INSERT INTO term_vocabularies (term_id, vocabulary_id)
        SELECT t.id, unnest($5::BIGINT[]) FROM t
        ON CONFLICT DO NOTHING
    ),
    dsup AS (
        DELETE FROM term_relations
        WHERE sub_id IN (SELECT id FROM t) AND super_id <> ALL($6::BIGINT[])
    ),
    sup AS (
        INSERT INTO term_relations (super_id, sub_id)
        SELECT unnest($6::BIGINT[]), t.id FROM t
        ON CONFLICT DO NOTHING
    ),
    dsub AS (
        DELETE FROM term_relations
        WHERE super_id IN (SELECT id FROM t) AND sub_id <> ALL($7::BIGINT[])
    ),
    sub AS (
        INSERT INTO term_relations (super_id, sub_id)
        SELECT t.id, unnest($7::BIGINT[]) FROM t
        ON CONFLICT DO NOTHING
    )
    SELECT id FROM t";

pub struct PgTermRepository<E> {
    db: E,
}

impl<E: SqlExecutor> PgTermRepository<E> {
    pub fn new(db: E) -> Self {
        Self { db }
    }

    fn row_to_term(row: &Row) -> Result<Term, AppError> {
        Ok(Term {
            id: row.get("id")?,
            name: row.get("name")?,
            title: row.get("title")?,
            description: row.get_opt("description")?,
            vocabulary_ids: row.get_opt("vocabulary_ids")?.unwrap_or_default(),
            super_term_ids: row.get_opt("super_term_ids")?.unwrap_or_default(),
            sub_term_ids: row.get_opt("sub_term_ids")?.unwrap_or_default(),
        })
    }

    async fn fetch(&self, id: TermId) -> Result<Term, AppError> {
        self.get(&TermFilter::by_id(id))
            .await?
            .into_iter()
            .next()
            .ok_or(AppError::TermNotFound(id))
    }
}

fn require_vocabularies(ids: &[VocabularyId]) -> Result<(), AppError> {
    if ids.is_empty() {
        return Err(AppError::Validation(
            "a term must belong to at least one vocabulary".into(),
        ));
    }
    Ok(())
}

/// Sorted, de-duplicated raw ids.
fn id_set<T: Copy + Into<i64>>(ids: &[T]) -> Vec<i64> {
    raw_ids(ids)
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[async_trait]
impl<E: SqlExecutor> TermRepository for PgTermRepository<E> {
    async fn create(&self, input: &TermInput) -> Result<Term, AppError> {
        require_vocabularies(&input.vocabulary_ids)?;

        let row = self
            .db
            .query(INSERT_TERM)
            .bind(input.name.clone())
            .bind(input.title.clone())
            .bind(input.description.clone())
            .bind(id_set(&input.vocabulary_ids))
            .bind(id_set(&input.super_term_ids))
            .bind(id_set(&input.sub_term_ids))
            .fetch_one()
            .await?
            .ok_or_else(|| AppError::Internal("INSERT returned no row".into()))?;

        self.fetch(row.get("id")?).await
    }

    async fn update(&self, term: &Term) -> Result<Term, AppError> {
        require_vocabularies(&term.vocabulary_ids)?;

        self.db
            .query(UPDATE_TERM)
            .bind(term.id.get())
            .bind(term.name.clone())
            .bind(term.title.clone())
            .bind(term.description.clone())
            .bind(id_set(&term.vocabulary_ids))
            .bind(id_set(&term.super_term_ids))
            .bind(id_set(&term.sub_term_ids))
            .fetch_one()
            .await?
            .ok_or(AppError::TermNotFound(term.id))?;

        self.fetch(term.id).await
    }

    async fn delete(&self, id: TermId) -> Result<(), AppError> {
        let removed = self
            .db
            .query("DELETE FROM terms WHERE id = $1")
            .bind(id.get())
            .execute()
            .await?;

        if removed == 0 {
            return Err(AppError::TermNotFound(id));
        }
        Ok(())
    }

    async fn get(&self, filter: &TermFilter) -> Result<Vec<Term>, AppError> {
        let mut conditions = Conditions::new();
        if !filter.ids.is_empty() {
            conditions.push("t.id = ANY({})", raw_ids(&filter.ids));
        }
        if !filter.vocabulary_ids.is_empty() {
            conditions.push(
                "EXISTS (SELECT 1 FROM term_vocabularies tv
                         WHERE tv.term_id = t.id AND tv.vocabulary_id = ANY({}))",
                raw_ids(&filter.vocabulary_ids),
            );
        }
        if let Some(sup) = filter.super_term {
            conditions.push(
                "EXISTS (SELECT 1 FROM term_relations r WHERE r.sub_id = t.id AND r.super_id = {})",
                sup.get(),
            );
        }
        if let Some(sub) = filter.sub_term {
            conditions.push(
                "EXISTS (SELECT 1 FROM term_relations r WHERE r.super_id = t.id AND r.sub_id = {})",
                sub.get(),
            );
        }
        if let Some(name) = &filter.name {
            conditions.push("t.name = {}", name.clone());
        }
        if let Some(after) = filter.after {
            conditions.push("t.id > {}", after.get());
        }

        let tail = paging(&mut conditions, filter.limit, filter.offset);
        let sql = format!(
            "{} {} ORDER BY t.id{}",
            SELECT_TERMS,
            conditions.where_clause(),
            tail
        );

        let rows = Query::with_params(&self.db, sql, conditions.into_params())
            .fetch_all()
            .await?;
        rows.iter().map(Self::row_to_term).collect()
    }
}

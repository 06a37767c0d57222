//! Reference repository over PostgreSQL.

use async_trait::async_trait;

use super::{paging, raw_ids};
use crate::db::{Conditions, Query, QueryExt, Row, SqlExecutor};
use crate::error::AppError;
use crate::models::{NamespaceId, NewReference, Reference, ReferenceQuery, TermId};
use crate::repositories::traits::ReferenceRepository;

const COLUMNS: &str = "id, term_id, namespace_id, entity_id, created_at";

pub struct PgReferenceRepository<E> {
    db: E,
}

impl<E: SqlExecutor> PgReferenceRepository<E> {
    pub fn new(db: E) -> Self {
        Self { db }
    }

    fn row_to_reference(row: &Row) -> Result<Reference, AppError> {
        Ok(Reference {
            id: row.get("id")?,
            term_id: row.get("term_id")?,
            namespace_id: row.get("namespace_id")?,
            entity_id: row.get("entity_id")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Builds the filter for a reference query over alias `r`.
///
/// Each term group becomes an `EXISTS` over references of the same entity,
/// restricted to the queried namespaces when there are any.
fn reference_conditions(query: &ReferenceQuery) -> Conditions {
    let mut conditions = Conditions::new();
    if !query.term_ids.is_empty() {
        conditions.push("r.term_id = ANY({})", raw_ids(&query.term_ids));
    }
    if !query.namespace_ids.is_empty() {
        conditions.push("r.namespace_id = ANY({})", raw_ids(&query.namespace_ids));
    }
    if !query.entity_ids.is_empty() {
        conditions.push("r.entity_id = ANY({})", query.entity_ids.clone());
    }

    for group in &query.term_groups {
        let terms = conditions.bind(raw_ids(group));
        let scope = if query.namespace_ids.is_empty() {
            String::new()
        } else {
            format!(
                " AND g.namespace_id = ANY({})",
                conditions.bind(raw_ids(&query.namespace_ids))
            )
        };
        conditions.push_raw(format!(
            "EXISTS (SELECT 1 FROM term_references g
                     WHERE g.entity_id = r.entity_id AND g.term_id = ANY({}){})",
            terms, scope
        ));
    }

    if let Some(after) = query.after {
        conditions.push("r.id > {}", after.get());
    }
    conditions
}

#[async_trait]
impl<E: SqlExecutor> ReferenceRepository for PgReferenceRepository<E> {
    async fn create(&self, references: &[NewReference]) -> Result<Vec<Reference>, AppError> {
        if references.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "INSERT INTO term_references (term_id, namespace_id, entity_id)
             SELECT * FROM unnest($1::BIGINT[], $2::BIGINT[], $3::TEXT[])
             RETURNING {}",
            COLUMNS
        );
        let rows = self
            .db
            .query(&sql)
            .bind(references.iter().map(|r| r.term_id.get()).collect::<Vec<_>>())
            .bind(references.iter().map(|r| r.namespace_id.get()).collect::<Vec<_>>())
            .bind(references.iter().map(|r| r.entity_id.clone()).collect::<Vec<_>>())
            .fetch_all()
            .await?;

        let mut created = rows
            .iter()
            .map(Self::row_to_reference)
            .collect::<Result<Vec<_>, _>>()?;
        created.sort_by_key(|r| r.id);
        Ok(created)
    }

    async fn delete(
        &self,
        term: TermId,
        namespace: NamespaceId,
        entity_ids: &[String],
    ) -> Result<u64, AppError> {
        self.db
            .query(
                "DELETE FROM term_references
                 WHERE term_id = $1 AND namespace_id = $2 AND entity_id = ANY($3)",
            )
            .bind(term.get())
            .bind(namespace.get())
            .bind(entity_ids.to_vec())
            .execute()
            .await
    }

    async fn get(&self, query: &ReferenceQuery) -> Result<Vec<Reference>, AppError> {
        let mut conditions = reference_conditions(query);
        let tail = paging(&mut conditions, query.limit, None);
        let sql = format!(
            "SELECT {} FROM term_references r {} ORDER BY r.id{}",
            COLUMNS
                .split(", ")
                .map(|c| format!("r.{}", c))
                .collect::<Vec<_>>()
                .join(", "),
            conditions.where_clause(),
            tail
        );

        let rows = Query::with_params(&self.db, sql, conditions.into_params())
            .fetch_all()
            .await?;
        rows.iter().map(Self::row_to_reference).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReferenceId;

    #[test]
    fn test_group_filter_without_namespaces() {
        let query = ReferenceQuery {
            term_groups: vec![vec![TermId(2)], vec![TermId(3), TermId(4)]],
            ..Default::default()
        };
        let clause = reference_conditions(&query).where_clause();

        assert!(clause.contains("g.term_id = ANY($1)"));
        assert!(clause.contains("g.term_id = ANY($2)"));
        assert!(!clause.contains("g.namespace_id"));
    }

    #[test]
    fn test_group_filter_scoped_to_namespaces() {
        let query = ReferenceQuery {
            term_groups: vec![vec![TermId(2)]],
            namespace_ids: vec![NamespaceId(1)],
            after: Some(ReferenceId(10)),
            ..Default::default()
        };
        let conditions = reference_conditions(&query);

        assert_eq!(
            conditions.where_clause().split_whitespace().collect::<Vec<_>>().join(" "),
            "WHERE r.namespace_id = ANY($1) AND EXISTS (SELECT 1 FROM term_references g \
             WHERE g.entity_id = r.entity_id AND g.term_id = ANY($2) \
             AND g.namespace_id = ANY($3)) AND r.id > $4"
        );
        assert_eq!(conditions.into_params().len(), 4);
    }
}

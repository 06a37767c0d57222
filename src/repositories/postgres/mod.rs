//! PostgreSQL repositories.
//!
//! Each repository is generic over [`SqlExecutor`], so it runs either on the
//! pooled [`PostgresClient`] (one implicit transaction per statement) or on a
//! [`PostgresTransaction`] handed out by [`PgUnitOfWork`]. Every write is a
//! single statement, so it stays atomic on the pooled client too.

mod namespace;
mod reference;
mod term;
mod vocabulary;

pub use namespace::PgNamespaceRepository;
pub use reference::PgReferenceRepository;
pub use term::PgTermRepository;
pub use vocabulary::PgVocabularyRepository;

use async_trait::async_trait;

use crate::db::backends::postgres::{PostgresClient, PostgresTransaction};
use crate::db::{Conditions, DbClient, Transaction};
use crate::error::AppError;
use crate::repositories::traits::{
    NamespaceRepository, ReferenceRepository, TermRepository, TransactionProvider, UnitOfWork,
    VocabularyRepository,
};

/// Appends `LIMIT`/`OFFSET` clauses bound through `conditions`.
fn paging(conditions: &mut Conditions, limit: Option<usize>, offset: Option<usize>) -> String {
    let mut sql = String::new();
    if let Some(limit) = limit {
        let placeholder = conditions.bind(i64::try_from(limit).unwrap_or(i64::MAX));
        sql.push_str(&format!(" LIMIT {}", placeholder));
    }
    if let Some(offset) = offset {
        let placeholder = conditions.bind(i64::try_from(offset).unwrap_or(i64::MAX));
        sql.push_str(&format!(" OFFSET {}", placeholder));
    }
    sql
}

fn raw_ids<T: Copy + Into<i64>>(ids: &[T]) -> Vec<i64> {
    ids.iter().map(|id| (*id).into()).collect()
}

/// Unit of work over a single PostgreSQL transaction.
pub struct PgUnitOfWork {
    tx: PostgresTransaction,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    fn namespaces(&self) -> Box<dyn NamespaceRepository + '_> {
        Box::new(PgNamespaceRepository::new(&self.tx))
    }

    fn vocabularies(&self) -> Box<dyn VocabularyRepository + '_> {
        Box::new(PgVocabularyRepository::new(&self.tx))
    }

    fn terms(&self) -> Box<dyn TermRepository + '_> {
        Box::new(PgTermRepository::new(&self.tx))
    }

    fn references(&self) -> Box<dyn ReferenceRepository + '_> {
        Box::new(PgReferenceRepository::new(&self.tx))
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let PgUnitOfWork { tx } = *self;
        tx.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        let PgUnitOfWork { tx } = *self;
        tx.rollback().await
    }
}

/// Begins [`PgUnitOfWork`]s on a pooled client.
#[derive(Clone)]
pub struct PgTransactions {
    client: PostgresClient,
}

impl PgTransactions {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TransactionProvider for PgTransactions {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AppError> {
        let tx = self.client.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paging_binds_after_filters() {
        let mut conditions = Conditions::new();
        conditions.push("id > {}", 3i64);
        let tail = paging(&mut conditions, Some(10), Some(20));

        assert_eq!(tail, " LIMIT $2 OFFSET $3");
        assert_eq!(conditions.into_params().len(), 3);
    }

    #[test]
    fn test_paging_without_limits() {
        let mut conditions = Conditions::new();
        assert_eq!(paging(&mut conditions, None, None), "");
    }
}

//! Core traits for database access.
//!
//! This module defines the trait hierarchy that backends must implement:
//!
//! - [`SqlExecutor`] - Execute parameterized SQL
//! - [`Transaction`] - Transaction lifecycle management
//! - [`DbClient`] - Connection pool and transaction creation

use async_trait::async_trait;

use crate::db::row::{Params, Row};
use crate::error::AppError;

/// Executes SQL statements against the database.
///
/// Parameters are bound positionally (`$1`, `$2`, ...) and sent through the
/// extended query protocol; they are never interpolated into the SQL text.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Executes a query and returns all result rows.
    async fn query_rows(&self, sql: &str, params: &Params) -> Result<Vec<Row>, AppError>;

    /// Executes a statement and returns the number of affected rows.
    ///
    /// Use this for INSERT, UPDATE and DELETE without RETURNING.
    async fn execute(&self, sql: &str, params: &Params) -> Result<u64, AppError>;

    /// Executes one or more statements without parameters.
    ///
    /// Use this for DDL in migrations.
    async fn batch_execute(&self, sql: &str) -> Result<(), AppError>;
}

#[async_trait]
impl<'e, E: SqlExecutor + ?Sized> SqlExecutor for &'e E {
    async fn query_rows(&self, sql: &str, params: &Params) -> Result<Vec<Row>, AppError> {
        (**self).query_rows(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &Params) -> Result<u64, AppError> {
        (**self).execute(sql, params).await
    }

    async fn batch_execute(&self, sql: &str) -> Result<(), AppError> {
        (**self).batch_execute(sql).await
    }
}

/// Transaction lifecycle management.
#[async_trait]
pub trait Transaction: Send + Sync {
    /// Commits the transaction, making all changes permanent.
    ///
    /// Consumes the transaction - it cannot be used after commit.
    async fn commit(self) -> Result<(), AppError>;

    /// Rolls back the transaction, discarding all changes.
    ///
    /// Consumes the transaction - it cannot be used after rollback.
    async fn rollback(self) -> Result<(), AppError>;
}

/// A database client that can begin transactions.
///
/// Implementations typically wrap a connection pool and provide auto-commit
/// statements via the executor methods, plus explicit transactions via
/// [`begin`](DbClient::begin).
#[async_trait]
pub trait DbClient: SqlExecutor {
    /// The transaction type returned by this client.
    type Tx<'a>: Transaction + SqlExecutor
    where
        Self: 'a;

    /// Begins a new transaction.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let txn = client.begin().await?;
    /// txn.query("DELETE FROM term_references WHERE term_id = $1")
    ///     .bind(term_id)
    ///     .execute()
    ///     .await?;
    /// txn.commit().await?;
    /// ```
    async fn begin(&self) -> Result<Self::Tx<'_>, AppError>;
}

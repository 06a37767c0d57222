//! Query builder for fluent SQL statement construction.

use tokio_postgres::types::ToSql;

use crate::db::row::{Params, Row};
use crate::db::traits::SqlExecutor;
use crate::error::AppError;

/// A builder for constructing and executing parameterized SQL statements.
///
/// Values are bound in order and referenced as `$1`, `$2`, ... in the SQL.
///
/// # Example
///
/// ```ignore
/// let rows = Query::new(&client, "SELECT id, name FROM namespaces WHERE name = $1")
///     .bind("catalog".to_string())
///     .fetch_all()
///     .await?;
/// ```
pub struct Query<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
    sql: String,
    params: Params,
}

impl<'a, E: SqlExecutor + ?Sized> Query<'a, E> {
    /// Creates a new query builder.
    pub fn new(executor: &'a E, sql: &str) -> Self {
        Self {
            executor,
            sql: sql.to_string(),
            params: Params::new(),
        }
    }

    /// Creates a query builder with parameters collected up front.
    pub fn with_params(executor: &'a E, sql: String, params: Params) -> Self {
        Self {
            executor,
            sql,
            params,
        }
    }

    /// Binds the next positional parameter.
    pub fn bind<T: ToSql + Sync + Send + 'static>(mut self, value: T) -> Self {
        self.params.push(Box::new(value));
        self
    }

    /// Executes the query and collects all rows into a vector.
    pub async fn fetch_all(self) -> Result<Vec<Row>, AppError> {
        self.executor.query_rows(&self.sql, &self.params).await
    }

    /// Executes the query and returns the first row, if any.
    pub async fn fetch_one(self) -> Result<Option<Row>, AppError> {
        Ok(self.fetch_all().await?.into_iter().next())
    }

    /// Executes the statement and returns the number of affected rows.
    ///
    /// Use this for INSERT, UPDATE and DELETE without RETURNING.
    pub async fn execute(self) -> Result<u64, AppError> {
        self.executor.execute(&self.sql, &self.params).await
    }
}

/// Extension trait providing a convenient `query()` method.
///
/// Automatically implemented for all [`SqlExecutor`] types, allowing
/// `executor.query("...")` instead of `Query::new(&executor, "...")`.
pub trait QueryExt: SqlExecutor {
    /// Creates a new query builder for this executor.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use taxonomy::db::QueryExt;
    ///
    /// let removed = client.query("DELETE FROM namespaces WHERE id = $1")
    ///     .bind(7i64)
    ///     .execute()
    ///     .await?;
    /// ```
    fn query(&self, sql: &str) -> Query<'_, Self>
    where
        Self: Sized,
    {
        Query::new(self, sql)
    }
}

impl<E: SqlExecutor> QueryExt for E {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Records statements and parameter counts instead of talking to a database.
    #[derive(Default)]
    struct RecordingExecutor {
        seen: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait::async_trait]
    impl SqlExecutor for RecordingExecutor {
        async fn query_rows(&self, sql: &str, params: &Params) -> Result<Vec<Row>, AppError> {
            self.seen.lock().unwrap().push((sql.to_string(), params.len()));
            Ok(vec![Row::default(), Row::default()])
        }

        async fn execute(&self, sql: &str, params: &Params) -> Result<u64, AppError> {
            self.seen.lock().unwrap().push((sql.to_string(), params.len()));
            Ok(3)
        }

        async fn batch_execute(&self, _sql: &str) -> Result<(), AppError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_query_no_params() {
        let executor = RecordingExecutor::default();
        let rows = executor
            .query("SELECT id FROM namespaces")
            .fetch_all()
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            executor.seen.lock().unwrap()[0],
            ("SELECT id FROM namespaces".to_string(), 0)
        );
    }

    #[tokio::test]
    async fn test_query_binds_in_order() {
        let executor = RecordingExecutor::default();
        let affected = executor
            .query("UPDATE namespaces SET name = $1 WHERE id = $2")
            .bind("catalog".to_string())
            .bind(4i64)
            .execute()
            .await
            .unwrap();

        assert_eq!(affected, 3);
        assert_eq!(executor.seen.lock().unwrap()[0].1, 2);
    }

    #[tokio::test]
    async fn test_fetch_one_takes_first_row() {
        let executor = RecordingExecutor::default();
        let row = executor.query("SELECT 1").fetch_one().await.unwrap();
        assert!(row.is_some());
    }

    #[tokio::test]
    async fn test_query_through_reference() {
        let executor = RecordingExecutor::default();
        let by_ref = &executor;
        by_ref.query("SELECT 1").fetch_all().await.unwrap();
        assert_eq!(executor.seen.lock().unwrap().len(), 1);
    }
}

//! Dynamic WHERE clause construction.

use tokio_postgres::types::ToSql;

use crate::db::row::Params;

/// Accumulates `AND`-joined conditions together with their bound values.
///
/// Conditions are written with `{}` where the value goes; each placeholder is
/// replaced by the next positional parameter (`$1`, `$2`, ...). Placeholders
/// keep counting across conditions so the final parameter list lines up with
/// the SQL text.
///
/// ```ignore
/// let mut conditions = Conditions::new();
/// conditions.push("name = {}", "catalog".to_string());
/// conditions.push("id > {}", 10i64);
/// let sql = format!("SELECT * FROM namespaces {} ORDER BY id", conditions.where_clause());
/// ```
#[derive(Default)]
pub struct Conditions {
    clauses: Vec<String>,
    params: Params,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a value and returns its placeholder without adding a condition.
    ///
    /// Use this when one condition needs several values.
    pub fn bind<T: ToSql + Sync + Send + 'static>(&mut self, value: T) -> String {
        self.params.push(Box::new(value));
        format!("${}", self.params.len())
    }

    /// Adds a condition whose single `{}` is replaced by the bound value.
    pub fn push<T: ToSql + Sync + Send + 'static>(&mut self, template: &str, value: T) -> &mut Self {
        let placeholder = self.bind(value);
        self.clauses.push(template.replacen("{}", &placeholder, 1));
        self
    }

    /// Adds a condition that binds nothing (or was built with [`bind`](Self::bind)).
    pub fn push_raw(&mut self, clause: impl Into<String>) -> &mut Self {
        self.clauses.push(clause.into());
        self
    }

    /// Renders `WHERE a AND b`, or an empty string when nothing was added.
    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }

    /// Consumes the builder, returning the parameters in placeholder order.
    pub fn into_params(self) -> Params {
        self.params
    }
}

//! Database abstraction layer.
//!
//! Repositories are written against [`SqlExecutor`], so the same code runs
//! on a pooled client (auto-commit per statement) or inside a transaction.
//!
//! # Architecture
//!
//! - [`SqlExecutor`] - Execute parameterized SQL
//! - [`Transaction`] - Transaction lifecycle (commit/rollback)
//! - [`DbClient`] - Connection management and transaction creation
//! - [`Conditions`] - Dynamic WHERE clause builder
//!
//! # Usage
//!
//! ```ignore
//! use taxonomy::db::{DbClient, QueryExt, Transaction};
//!
//! let txn = client.begin().await?;
//! let row = txn
//!     .query("INSERT INTO namespaces (name, title) VALUES ($1, $2) RETURNING id, name, title")
//!     .bind(name)
//!     .bind(title)
//!     .fetch_one()
//!     .await?;
//! txn.commit().await?;
//! ```

mod filter;
mod query;
mod row;
mod traits;

pub mod backends;

pub use filter::Conditions;
pub use query::{Query, QueryExt};
pub use row::{Param, Params, Row};
pub use traits::{DbClient, SqlExecutor, Transaction};

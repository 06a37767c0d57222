//! Backend implementations for the database layer.
//!
//! Each backend implements the core traits from [`crate::db`]:
//!
//! - [`SqlExecutor`](crate::db::SqlExecutor) - for both client and transaction
//! - [`Transaction`](crate::db::Transaction) - for the transaction type
//! - [`DbClient`](crate::db::DbClient) - for the pooled client
//!
//! | Backend | Module | Status |
//! |---------|--------|--------|
//! | PostgreSQL | [`postgres`] | Available |

pub mod postgres;

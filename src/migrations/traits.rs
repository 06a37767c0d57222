//! Migration trait and registry.

use futures::future::BoxFuture;

use crate::db::{DbClient, SqlExecutor, Transaction as _};
use crate::error::AppError;

/// A single forward-only schema change.
///
/// Uses `BoxFuture` to avoid `'static` requirements from `#[async_trait]`.
pub trait Migration: Send + Sync {
    fn id(&self) -> &'static str;
    fn version(&self) -> u32;
    fn description(&self) -> &'static str;
    fn up<'a>(&'a self, ctx: &'a (dyn SqlExecutor + Sync)) -> BoxFuture<'a, Result<(), AppError>>;
}

/// Ordered set of migrations.
#[derive(Default)]
pub struct Register {
    migrations: Vec<Box<dyn Migration>>,
}

impl Register {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, migration: impl Migration + 'static) -> Self {
        self.migrations.push(Box::new(migration));
        self
    }

    /// Iterate over migrations.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Migration> {
        self.migrations.iter().map(|m| m.as_ref())
    }

    /// Run all pending migrations above `current_version`.
    ///
    /// Each migration runs in its own transaction, and `on_applied` records
    /// its version before the next one starts. Returns the applied ids.
    pub async fn run_pending<C, F, Fut>(
        &self,
        client: &C,
        current_version: u32,
        mut on_applied: F,
    ) -> Result<Vec<String>, AppError>
    where
        C: DbClient,
        F: FnMut(u32, &'static str) -> Fut,
        Fut: std::future::Future<Output = Result<(), AppError>>,
    {
        let mut applied = vec![];

        for migration in &self.migrations {
            if migration.version() <= current_version {
                continue;
            }

            tracing::info!(
                id = migration.id(),
                version = migration.version(),
                "Applying migration: {}",
                migration.description()
            );

            let txn = client.begin().await?;
            match migration.up(&txn).await {
                Ok(()) => txn.commit().await?,
                Err(e) => {
                    tracing::error!(id = migration.id(), error = %e, "Migration failed, rolling back");
                    txn.rollback().await?;
                    return Err(e);
                }
            }

            on_applied(migration.version(), migration.id()).await?;
            applied.push(migration.id().to_string());
        }

        Ok(applied)
    }
}

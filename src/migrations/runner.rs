//! Migration runner with version tracking.

use crate::db::{DbClient, QueryExt};
use crate::error::AppError;
use crate::migrations::create_register;

/// Result of running migrations.
#[derive(Debug, Clone)]
pub struct MigrationResult {
    /// Schema version before migrations ran.
    pub previous_version: u32,
    /// Schema version after migrations ran.
    pub current_version: u32,
    /// Ids of the migrations that were applied.
    pub applied_migrations: Vec<String>,
}

/// Run all pending migrations.
pub async fn run_migrations<C>(client: &C) -> Result<MigrationResult, AppError>
where
    C: DbClient,
{
    client.batch_execute(CREATE_SCHEMA_VERSION_TABLE).await?;

    let previous_version = get_schema_version(client).await?;
    let register = create_register();

    let applied = register
        .run_pending(client, previous_version, |version, id| {
            update_schema_version(client, version, id)
        })
        .await?;

    let current_version = register
        .iter()
        .filter(|m| applied.iter().any(|id| id == m.id()))
        .map(|m| m.version())
        .max()
        .unwrap_or(previous_version);

    Ok(MigrationResult {
        previous_version,
        current_version,
        applied_migrations: applied,
    })
}

const CREATE_SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS taxonomy_schema_version (
    id INTEGER PRIMARY KEY DEFAULT 1 CHECK (id = 1),
    version INTEGER NOT NULL DEFAULT 0,
    applied_migrations TEXT[] NOT NULL DEFAULT '{}',
    last_applied_at TIMESTAMPTZ DEFAULT NOW()
);
INSERT INTO taxonomy_schema_version (id, version) VALUES (1, 0) ON CONFLICT (id) DO NOTHING;
"#;

async fn get_schema_version<C: DbClient>(client: &C) -> Result<u32, AppError> {
    let row = client
        .query("SELECT version FROM taxonomy_schema_version WHERE id = 1")
        .fetch_one()
        .await?;

    Ok(row
        .and_then(|r| r.get::<i64>("version").ok())
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0))
}

async fn update_schema_version<C: DbClient>(
    client: &C,
    version: u32,
    migration_id: &'static str,
) -> Result<(), AppError> {
    client
        .query(
            "UPDATE taxonomy_schema_version
             SET version = $1,
                 applied_migrations = array_append(applied_migrations, $2),
                 last_applied_at = NOW()
             WHERE id = 1",
        )
        .bind(version as i32)
        .bind(migration_id.to_string())
        .execute()
        .await?;
    Ok(())
}

//! Schema migrations for PostgreSQL with version tracking.
//!
//! Migrations are:
//! - **Idempotent**: Use `IF NOT EXISTS` - required for safe retries
//! - **Forward-only**: No rollback support - create compensating migrations if needed
//! - **Version-tracked**: Schema version stored in the `taxonomy_schema_version` table
//! - **Applied by `taxonomy init`**

mod m001_schema;
mod m002_reference_indexes;
mod runner;
mod traits;

pub use m001_schema::M001Schema;
pub use m002_reference_indexes::M002ReferenceIndexes;
pub use runner::{run_migrations, MigrationResult};
pub use traits::{Migration, Register};

/// Create the migrations register in version order.
pub fn create_register() -> Register {
    Register::new()
        .register(M001Schema)
        .register(M002ReferenceIndexes)
}

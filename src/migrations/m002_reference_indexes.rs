//! Lookup indexes for reference filtering and deletion guards.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::db::SqlExecutor;
use crate::error::AppError;
use crate::migrations::Migration;

pub struct M002ReferenceIndexes;

impl Migration for M002ReferenceIndexes {
    fn id(&self) -> &'static str {
        "m002_reference_indexes"
    }

    fn version(&self) -> u32 {
        2
    }

    fn description(&self) -> &'static str {
        "Indexes for entity lookups, term groups and deletion guards"
    }

    fn up<'a>(&'a self, ctx: &'a (dyn SqlExecutor + Sync)) -> BoxFuture<'a, Result<(), AppError>> {
        async move {
            // group filters join references of the same entity
            ctx.batch_execute(
                r#"
                CREATE INDEX IF NOT EXISTS term_references_entity_idx
                ON term_references (entity_id, namespace_id);

                CREATE INDEX IF NOT EXISTS term_references_namespace_idx
                ON term_references (namespace_id);

                CREATE INDEX IF NOT EXISTS term_vocabularies_vocabulary_idx
                ON term_vocabularies (vocabulary_id);

                CREATE INDEX IF NOT EXISTS term_relations_sub_idx
                ON term_relations (sub_id);

                CREATE INDEX IF NOT EXISTS vocabularies_parent_idx
                ON vocabularies (parent_id);
                "#,
            )
            .await
        }
        .boxed()
    }
}

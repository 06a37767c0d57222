//! Core tables for vocabularies, terms, namespaces and references.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::db::SqlExecutor;
use crate::error::AppError;
use crate::migrations::Migration;

pub struct M001Schema;

impl Migration for M001Schema {
    fn id(&self) -> &'static str {
        "m001_schema"
    }

    fn version(&self) -> u32 {
        1
    }

    fn description(&self) -> &'static str {
        "Core taxonomy tables"
    }

    fn up<'a>(&'a self, ctx: &'a (dyn SqlExecutor + Sync)) -> BoxFuture<'a, Result<(), AppError>> {
        async move {
            ctx.batch_execute(
                r#"
                CREATE TABLE IF NOT EXISTS namespaces (
                    id BIGSERIAL PRIMARY KEY,
                    name TEXT NOT NULL,
                    title TEXT NOT NULL DEFAULT '',
                    CONSTRAINT namespaces_name_key UNIQUE (name)
                );

                CREATE TABLE IF NOT EXISTS vocabularies (
                    id BIGSERIAL PRIMARY KEY,
                    name TEXT NOT NULL,
                    title TEXT NOT NULL,
                    description TEXT,
                    parent_id BIGINT REFERENCES vocabularies (id) ON DELETE RESTRICT
                );

                -- NULL parents compare equal so root names stay unique
                CREATE UNIQUE INDEX IF NOT EXISTS vocabularies_name_parent_key
                ON vocabularies (name, COALESCE(parent_id, 0));

                CREATE TABLE IF NOT EXISTS terms (
                    id BIGSERIAL PRIMARY KEY,
                    name TEXT NOT NULL,
                    title TEXT NOT NULL,
                    description TEXT
                );

                CREATE TABLE IF NOT EXISTS term_vocabularies (
                    term_id BIGINT NOT NULL REFERENCES terms (id) ON DELETE CASCADE,
                    vocabulary_id BIGINT NOT NULL REFERENCES vocabularies (id) ON DELETE RESTRICT,
                    PRIMARY KEY (term_id, vocabulary_id)
                );

                CREATE TABLE IF NOT EXISTS term_relations (
                    super_id BIGINT NOT NULL REFERENCES terms (id) ON DELETE CASCADE,
                    sub_id BIGINT NOT NULL REFERENCES terms (id) ON DELETE CASCADE,
                    PRIMARY KEY (super_id, sub_id),
                    CONSTRAINT term_relations_not_self CHECK (super_id <> sub_id)
                );

                CREATE TABLE IF NOT EXISTS term_references (
                    id BIGSERIAL PRIMARY KEY,
                    term_id BIGINT NOT NULL REFERENCES terms (id) ON DELETE RESTRICT,
                    namespace_id BIGINT NOT NULL REFERENCES namespaces (id) ON DELETE RESTRICT,
                    entity_id TEXT NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    CONSTRAINT term_references_term_namespace_entity_key
                        UNIQUE (term_id, namespace_id, entity_id)
                );
                "#,
            )
            .await
        }
        .boxed()
    }
}

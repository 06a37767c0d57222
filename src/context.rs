//! Application context providing dependency injection root.

use std::sync::Arc;

use crate::config::Config;
use crate::db::backends::postgres::PostgresClient;
use crate::di::Context as ContextDerive;
use crate::error::AppError;
use crate::repositories::{
    MemoryStore, NamespaceRepository, PgNamespaceRepository, PgReferenceRepository,
    PgTermRepository, PgTransactions, PgVocabularyRepository, ReferenceRepository,
    TermRepository, TransactionProvider, VocabularyRepository,
};

/// Namespace storage shared across services.
pub type AppNamespaces = Arc<dyn NamespaceRepository>;
/// Vocabulary storage shared across services.
pub type AppVocabularies = Arc<dyn VocabularyRepository>;
/// Term storage shared across services.
pub type AppTerms = Arc<dyn TermRepository>;
/// Reference storage shared across services.
pub type AppReferences = Arc<dyn ReferenceRepository>;
/// Source of units of work.
pub type AppTransactions = Arc<dyn TransactionProvider>;
/// Shared configuration.
pub type AppConfig = Arc<Config>;

/// Root application context for dependency injection.
///
/// The Context holds all shared dependencies and uses `#[derive(Context)]`
/// to generate `FromRef` implementations for each field, enabling
/// compile-time dependency resolution.
#[derive(ContextDerive, Clone)]
pub struct Context {
    pub namespaces: AppNamespaces,
    pub vocabularies: AppVocabularies,
    pub terms: AppTerms,
    pub references: AppReferences,
    pub transactions: AppTransactions,
    pub config: AppConfig,
}

impl Context {
    /// Creates a new context with the given dependencies.
    pub fn new(
        namespaces: AppNamespaces,
        vocabularies: AppVocabularies,
        terms: AppTerms,
        references: AppReferences,
        transactions: AppTransactions,
        config: Config,
    ) -> Self {
        Self {
            namespaces,
            vocabularies,
            terms,
            references,
            transactions,
            config: Arc::new(config),
        }
    }

    /// Connects to PostgreSQL and wires the PostgreSQL repositories.
    pub async fn connect(config: Config) -> Result<Self, AppError> {
        let client =
            PostgresClient::connect(&config.postgres.uri, config.postgres.pool_size).await?;
        Ok(Self::postgres(client, config))
    }

    /// Wires the PostgreSQL repositories over an existing client.
    pub fn postgres(client: PostgresClient, config: Config) -> Self {
        Self::new(
            Arc::new(PgNamespaceRepository::new(client.clone())),
            Arc::new(PgVocabularyRepository::new(client.clone())),
            Arc::new(PgTermRepository::new(client.clone())),
            Arc::new(PgReferenceRepository::new(client.clone())),
            Arc::new(PgTransactions::new(client)),
            config,
        )
    }

    /// Wires every repository to one in-memory store.
    pub fn in_memory(config: Config) -> Self {
        Self::from_store(MemoryStore::new(), config)
    }

    /// Wires every repository to the given in-memory store.
    pub fn from_store(store: MemoryStore, config: Config) -> Self {
        Self::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
            config,
        )
    }
}

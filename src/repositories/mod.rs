//! Data access layer.
//!
//! Services depend on the capability traits in this module; the PostgreSQL
//! and in-memory implementations are chosen when the
//! [`Context`](crate::context::Context) is built.

mod memory;
pub mod postgres;
mod traits;

pub use memory::MemoryStore;
pub use postgres::{
    PgNamespaceRepository, PgReferenceRepository, PgTermRepository, PgTransactions,
    PgUnitOfWork, PgVocabularyRepository,
};
pub use traits::{
    NamespaceRepository, ReferenceRepository, TermRepository, TransactionProvider, UnitOfWork,
    VocabularyRepository,
};

//! Domain models for the taxonomy.

mod filter;
mod id;
mod namespace;
mod patch;
mod reference;
mod term;
mod vocabulary;

pub use filter::{
    NamespaceFilter, ParentFilter, ReferenceFilter, ReferenceQuery, TermFilter, VocabularyFilter,
};
pub use id::{NamespaceId, ReferenceId, TermId, VocabularyId};
pub use namespace::{Namespace, NamespaceInput, NamespacePatch};
pub use patch::Patch;
pub use reference::{EntityTerms, NewReference, Reference};
pub use term::{Term, TermInput, TermPatch};
pub use vocabulary::{Vocabulary, VocabularyInput, VocabularyPatch};

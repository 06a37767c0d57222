//! Listing filters shared by services, repositories and adapters.
//!
//! Every listing is ordered by ascending identity. `after` resumes strictly
//! past the given identity; `limit` caps the number of rows returned.

use super::{NamespaceId, ReferenceId, TermId, VocabularyId};

/// Filter for namespace listings.
#[derive(Debug, Clone, Default)]
pub struct NamespaceFilter {
    /// Match any of these ids.
    pub ids: Vec<NamespaceId>,
    /// Match any of these exact names.
    pub names: Vec<String>,
    pub after: Option<NamespaceId>,
    pub limit: Option<usize>,
}

impl NamespaceFilter {
    pub fn by_id(id: NamespaceId) -> Self {
        Self {
            ids: vec![id],
            ..Default::default()
        }
    }

    pub fn by_name(name: &str) -> Self {
        Self {
            names: vec![name.to_string()],
            ..Default::default()
        }
    }
}

/// Restricts vocabularies by their position in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentFilter {
    /// Only top-level vocabularies.
    Root,
    /// Only direct children of the given vocabulary.
    Of(VocabularyId),
}

/// Filter for vocabulary listings.
#[derive(Debug, Clone, Default)]
pub struct VocabularyFilter {
    pub ids: Vec<VocabularyId>,
    pub name: Option<String>,
    pub parent: Option<ParentFilter>,
    pub after: Option<VocabularyId>,
    pub limit: Option<usize>,
}

impl VocabularyFilter {
    pub fn by_id(id: VocabularyId) -> Self {
        Self {
            ids: vec![id],
            ..Default::default()
        }
    }
}

/// Filter for term listings.
#[derive(Debug, Clone, Default)]
pub struct TermFilter {
    pub ids: Vec<TermId>,
    /// Terms belonging to any of these vocabularies.
    pub vocabulary_ids: Vec<VocabularyId>,
    /// Terms listing this term among their super terms.
    pub super_term: Option<TermId>,
    /// Terms listing this term among their sub terms.
    pub sub_term: Option<TermId>,
    pub name: Option<String>,
    pub after: Option<TermId>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl TermFilter {
    pub fn by_id(id: TermId) -> Self {
        Self {
            ids: vec![id],
            ..Default::default()
        }
    }

    pub fn by_vocabulary(id: VocabularyId) -> Self {
        Self {
            vocabulary_ids: vec![id],
            ..Default::default()
        }
    }
}

/// Reference filter as supplied by callers, with namespaces given by name.
#[derive(Debug, Clone, Default)]
pub struct ReferenceFilter {
    /// OR within a group, AND across groups.
    pub term_groups: Vec<Vec<TermId>>,
    pub namespaces: Vec<String>,
    pub entity_ids: Vec<String>,
    pub after: Option<ReferenceId>,
    pub limit: Option<usize>,
}

/// Reference filter with namespaces resolved to ids, as executed by a
/// [`ReferenceRepository`](crate::repositories::ReferenceRepository).
///
/// A reference matches when its own term is in `term_ids` (if any), its
/// namespace in `namespace_ids` (if any), its entity in `entity_ids` (if
/// any), and its entity carries, for every group, some reference whose term
/// is in that group and whose namespace is in `namespace_ids` (any namespace
/// when empty).
#[derive(Debug, Clone, Default)]
pub struct ReferenceQuery {
    pub term_groups: Vec<Vec<TermId>>,
    pub term_ids: Vec<TermId>,
    pub namespace_ids: Vec<NamespaceId>,
    pub entity_ids: Vec<String>,
    pub after: Option<ReferenceId>,
    pub limit: Option<usize>,
}

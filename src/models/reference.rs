//! Reference model: the tagging edge between a term and an external entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{NamespaceId, ReferenceId, Term, TermId};

/// Records that a term is attached to an external entity within a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub id: ReferenceId,
    pub term_id: TermId,
    pub namespace_id: NamespaceId,
    /// Opaque identifier of the externally owned record.
    pub entity_id: String,
    pub created_at: DateTime<Utc>,
}

/// A reference about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReference {
    pub term_id: TermId,
    pub namespace_id: NamespaceId,
    pub entity_id: String,
}

/// The terms attached to one entity.
#[derive(Debug, Clone, Serialize)]
pub struct EntityTerms {
    pub entity_id: String,
    pub terms: Vec<Term>,
}

//! Vocabulary model: a named, hierarchical grouping of terms.

use serde::{Deserialize, Serialize};

use super::{Patch, VocabularyId};

/// A vocabulary such as "Color" or "Matrix type".
///
/// Vocabularies form a tree through `parent_id`. The parent link is a plain
/// identity resolved through the repository on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub id: VocabularyId,
    /// Name, unique among siblings sharing the same parent.
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub parent_id: Option<VocabularyId>,
}

/// Payload for creating a vocabulary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VocabularyInput {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<VocabularyId>,
}

/// Partial update for a vocabulary.
///
/// `Patch::Clear` on `parent_id` moves the vocabulary to the root.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VocabularyPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub parent_id: Patch<VocabularyId>,
}

impl VocabularyPatch {
    /// Merges the patch over the stored record.
    pub fn merge(self, current: Vocabulary) -> Vocabulary {
        Vocabulary {
            id: current.id,
            name: self.name.unwrap_or(current.name),
            title: self.title.unwrap_or(current.title),
            description: self.description.apply(current.description),
            parent_id: self.parent_id.apply(current.parent_id),
        }
    }
}

//! Term model: a single taxonomy value.

use serde::{Deserialize, Serialize};

use super::{Patch, TermId, VocabularyId};

/// A term such as "Red" or "OLED".
///
/// Besides vocabulary membership, terms carry a secondary hierarchy of
/// super-terms and sub-terms that is independent of the vocabulary tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    /// Owning vocabularies, never empty for a persisted term.
    pub vocabulary_ids: Vec<VocabularyId>,
    pub super_term_ids: Vec<TermId>,
    pub sub_term_ids: Vec<TermId>,
}

/// Payload for creating a term.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TermInput {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub vocabulary_ids: Vec<VocabularyId>,
    #[serde(default)]
    pub super_term_ids: Vec<TermId>,
    #[serde(default)]
    pub sub_term_ids: Vec<TermId>,
}

/// Partial update for a term.
///
/// Set-valued fields replace the stored set when present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TermPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub vocabulary_ids: Option<Vec<VocabularyId>>,
    #[serde(default)]
    pub super_term_ids: Option<Vec<TermId>>,
    #[serde(default)]
    pub sub_term_ids: Option<Vec<TermId>>,
}

impl TermPatch {
    /// Merges the patch over the stored record.
    ///
    /// An empty vocabulary set keeps the stored membership.
    pub fn merge(self, current: Term) -> Term {
        Term {
            id: current.id,
            name: self.name.unwrap_or(current.name),
            title: self.title.unwrap_or(current.title),
            description: self.description.apply(current.description),
            vocabulary_ids: self
                .vocabulary_ids
                .filter(|ids| !ids.is_empty())
                .unwrap_or(current.vocabulary_ids),
            super_term_ids: self.super_term_ids.unwrap_or(current.super_term_ids),
            sub_term_ids: self.sub_term_ids.unwrap_or(current.sub_term_ids),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Term {
        Term {
            id: TermId(1),
            name: "oled".into(),
            title: "OLED".into(),
            description: Some("Organic LED".into()),
            vocabulary_ids: vec![VocabularyId(3)],
            super_term_ids: vec![],
            sub_term_ids: vec![TermId(4)],
        }
    }

    #[test]
    fn test_merge_name_only_keeps_everything_else() {
        let patch = TermPatch {
            name: Some("amoled".into()),
            ..Default::default()
        };
        let merged = patch.merge(stored());

        assert_eq!(merged.name, "amoled");
        assert_eq!(merged.title, "OLED");
        assert_eq!(merged.description.as_deref(), Some("Organic LED"));
        assert_eq!(merged.vocabulary_ids, vec![VocabularyId(3)]);
        assert_eq!(merged.sub_term_ids, vec![TermId(4)]);
    }

    #[test]
    fn test_merge_clears_description() {
        let patch = TermPatch {
            description: Patch::Clear,
            ..Default::default()
        };
        assert_eq!(patch.merge(stored()).description, None);
    }

    #[test]
    fn test_merge_empty_vocabularies_keeps_membership() {
        let patch = TermPatch {
            vocabulary_ids: Some(vec![]),
            ..Default::default()
        };

        let merged = patch.merge(stored());
        assert_eq!(merged.vocabulary_ids, vec![VocabularyId(3)]);
    }
}

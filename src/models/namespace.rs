//! Namespace model scoping entity references.

use serde::{Deserialize, Serialize};

use super::NamespaceId;

/// A scope isolating which external entity collection a reference applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: NamespaceId,
    /// Unique name (e.g., "catalog", "blog-posts").
    pub name: String,
    pub title: String,
}

/// Payload for creating a namespace.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamespaceInput {
    pub name: String,
    #[serde(default)]
    pub title: String,
}

/// Partial update for a namespace. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamespacePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl NamespacePatch {
    /// Merges the patch over the stored record.
    pub fn merge(self, current: Namespace) -> Namespace {
        Namespace {
            id: current.id,
            name: self.name.unwrap_or(current.name),
            title: self.title.unwrap_or(current.title),
        }
    }
}

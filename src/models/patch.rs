//! Tri-state field for partial updates.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An update to an optional field.
///
/// Distinguishes "leave the stored value alone" from "clear it". When
/// deserialized with `#[serde(default)]`, an absent key is `Unchanged`, an
/// explicit `null` is `Clear` and any other value is `Set`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Unchanged,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    /// Resolves the patch against the currently stored value.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Unchanged => current,
            Patch::Clear => None,
            Patch::Set(value) => Some(value),
        }
    }

    /// Builds a patch from a "new value" / "clear" flag pair, as supplied by
    /// CLI flags and tool parameters.
    pub fn from_parts(value: Option<T>, clear: bool) -> Self {
        match (value, clear) {
            (Some(value), _) => Patch::Set(value),
            (None, true) => Patch::Clear,
            (None, false) => Patch::Unchanged,
        }
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Patch::Set(value) => serializer.serialize_some(value),
            _ => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(value) => Patch::Set(value),
            None => Patch::Clear,
        })
    }
}

//! Typed identities for persisted taxonomy records.
//!
//! Each record kind gets its own newtype over the database `BIGINT` key so a
//! term id can never be passed where a vocabulary id is expected.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Returns the raw database key.
            pub fn get(self) -> i64 {
                self.0
            }

            /// Converts the key into the unsigned form carried by pagination cursors.
            pub fn to_cursor_key(self) -> Result<u64, AppError> {
                u64::try_from(self.0).map_err(|_| {
                    AppError::Internal(format!(
                        "{} {} cannot be used as a cursor key",
                        stringify!($name),
                        self.0
                    ))
                })
            }

            /// Converts an unsigned cursor key back into an identity.
            pub fn from_cursor_key(key: u64) -> Result<Self, AppError> {
                i64::try_from(key).map(Self).map_err(|_| {
                    AppError::Decode(crate::cursor::CursorError::Shape(format!(
                        "cursor key {} is out of range for {}",
                        key,
                        stringify!($name)
                    )))
                })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Identity of a [`Namespace`](super::Namespace).
    NamespaceId
);
define_id!(
    /// Identity of a [`Vocabulary`](super::Vocabulary).
    VocabularyId
);
define_id!(
    /// Identity of a [`Term`](super::Term).
    TermId
);
define_id!(
    /// Identity of a [`Reference`](super::Reference).
    ReferenceId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_key_round_trip() {
        let id = TermId(42);
        let key = id.to_cursor_key().unwrap();
        assert_eq!(TermId::from_cursor_key(key).unwrap(), id);
    }

    #[test]
    fn test_negative_id_is_not_a_cursor_key() {
        assert!(NamespaceId(-1).to_cursor_key().is_err());
    }

    #[test]
    fn test_oversized_cursor_key_is_a_decode_error() {
        let err = VocabularyId::from_cursor_key(u64::MAX).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::DecodeFailure);
    }

    #[test]
    fn test_serializes_as_plain_integer() {
        let json = serde_json::to_string(&ReferenceId(9)).unwrap();
        assert_eq!(json, "9");
    }
}

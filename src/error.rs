//! Application error types with MCP protocol conversion.

use rmcp::model::ErrorCode;
use thiserror::Error;

use crate::cursor::CursorError;
use crate::models::{NamespaceId, TermId, VocabularyId};

/// Coarse classification of an [`AppError`].
///
/// Adapters branch on the kind rather than on concrete variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    NotCreated,
    NotUpdated,
    NotDeleted,
    IntegrityViolation,
    ValidationFailure,
    DecodeFailure,
    Internal,
}

/// Application-level errors for the taxonomy service.
#[derive(Error, Debug)]
pub enum AppError {
    // Lookup errors
    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),

    #[error("Vocabulary not found: {0}")]
    VocabularyNotFound(VocabularyId),

    #[error("Term not found: {0}")]
    TermNotFound(TermId),

    // Write errors
    #[error("{entity} not created")]
    NotCreated {
        entity: &'static str,
        #[source]
        source: Box<AppError>,
    },

    #[error("{entity} {id} not updated")]
    NotUpdated {
        entity: &'static str,
        id: i64,
        #[source]
        source: Box<AppError>,
    },

    #[error("{entity} {id} not deleted")]
    NotDeleted {
        entity: &'static str,
        id: i64,
        #[source]
        source: Box<AppError>,
    },

    // Integrity errors
    #[error("Vocabulary {0} still has terms and cannot be deleted")]
    VocabularyHasTerms(VocabularyId),

    #[error("Term {0} is still referenced and cannot be deleted")]
    TermReferenceExists(TermId),

    #[error("Namespace {0} still holds references and cannot be deleted")]
    NamespaceReferenceExists(NamespaceId),

    #[error("Duplicate {entity} name: {name}")]
    DuplicateName { entity: &'static str, name: String },

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Vocabulary {0} cannot be its own parent")]
    SelfParent(VocabularyId),

    #[error("Vocabulary {id} cannot move under {parent}: {id} is one of its ancestors")]
    ParentCycle {
        id: VocabularyId,
        parent: VocabularyId,
    },

    // Cursor errors
    #[error("Invalid cursor: {0}")]
    Decode(#[from] CursorError),

    // Persistence errors
    #[error("Unique constraint violated: {message}")]
    UniqueViolation {
        constraint: Option<String>,
        message: String,
    },

    #[error("Constraint violated: {0}")]
    Constraint(String),

    #[error("Database query error: {message}")]
    Query { message: String, query: String },

    #[error("Internal error: {0}")]
    Internal(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl AppError {
    /// Returns the taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NamespaceNotFound(_)
            | AppError::VocabularyNotFound(_)
            | AppError::TermNotFound(_) => ErrorKind::NotFound,
            AppError::NotCreated { .. } => ErrorKind::NotCreated,
            AppError::NotUpdated { .. } => ErrorKind::NotUpdated,
            AppError::NotDeleted { .. } => ErrorKind::NotDeleted,
            AppError::VocabularyHasTerms(_)
            | AppError::TermReferenceExists(_)
            | AppError::NamespaceReferenceExists(_)
            | AppError::DuplicateName { .. } => ErrorKind::IntegrityViolation,
            AppError::Validation(_) | AppError::SelfParent(_) | AppError::ParentCycle { .. } => {
                ErrorKind::ValidationFailure
            }
            AppError::Decode(_) => ErrorKind::DecodeFailure,
            AppError::UniqueViolation { .. }
            | AppError::Constraint(_)
            | AppError::Query { .. }
            | AppError::Internal(_)
            | AppError::Config(_) => ErrorKind::Internal,
        }
    }

    /// Walks `NotCreated`/`NotUpdated`/`NotDeleted` wrappers down to the cause.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::NotCreated { source, .. }
            | AppError::NotUpdated { source, .. }
            | AppError::NotDeleted { source, .. } => source.root(),
            other => other,
        }
    }

    pub(crate) fn not_created(entity: &'static str, source: AppError) -> Self {
        AppError::NotCreated {
            entity,
            source: Box::new(source),
        }
    }

    pub(crate) fn not_updated(entity: &'static str, id: i64, source: AppError) -> Self {
        AppError::NotUpdated {
            entity,
            id,
            source: Box::new(source),
        }
    }

    pub(crate) fn not_deleted(entity: &'static str, id: i64, source: AppError) -> Self {
        AppError::NotDeleted {
            entity,
            id,
            source: Box::new(source),
        }
    }

    /// Converts a raw unique violation into a `DuplicateName` for `entity`.
    pub(crate) fn or_duplicate(self, entity: &'static str, name: &str) -> Self {
        match self {
            AppError::UniqueViolation { .. } => AppError::DuplicateName {
                entity,
                name: name.to_string(),
            },
            other => other,
        }
    }
}

impl From<AppError> for rmcp::model::ErrorData {
    fn from(err: AppError) -> Self {
        let app_code = match err.root() {
            AppError::NamespaceNotFound(_) => "NAMESPACE_NOT_FOUND",
            AppError::VocabularyNotFound(_) => "VOCABULARY_NOT_FOUND",
            AppError::TermNotFound(_) => "TERM_NOT_FOUND",
            AppError::VocabularyHasTerms(_) => "VOCABULARY_HAS_TERMS",
            AppError::TermReferenceExists(_) => "TERM_REFERENCE_EXISTS",
            AppError::NamespaceReferenceExists(_) => "NAMESPACE_REFERENCE_EXISTS",
            AppError::DuplicateName { .. } => "DUPLICATE_NAME",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::SelfParent(_) => "SELF_PARENT",
            AppError::ParentCycle { .. } => "PARENT_CYCLE",
            AppError::Decode(_) => "INVALID_CURSOR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::UniqueViolation { .. } | AppError::Constraint(_) => "CONSTRAINT_ERROR",
            AppError::Query { .. } => "QUERY_ERROR",
            _ => "INTERNAL_ERROR",
        };

        let code = match err.kind() {
            ErrorKind::NotFound => ErrorCode::RESOURCE_NOT_FOUND,
            ErrorKind::IntegrityViolation
            | ErrorKind::ValidationFailure
            | ErrorKind::DecodeFailure => ErrorCode::INVALID_PARAMS,
            ErrorKind::NotCreated | ErrorKind::NotUpdated | ErrorKind::NotDeleted => {
                match err.root().kind() {
                    ErrorKind::Internal => ErrorCode::INTERNAL_ERROR,
                    _ => ErrorCode::INVALID_PARAMS,
                }
            }
            ErrorKind::Internal => ErrorCode::INTERNAL_ERROR,
        };

        // Wrappers keep their cause out of Display, so spell out the chain.
        let head: &dyn std::error::Error = &err;
        let message = std::iter::successors(Some(head), |e| e.source())
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(": ");

        rmcp::model::ErrorData::new(code, format!("[{}] {}", app_code, message), None)
    }
}

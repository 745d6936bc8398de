//! Domain Errors
//!
//! Error types for domain operations.

use thiserror::Error;
use uuid::Uuid;

use crate::domain::value_objects::RecordKind;

/// Domain layer errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DomainError {
    /// No authorized account/session for the remote store
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// Create/update/delete against the remote store failed
    #[error("Remote write failed: {0}")]
    RemoteWrite(String),

    /// A remote record is missing required fields or has the wrong shape
    #[error("Malformed {kind} record: {reason}")]
    Decode { kind: RecordKind, reason: String },

    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    /// Local blob read/write failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Purchase error: {0}")]
    Commerce(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Entity not found: {kind} with id {id}")]
    NotFound { kind: RecordKind, id: String },
}

impl DomainError {
    pub fn not_found(kind: RecordKind, id: Uuid) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn decode<T: Into<String>>(kind: RecordKind, reason: T) -> Self {
        Self::Decode {
            kind,
            reason: reason.into(),
        }
    }

    /// Whether re-invoking the same operation may succeed without user action
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RemoteWrite(_) | Self::Generation(_))
    }
}

//! Error types for notehub operations

use crate::model::NoteId;
use thiserror::Error;

/// Failure reported by the remote note service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Network error: {message}")]
    Transport { message: String },

    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response: {message}")]
    InvalidResponse { message: String },
}

impl ServiceError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}

/// A listing fetch that failed after every allowed attempt.
///
/// Attached to the key's cache entry; any stale data stays visible.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{source}")]
pub struct FetchError {
    /// Display form of the query key the fetch was for.
    pub key: String,
    /// Number of attempts made, including the automatic retry.
    pub attempts: u32,
    pub source: ServiceError,
}

impl FetchError {
    pub fn new(key: impl Into<String>, attempts: u32, source: ServiceError) -> Self {
        Self {
            key: key.into(),
            attempts,
            source,
        }
    }
}

/// A create or delete that failed. Reported to the initiating control only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MutationError {
    #[error("Failed to create note: {0}")]
    Create(ServiceError),

    #[error("Failed to delete note {id}: {source}")]
    Delete { id: NoteId, source: ServiceError },

    #[error("{0} is already in progress")]
    Busy(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_displays_source() {
        let err = FetchError::new("[notes, 1, \"\"]", 2, ServiceError::api(500, "boom"));
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }

    #[test]
    fn test_mutation_error_messages() {
        let err = MutationError::Delete {
            id: NoteId::from("n1"),
            source: ServiceError::transport("connection reset"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to delete note n1: Network error: connection reset"
        );
        assert_eq!(
            MutationError::Busy("create").to_string(),
            "create is already in progress"
        );
    }
}

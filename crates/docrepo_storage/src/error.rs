//! Error types for backend operations.

use crate::types::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Result type for backend operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during backend operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend processed the request and rejected it.
    ///
    /// This is the only variant that carries a backend status code.
    #[error("backend returned {status}: {message}")]
    Status {
        /// Status code reported by the backend.
        status: StatusCode,
        /// Backend-supplied description.
        message: String,
    },

    /// The request never produced a backend response.
    #[error("transport error: {0}")]
    Transport(String),

    /// A document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A continuation token was not produced by this backend.
    #[error("invalid continuation token: {0}")]
    InvalidContinuation(String),

    /// The caller stopped waiting before the backend answered.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl StorageError {
    /// Creates a backend status error.
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Creates a `404 Not Found` status error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::status(StatusCode::NOT_FOUND, message)
    }

    /// Creates a `400 Bad Request` status error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::status(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a `409 Conflict` status error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::status(StatusCode::CONFLICT, message)
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a deadline expiry error.
    pub fn timeout(after: Duration) -> Self {
        Self::Timeout(after)
    }

    /// Returns the backend status code, if the backend reported one.
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the backend reported that the target does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(StatusCode::NOT_FOUND)
    }
}

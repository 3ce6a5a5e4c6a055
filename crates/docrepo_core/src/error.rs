//! Error types for repository operations.

use docrepo_storage::{StatusCode, StorageError};
use std::time::Duration;
use thiserror::Error;

/// Result type for repository operations.
pub type RepoResult<T> = Result<T, RepositoryError>;

/// Errors that can occur in repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database or container provisioning failed.
    #[error("failed to provision {resource}: {source}")]
    Provision {
        /// The database or container being provisioned.
        resource: String,
        /// Backend failure or deadline expiry.
        #[source]
        source: StorageError,
    },

    /// The store handle has not been initialized.
    #[error("store handle for {container} is not initialized")]
    NotInitialized {
        /// Container the handle manages.
        container: String,
    },

    /// A single create, update or delete failed.
    #[error("{operation} of entity {id} failed: {reason}")]
    Write {
        /// Operation that failed.
        operation: &'static str,
        /// Target entity id.
        id: String,
        /// Backend status code, when the backend reported one.
        status: Option<StatusCode>,
        /// Description of the failure.
        reason: String,
    },

    /// No document matched.
    #[error("entity not found: {id}")]
    NotFound {
        /// The id that was looked up.
        id: String,
    },

    /// Fetching a query page failed.
    #[error("query failed: {0}")]
    Query(#[source] StorageError),

    /// Converting between an entity and a document failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A backend round trip exceeded its deadline.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Operation that timed out.
        operation: &'static str,
        /// Configured deadline.
        after: Duration,
    },
}

impl RepositoryError {
    /// Creates a provisioning error.
    pub fn provision(resource: impl Into<String>, source: StorageError) -> Self {
        Self::Provision {
            resource: resource.into(),
            source,
        }
    }

    /// Creates a not-found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a write error for a response with an unexpected status.
    pub fn unexpected_status(
        operation: &'static str,
        id: impl Into<String>,
        expected: StatusCode,
        actual: StatusCode,
    ) -> Self {
        Self::Write {
            operation,
            id: id.into(),
            status: Some(actual),
            reason: format!("expected status {}, backend reported {}", expected, actual),
        }
    }

    /// Classifies a backend failure of a point write.
    ///
    /// `404 Not Found` becomes [`RepositoryError::NotFound`] when
    /// `absent_is_not_found` is set; every other failure is a
    /// [`RepositoryError::Write`].
    pub fn from_write(
        operation: &'static str,
        id: impl Into<String>,
        source: StorageError,
        absent_is_not_found: bool,
    ) -> Self {
        let id = id.into();
        if absent_is_not_found && source.is_not_found() {
            return Self::NotFound { id };
        }
        match source {
            StorageError::Status { status, message } => Self::Write {
                operation,
                id,
                status: Some(status),
                reason: message,
            },
            other => Self::Write {
                operation,
                id,
                status: None,
                reason: other.to_string(),
            },
        }
    }

    /// Returns true for [`RepositoryError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns the backend status code carried by a write failure.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Write { status, .. } => *status,
            Self::Provision { source, .. } | Self::Query(source) => source.status_code(),
            _ => None,
        }
    }
}

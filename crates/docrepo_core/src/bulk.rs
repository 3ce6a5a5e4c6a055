//! Concurrent bulk creation with per-item outcomes.

use crate::entity::Entity;
use crate::store::{within, StoreHandle};
use docrepo_storage::{Document, StatusCode, StorageError};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Why a single item of a bulk create failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BulkItemError {
    /// The backend rejected the write with a status code.
    #[error("backend rejected item with {status}: {message}")]
    Backend {
        /// Status the backend reported.
        status: StatusCode,
        /// Backend message.
        message: String,
    },

    /// The write failed without a backend status (transport, encoding,
    /// deadline or task failure).
    #[error("{message}")]
    Other {
        /// Description of the cause.
        message: String,
    },
}

impl BulkItemError {
    fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Returns the backend status, if the backend reported one.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Backend { status, .. } => Some(*status),
            Self::Other { .. } => None,
        }
    }
}

impl From<StorageError> for BulkItemError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Status { status, message } => Self::Backend { status, message },
            other => Self::other(other.to_string()),
        }
    }
}

/// Result of one item in a bulk create.
///
/// Outcomes are returned in input order: outcome `k` belongs to input `k`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    /// Id of the entity this outcome belongs to.
    pub id: String,
    /// `Ok` if the item was created.
    pub result: Result<(), BulkItemError>,
}

impl ItemOutcome {
    /// Returns true if the item was created.
    #[must_use]
    pub fn success(&self) -> bool {
        self.result.is_ok()
    }

    /// Returns the failure message, or an empty string on success.
    #[must_use]
    pub fn error(&self) -> String {
        match &self.result {
            Ok(()) => String::new(),
            Err(e) => e.to_string(),
        }
    }
}

/// Issues independent creates concurrently and collects every outcome.
///
/// Each item runs as its own task. At most
/// [`RepositoryConfig::max_concurrency`](crate::RepositoryConfig::max_concurrency)
/// writes are in flight at once. The call returns only after every item has
/// finished; one failure never cancels or rolls back its siblings.
pub(crate) struct BulkWriter {
    store: Arc<StoreHandle>,
}

impl BulkWriter {
    pub(crate) fn new(store: Arc<StoreHandle>) -> Self {
        Self { store }
    }

    pub(crate) async fn create_all<T: Entity>(&self, entities: Vec<T>) -> Vec<ItemOutcome> {
        let started = Instant::now();
        let total = entities.len();
        let limit = self.store.config().effective_concurrency();
        let permits = Arc::new(Semaphore::new(limit));
        debug!(total, limit, container = %self.store.container(), "bulk create starting");

        let mut pending = Vec::with_capacity(total);
        for entity in entities {
            let id = entity.id().to_string();
            let partition_key = entity.partition_key().to_string();

            let task = serde_json::to_value(&entity)
                .map(|document| {
                    tokio::spawn(create_one(
                        Arc::clone(&self.store),
                        Arc::clone(&permits),
                        partition_key,
                        document,
                    ))
                })
                .map_err(|e| BulkItemError::other(format!("failed to encode entity: {}", e)));
            pending.push((id, task));
        }

        let mut outcomes = Vec::with_capacity(total);
        for (id, task) in pending {
            let result = match task {
                Ok(handle) => match handle.await {
                    Ok(result) => result,
                    Err(e) => Err(BulkItemError::other(format!("write task failed: {}", e))),
                },
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                warn!(id = %id, error = %e, "bulk item failed");
            }
            outcomes.push(ItemOutcome { id, result });
        }

        let succeeded = outcomes.iter().filter(|o| o.success()).count();
        info!(
            total,
            succeeded,
            failed = total - succeeded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "bulk create finished"
        );
        outcomes
    }
}

async fn create_one(
    store: Arc<StoreHandle>,
    permits: Arc<Semaphore>,
    partition_key: String,
    document: Document,
) -> Result<(), BulkItemError> {
    let _permit = permits
        .acquire_owned()
        .await
        .map_err(|e| BulkItemError::other(e.to_string()))?;

    let write = store
        .backend()
        .create_item(store.container(), &partition_key, document);
    let response = within(store.config().operation_timeout, write)
        .await
        .map_err(|after| BulkItemError::other(format!("create timed out after {:?}", after)))??;

    if response.status == StatusCode::CREATED {
        Ok(())
    } else {
        Err(BulkItemError::Backend {
            status: response.status,
            message: format!("expected status {}", StatusCode::CREATED),
        })
    }
}

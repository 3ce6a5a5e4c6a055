//! Store handle: database and container lifecycle.

use crate::config::RepositoryConfig;
use crate::error::{RepoResult, RepositoryError};
use docrepo_storage::{ContainerPath, DocumentBackend, StatusCode, StorageError, StorageResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Whether a provisioning step created a resource or found it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStatus {
    /// The resource was created.
    Created,
    /// The resource already existed with compatible settings.
    Existing,
}

impl ProvisionStatus {
    /// Maps a provisioning response: `201` created, `200` already present.
    fn from_status(status: StatusCode) -> Option<Self> {
        match status {
            StatusCode::CREATED => Some(Self::Created),
            StatusCode::OK => Some(Self::Existing),
            _ => None,
        }
    }
}

/// Outcome of a successful [`StoreHandle::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provisioned {
    /// Database provisioning result.
    pub database: ProvisionStatus,
    /// Container provisioning result.
    pub container: ProvisionStatus,
}

/// Owns the lifecycle of one database and one container within it.
///
/// A handle is created unready. [`initialize`](Self::initialize) provisions
/// the database and container on the backend; repositories can only be built
/// over a ready handle. After initialization the handle is read-only and can
/// be shared by any number of repositories and tasks.
///
/// # Example
///
/// ```rust
/// use docrepo_core::{RepositoryConfig, StoreHandle};
/// use docrepo_storage::InMemoryBackend;
/// use std::sync::Arc;
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let store = StoreHandle::new(Arc::new(InMemoryBackend::new()), RepositoryConfig::new("db", "items"));
/// assert!(!store.is_ready());
///
/// store.initialize().await.unwrap();
/// assert!(store.is_ready());
/// # });
/// ```
pub struct StoreHandle {
    backend: Arc<dyn DocumentBackend>,
    config: RepositoryConfig,
    container: ContainerPath,
    ready: OnceCell<Provisioned>,
}

impl StoreHandle {
    /// Creates an unready handle. Performs no I/O.
    pub fn new(backend: Arc<dyn DocumentBackend>, config: RepositoryConfig) -> Self {
        let container = ContainerPath::new(config.database.clone(), config.container.clone());
        Self {
            backend,
            config,
            container,
            ready: OnceCell::new(),
        }
    }

    /// Ensures the database and container exist.
    ///
    /// Creates whichever is missing, using the configured partition key path,
    /// indexing policy and throughput. Once this succeeds the result is
    /// cached and later calls return it without touching the backend. A
    /// failed attempt leaves the handle unready; the core does not retry.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Provision`] if either step fails: the
    /// backend rejects it (including when the container exists with a
    /// different partition key path), answers with a status other than
    /// `201 Created` or `200 OK`, or misses the configured deadline.
    pub async fn initialize(&self) -> RepoResult<Provisioned> {
        self.ready
            .get_or_try_init(|| self.provision())
            .await
            .copied()
    }

    async fn provision(&self) -> RepoResult<Provisioned> {
        let database = &self.config.database;
        let database_status = self
            .provision_step(
                "create database",
                format!("database {}", database),
                self.backend.create_database_if_not_exists(database),
            )
            .await?;

        let properties = self.config.container_properties();
        let container_status = self
            .provision_step(
                "create container",
                format!("container {}", self.container),
                self.backend.create_container_if_not_exists(
                    database,
                    &properties,
                    self.config.throughput,
                ),
            )
            .await?;

        info!(
            container = %self.container,
            partition_key_path = %properties.partition_key_path,
            database_status = ?database_status,
            container_status = ?container_status,
            "store ready"
        );

        Ok(Provisioned {
            database: database_status,
            container: container_status,
        })
    }

    /// Runs one provisioning request under the deadline.
    ///
    /// Every failure, including deadline expiry and a response other than
    /// `201` or `200`, is reported as [`RepositoryError::Provision`].
    async fn provision_step<F>(
        &self,
        operation: &'static str,
        resource: String,
        request: F,
    ) -> RepoResult<ProvisionStatus>
    where
        F: Future<Output = StorageResult<StatusCode>>,
    {
        let outcome = within(self.config.operation_timeout, request)
            .await
            .unwrap_or_else(|after| Err(StorageError::timeout(after)))
            .and_then(|status| {
                ProvisionStatus::from_status(status).ok_or_else(|| {
                    StorageError::status(status, format!("unexpected response to {}", operation))
                })
            });

        outcome.map_err(|e| {
            warn!(operation, resource = %resource, error = %e, "provisioning failed");
            RepositoryError::provision(resource, e)
        })
    }

    /// Returns true once [`initialize`](Self::initialize) has succeeded.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.initialized()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Returns the address of the managed container.
    #[must_use]
    pub fn container(&self) -> &ContainerPath {
        &self.container
    }

    pub(crate) fn backend(&self) -> &Arc<dyn DocumentBackend> {
        &self.backend
    }

    pub(crate) fn ensure_ready(&self) -> RepoResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(RepositoryError::NotInitialized {
                container: self.container.to_string(),
            })
        }
    }

    /// Awaits `fut` within the configured operation deadline.
    pub(crate) async fn deadline<F: Future>(
        &self,
        operation: &'static str,
        fut: F,
    ) -> RepoResult<F::Output> {
        within(self.config.operation_timeout, fut)
            .await
            .map_err(|after| {
                debug!(operation, ?after, "deadline exceeded");
                RepositoryError::Timeout { operation, after }
            })
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("container", &self.container)
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

/// Awaits `fut`, giving up after `limit`.
///
/// Returns the elapsed limit as the error.
pub(crate) async fn within<F: Future>(limit: Option<Duration>, fut: F) -> Result<F::Output, Duration> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| limit),
        None => Ok(fut.await),
    }
}

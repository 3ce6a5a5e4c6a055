//! Repository configuration.

use crate::entity::Entity;
use docrepo_storage::{ContainerProperties, IndexingPolicy, DEFAULT_PARTITION_KEY_PATH};
use std::time::Duration;

/// Configuration for a store handle and the repositories built on it.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Database name.
    pub database: String,

    /// Container name.
    pub container: String,

    /// JSON pointer of the partition key inside each document.
    pub partition_key_path: String,

    /// Indexing policy applied when the container is created.
    pub indexing_policy: IndexingPolicy,

    /// Provisioned throughput in request units (`None` = backend default).
    pub throughput: Option<u32>,

    /// Maximum number of concurrent writes issued by a bulk create.
    pub max_concurrency: usize,

    /// Maximum number of documents requested per query page.
    pub page_size: usize,

    /// Deadline for each backend round trip (`None` = wait indefinitely).
    pub operation_timeout: Option<Duration>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            database: String::new(),
            container: String::new(),
            partition_key_path: DEFAULT_PARTITION_KEY_PATH.to_string(),
            indexing_policy: IndexingPolicy::exclude_all(),
            throughput: Some(1000),
            max_concurrency: 64,
            page_size: 100,
            operation_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl RepositoryConfig {
    /// Creates a configuration for the given database and container.
    #[must_use]
    pub fn new(database: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            container: container.into(),
            ..Self::default()
        }
    }

    /// Creates a configuration using the entity type's default container.
    #[must_use]
    pub fn for_entity<T: Entity>(database: impl Into<String>) -> Self {
        Self::new(database, T::CONTAINER)
    }

    /// Sets the partition key path.
    #[must_use]
    pub fn partition_key_path(mut self, path: impl Into<String>) -> Self {
        self.partition_key_path = path.into();
        self
    }

    /// Sets the indexing policy.
    #[must_use]
    pub fn indexing_policy(mut self, policy: IndexingPolicy) -> Self {
        self.indexing_policy = policy;
        self
    }

    /// Sets the provisioned throughput.
    #[must_use]
    pub fn throughput(mut self, throughput: Option<u32>) -> Self {
        self.throughput = throughput;
        self
    }

    /// Sets the bulk write concurrency limit. Values below 1 are treated as 1.
    #[must_use]
    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit;
        self
    }

    /// Sets the query page size. Values below 1 are treated as 1.
    #[must_use]
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Sets the per-operation deadline.
    #[must_use]
    pub fn operation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Returns the container properties to provision.
    #[must_use]
    pub fn container_properties(&self) -> ContainerProperties {
        ContainerProperties::new(self.container.clone(), self.partition_key_path.clone())
            .with_indexing_policy(self.indexing_policy.clone())
    }

    pub(crate) fn effective_concurrency(&self) -> usize {
        self.max_concurrency.max(1)
    }

    pub(crate) fn effective_page_size(&self) -> usize {
        self.page_size.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = RepositoryConfig::default();
        assert_eq!(config.partition_key_path, "/partitionKey");
        assert!(config.indexing_policy.excludes_everything());
        assert_eq!(config.throughput, Some(1000));
        assert_eq!(config.max_concurrency, 64);
        assert_eq!(config.operation_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn builder_pattern() {
        let config = RepositoryConfig::new("db", "items")
            .partition_key_path("/tenant")
            .max_concurrency(0)
            .page_size(0)
            .throughput(None)
            .operation_timeout(None);

        assert_eq!(config.database, "db");
        assert_eq!(config.container, "items");
        assert_eq!(config.effective_concurrency(), 1);
        assert_eq!(config.effective_page_size(), 1);
        assert_eq!(config.throughput, None);

        let props = config.container_properties();
        assert_eq!(props.id, "items");
        assert_eq!(props.partition_key_path, "/tenant");
    }
}

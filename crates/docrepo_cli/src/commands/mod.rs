//! CLI command implementations.

pub mod roundtrip;
pub mod seed;

use docrepo_core::{RepoResult, Repository, RepositoryConfig};
use docrepo_storage::{DocumentBackend, InMemoryBackend};
use docrepo_testkit::SampleEntity;
use std::sync::Arc;
use std::time::Duration;

/// Connects a repository over a fresh in-memory backend.
pub async fn connect(
    config: RepositoryConfig,
    latency: Option<Duration>,
) -> RepoResult<Repository<SampleEntity>> {
    let backend = match latency {
        Some(latency) => InMemoryBackend::new().with_latency(latency),
        None => InMemoryBackend::new(),
    };
    Repository::connect(Arc::new(backend) as Arc<dyn DocumentBackend>, config).await
}

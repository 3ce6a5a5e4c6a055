//! Benchmark utilities.

use docrepo_core::{Repository, RepositoryConfig};
use docrepo_storage::{DocumentBackend, InMemoryBackend};
use docrepo_testkit::{test_config, SampleEntity};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

/// Builds the multi-threaded runtime the benchmarks drive futures on.
pub fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build tokio runtime")
}

/// Configuration with the given bulk concurrency and query page size.
pub fn bench_config(max_concurrency: usize, page_size: usize) -> RepositoryConfig {
    test_config()
        .max_concurrency(max_concurrency)
        .page_size(page_size)
}

/// Connects a repository over a fresh in-memory backend.
///
/// A non-zero `latency` delays every backend call, which makes the effect of
/// the concurrency limit visible.
pub fn connect(rt: &Runtime, config: RepositoryConfig, latency: Duration) -> Repository<SampleEntity> {
    let backend = if latency.is_zero() {
        InMemoryBackend::new()
    } else {
        InMemoryBackend::new().with_latency(latency)
    };
    rt.block_on(Repository::connect(
        Arc::new(backend) as Arc<dyn DocumentBackend>,
        config,
    ))
    .expect("Failed to connect repository")
}

/// Connects a repository and stores `count` random entities in it.
pub fn populated(rt: &Runtime, config: RepositoryConfig, count: usize) -> Repository<SampleEntity> {
    let repo = connect(rt, config, Duration::ZERO);
    let outcomes = rt.block_on(repo.create_many(SampleEntity::generate(count)));
    assert!(outcomes.iter().all(|o| o.success()), "seeding failed");
    repo
}

/// Picks a random locator that exists in `entities`.
pub fn random_locator(entities: &[SampleEntity]) -> i32 {
    let mut rng = rand::thread_rng();
    entities[rng.gen_range(0..entities.len())].locator
}

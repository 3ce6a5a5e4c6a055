//! Single-entity round trip through every repository operation.

use super::connect;
use docrepo_core::{Filter, RepositoryConfig};
use docrepo_testkit::SampleEntity;
use std::future::Future;
use std::time::{Duration, Instant};

async fn timed<F, T>(label: &str, fut: F) -> T
where
    F: Future<Output = T>,
{
    let started = Instant::now();
    let value = fut.await;
    println!("  {:<18} {:?}", label, started.elapsed());
    value
}

/// Creates one entity, reads it back several ways, updates it and deletes it.
pub async fn run(
    config: RepositoryConfig,
    latency: Option<Duration>,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = connect(config, latency).await?;
    let mut record = SampleEntity::random();
    let twin = SampleEntity::random();

    println!("Round trip for entity {}", record.id);
    timed("create", repo.create(&record)).await?;
    timed("create (twin)", repo.create(&twin)).await?;

    let found = timed("get_by_id", repo.get_by_id(&record.id)).await?;
    if found != record {
        return Err("read back a different entity".into());
    }
    timed("get_by_key", repo.get_by_key(&record.id, &record.partition_key)).await?;

    let by_locator = timed(
        "get_by_filter",
        repo.get_by_filter(Filter::field("locator").eq(record.locator)),
    )
    .await?;
    let name = record.name.clone();
    let by_name = timed("get_matching", repo.get_matching(|e| e.name == name)).await?;
    if by_locator.is_empty() || by_name.is_empty() {
        return Err("query did not return the created entity".into());
    }
    let all = timed("get_all", repo.get_all()).await?;
    println!("  {} entities stored", all.len());

    record.name = "Changed Name".to_string();
    timed("update", repo.update(&record.id, &record)).await?;

    timed("delete_by_id", repo.delete_by_id(&record.id)).await?;
    timed("delete_by_entity", repo.delete_by_entity(&twin)).await?;

    println!("✓ Round trip completed");
    Ok(())
}

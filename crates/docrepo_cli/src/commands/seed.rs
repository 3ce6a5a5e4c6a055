//! Bulk seeding command.

use super::connect;
use docrepo_core::RepositoryConfig;
use docrepo_testkit::{IngestReport, SampleEntity};
use std::time::{Duration, Instant};
use tracing::info;

/// Creates `count` random entities in one bulk call and reports the outcome.
pub async fn run(
    config: RepositoryConfig,
    latency: Option<Duration>,
    count: usize,
    page_size: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match page_size {
        Some(size) => config.page_size(size),
        None => config,
    };
    let concurrency = config.max_concurrency;
    let repo = connect(config, latency).await?;

    let entities = SampleEntity::generate(count);
    info!(count, concurrency, "seeding");

    let started = Instant::now();
    let outcomes = repo.create_many(entities).await;
    let report = IngestReport::from_outcomes(&outcomes, started.elapsed());

    let drain = match page_size {
        Some(_) => {
            let started = Instant::now();
            let drained = repo.get_all().await?.len();
            Some((drained, started.elapsed()))
        }
        None => None,
    };

    match format {
        "json" => {
            let output = serde_json::json!({
                "total": report.total,
                "succeeded": report.succeeded,
                "failed": report.failed,
                "elapsedMs": report.duration.as_millis() as u64,
                "itemsPerSecond": report.items_per_second,
                "failures": report.failures,
                "drain": drain.map(|(items, elapsed)| serde_json::json!({
                    "items": items,
                    "elapsedMs": elapsed.as_millis() as u64,
                })),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        _ => {
            report.print_summary("Seed");
            if let Some((items, elapsed)) = drain {
                println!("Drained {} items in {:?}", items, elapsed);
            }
        }
    }

    if report.all_succeeded() {
        Ok(())
    } else {
        Err(format!("{} of {} items failed", report.failed, report.total).into())
    }
}

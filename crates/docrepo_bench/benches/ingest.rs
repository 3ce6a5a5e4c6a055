//! Single versus bulk ingest benchmarks.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use docrepo_bench::utils::{bench_config, connect, runtime};
use docrepo_testkit::SampleEntity;
use std::time::Duration;

const BATCH: usize = 200;

/// Benchmark sequential single creates.
fn bench_single_create(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("single_create");
    group.throughput(Throughput::Elements(BATCH as u64));

    let repo = connect(&rt, bench_config(1, 100), Duration::ZERO);
    group.bench_function("sequential", |b| {
        b.to_async(&rt).iter_batched(
            || SampleEntity::generate(BATCH),
            |batch| {
                let repo = repo.clone();
                async move {
                    for entity in &batch {
                        repo.create(entity).await.unwrap();
                    }
                }
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

/// Benchmark bulk creates at different concurrency limits.
fn bench_create_many(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("create_many");
    group.throughput(Throughput::Elements(BATCH as u64));

    for limit in [1, 8, 64, 256] {
        let repo = connect(&rt, bench_config(limit, 100), Duration::ZERO);
        group.bench_with_input(BenchmarkId::from_parameter(limit), &limit, |b, _| {
            b.to_async(&rt).iter_batched(
                || SampleEntity::generate(BATCH),
                |batch| {
                    let repo = repo.clone();
                    async move { repo.create_many(batch).await }
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

/// Benchmark bulk creates against a backend with per-call latency.
fn bench_create_many_with_latency(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("create_many_latency");
    group.sample_size(10);
    group.throughput(Throughput::Elements(BATCH as u64));

    for limit in [4, 32, 128] {
        let repo = connect(&rt, bench_config(limit, 100), Duration::from_millis(1));
        group.bench_with_input(BenchmarkId::from_parameter(limit), &limit, |b, _| {
            b.to_async(&rt).iter_batched(
                || SampleEntity::generate(BATCH),
                |batch| {
                    let repo = repo.clone();
                    async move { repo.create_many(batch).await }
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_single_create,
    bench_create_many,
    bench_create_many_with_latency
);
criterion_main!(benches);

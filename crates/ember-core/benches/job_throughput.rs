use criterion::{criterion_group, criterion_main, Criterion};
use ember_core::job::{FnJob, JobCategory, JobSystem, JobSystemConfig};
use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const BATCH: usize = 1_000;

/// Drains finish callbacks until `expected` jobs have been reaped.
fn drain(system: &JobSystem, category: JobCategory, expected: usize) {
    let mut reaped = 0;
    while reaped < expected {
        reaped += system.process_finish_callbacks(category).unwrap_or(0);
        std::thread::yield_now();
    }
}

fn bench_jobs(c: &mut Criterion) {
    let system = JobSystem::startup(JobSystemConfig::default()).expect("job system");
    let sum = Arc::new(AtomicU64::new(0));

    let mut group = c.benchmark_group("Job System");

    group.bench_function("1k independent generic jobs", |b| {
        b.iter(|| {
            for i in 0..BATCH as u64 {
                let sum = sum.clone();
                system
                    .submit(
                        FnJob::new("add", move || {
                            sum.fetch_add(black_box(i), Ordering::Relaxed);
                        }),
                        JobCategory::GENERIC,
                    )
                    .expect("submit");
            }
            drain(&system, JobCategory::GENERIC, BATCH);
        });
    });

    group.bench_function("1k job dependency chain", |b| {
        b.iter(|| {
            let mut previous = None;
            let mut first = None;
            for i in 0..BATCH as u64 {
                let sum = sum.clone();
                let id = system
                    .create(
                        FnJob::new("link", move || {
                            sum.fetch_add(black_box(i), Ordering::Relaxed);
                        }),
                        JobCategory::GENERIC,
                    )
                    .expect("create");
                if let Some(previous) = previous {
                    system.add_successor(previous, id).expect("edge");
                } else {
                    first = Some(id);
                }
                previous = Some(id);
            }
            if let Some(first) = first {
                system.run(first).expect("run");
            }
            drain(&system, JobCategory::GENERIC, BATCH);
        });
    });

    group.bench_function("1k main-thread jobs drained inline", |b| {
        b.iter(|| {
            for i in 0..BATCH as u64 {
                let sum = sum.clone();
                system
                    .submit(
                        FnJob::new("inline", move || {
                            sum.fetch_add(black_box(i), Ordering::Relaxed);
                        }),
                        JobCategory::MAIN,
                    )
                    .expect("submit");
            }
            let executed = system.process_job_category(JobCategory::MAIN).expect("drain");
            black_box(executed);
            drain(&system, JobCategory::MAIN, BATCH);
        });
    });

    group.finish();
    system.shutdown();
}

criterion_group!(benches, bench_jobs);
criterion_main!(benches);

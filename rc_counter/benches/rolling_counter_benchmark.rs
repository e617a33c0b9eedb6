use std::hint::black_box;
use std::sync::Arc;
use std::thread;

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use rc_counter::ManualClock;
use rc_counter::RateLimiter;
use rc_counter::RollingCounter;
use rc_counter::RollingLimiter;

fn bench_single_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread");
    group.throughput(Throughput::Elements(1));

    let counter = RollingCounter::new(1000, 10).unwrap();
    group.bench_function("increment", |b| b.iter(|| counter.increment()));
    group.bench_function("sum", |b| b.iter(|| black_box(counter.sum())));

    let limiter = RollingLimiter::new(u64::MAX, 1000, 10).unwrap();
    group.bench_function("try_acquire_one", |b| b.iter(|| black_box(limiter.try_acquire_one())));

    group.finish();
}

fn bench_rotation(c: &mut Criterion) {
    let mut group = c.benchmark_group("rotation");

    // Every increment lands in a new bucket, exercising append and eviction
    for num_buckets in [10usize, 60, 600] {
        let clock = ManualClock::new();
        let counter = RollingCounter::with_clock(num_buckets as u64 * 10, num_buckets, clock.clone()).unwrap();

        group.bench_with_input(BenchmarkId::new("next_bucket", num_buckets), &num_buckets, |b, _| {
            b.iter(|| {
                clock.advance_millis(10);
                counter.increment();
            })
        });

        group.bench_with_input(BenchmarkId::new("sum_full_ring", num_buckets), &num_buckets, |b, _| {
            b.iter(|| black_box(counter.sum()))
        });
    }

    group.finish();
}

fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended");

    for threads in [2usize, 4, 8] {
        let per_thread = 1_000u64;
        group.throughput(Throughput::Elements(threads as u64 * per_thread));

        group.bench_with_input(BenchmarkId::new("increment", threads), &threads, |b, &threads| {
            b.iter(|| {
                let counter = Arc::new(RollingCounter::new(60_000, 60).unwrap());
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let counter = Arc::clone(&counter);
                        thread::spawn(move || {
                            for _ in 0..per_thread {
                                counter.increment();
                            }
                        })
                    })
                    .collect();

                for handle in handles {
                    handle.join().unwrap();
                }

                black_box(counter.sum())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_thread, bench_rotation, bench_contended);
criterion_main!(benches);

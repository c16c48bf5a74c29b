//! Throughput Benchmark for KVSS
//!
//! This benchmark measures the store, the request parser and the full
//! command path under various workloads.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use kvss::protocol::parse_request;
use kvss::storage::Store;
use kvss::CommandHandler;
use std::sync::Arc;

/// Benchmark PUT operations
fn bench_put(c: &mut Criterion) {
    let store = Arc::new(Store::new());

    let mut group = c.benchmark_group("put");
    group.throughput(Throughput::Elements(1));

    group.bench_function("put_small", |b| {
        let mut i = 0u64;
        b.iter(|| {
            store.put(format!("key:{}", i), "small_value").unwrap();
            i += 1;
        });
    });

    group.bench_function("put_overwrite", |b| {
        b.iter(|| {
            store.put("hot", "value").unwrap();
        });
    });

    group.finish();
}

/// Benchmark GET operations
fn bench_get(c: &mut Criterion) {
    let store = Arc::new(Store::new());

    // Pre-populate with data
    for i in 0..100_000 {
        store.put(format!("key:{}", i), format!("value:{}", i)).unwrap();
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{}", i % 100_000);
            black_box(store.get(&key));
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("missing:{}", i);
            black_box(store.get(&key));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark request line parsing
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Elements(1));

    group.bench_function("parse_get", |b| {
        b.iter(|| black_box(parse_request(black_box(b"KV/1.0 GET user42"))));
    });

    group.bench_function("parse_put_multi_word", |b| {
        b.iter(|| {
            black_box(parse_request(black_box(
                b"KV/1.0 PUT user42 the quick brown fox jumps over the lazy dog",
            )))
        });
    });

    group.bench_function("parse_wrong_version", |b| {
        b.iter(|| black_box(parse_request(black_box(b"KV/2.0 GET user42"))));
    });

    group.finish();
}

/// Benchmark the full line -> response path
fn bench_execute(c: &mut Criterion) {
    let handler = CommandHandler::new(Arc::new(Store::new()));
    handler.execute(b"KV/1.0 PUT user42 Alice");

    let mut group = c.benchmark_group("execute");
    group.throughput(Throughput::Elements(1));

    group.bench_function("execute_get", |b| {
        b.iter(|| black_box(handler.execute(b"KV/1.0 GET user42").serialize()));
    });

    group.bench_function("execute_stats", |b| {
        b.iter(|| black_box(handler.execute(b"KV/1.0 STATS").serialize()));
    });

    group.finish();
}

/// Benchmark concurrent access from several threads
fn bench_concurrent(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");
    group.throughput(Throughput::Elements(4 * 1000));

    group.bench_function("mixed_4_threads", |b| {
        b.iter(|| {
            let store = Arc::new(Store::new());
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let store = Arc::clone(&store);
                    std::thread::spawn(move || {
                        for i in 0..1000 {
                            let key = format!("t{}:{}", t, i % 100);
                            if i % 4 == 0 {
                                store.put(key, "v").unwrap();
                            } else {
                                black_box(store.get(&key));
                            }
                        }
                    })
                })
                .collect();

            for h in handles {
                h.join().unwrap();
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_put,
    bench_get,
    bench_parse,
    bench_execute,
    bench_concurrent
);
criterion_main!(benches);

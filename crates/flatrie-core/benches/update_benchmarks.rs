//! Benchmarks for batch application

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flatrie_core::{Leaf, Storage, WorkItem};

fn key(i: usize) -> String {
    format!("key-{:08}", i)
}

fn populated(size: usize) -> Storage {
    Storage::from_leaves((0..size).map(|i| Leaf::new(key(i * 2).as_str(), format!("value-{}", i).into_bytes())))
        .unwrap()
}

fn bench_bulk_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_build");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| black_box(populated(size)));
        });
    }

    group.finish();
}

fn bench_insert_batch(c: &mut Criterion) {
    let base = populated(10000);
    let mut group = c.benchmark_group("insert_batch");

    for batch in [1, 16, 256].iter() {
        let work: Vec<WorkItem> = (0..*batch)
            .map(|i| WorkItem::upsert(key(i * 40 + 1).as_str(), &b"new"[..]))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(batch), &work, |b, work| {
            b.iter(|| {
                let update = flatrie_core::apply(base.nodes(), work).unwrap();
                black_box(update)
            });
        });
    }

    group.finish();
}

fn bench_delete_batch(c: &mut Criterion) {
    let base = populated(10000);
    let work: Vec<WorkItem> = (0..64).map(|i| WorkItem::delete(key(i * 300).as_str())).collect();

    c.bench_function("delete_batch", |b| {
        b.iter(|| {
            let mut storage = base.clone();
            storage.apply_batch(&work).unwrap();
            black_box(storage)
        });
    });
}

fn bench_value_update(c: &mut Criterion) {
    let base = populated(10000);
    let work = vec![WorkItem::upsert(key(5000).as_str(), &b"changed"[..])];

    c.bench_function("value_update", |b| {
        b.iter(|| black_box(flatrie_core::apply(base.nodes(), &work).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_bulk_build,
    bench_insert_batch,
    bench_delete_batch,
    bench_value_update,
);

criterion_main!(benches);

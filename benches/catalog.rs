use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode, Throughput};
use std::sync::Arc;

use lazyschema::{Column, LazySchema, MemoryProvider, SchemaConfig, TableMetadata};

fn gen_provider(n: usize) -> Arc<MemoryProvider> {
    let p = MemoryProvider::new(SchemaConfig::default());
    for i in 0..n {
        let cols = (0..8).map(|c| Column::new(format!("c{}", c), "int64"));
        p.insert_table(TableMetadata::with_columns(format!("t{}", i), cols));
    }
    Arc::new(p)
}

fn bench_catalog(c: &mut Criterion) {
    let ns = [100usize, 10_000usize];
    let mut group = c.benchmark_group("lazy_catalog");
    group.sampling_mode(SamplingMode::Flat);
    group.sample_size(20);

    for &n in &ns {
        let provider = gen_provider(n);
        let names: Vec<String> = (0..n).map(|i| format!("T{}", i)).collect();
        group.throughput(Throughput::Elements(n as u64));

        // Every lookup goes to the provider
        group.bench_with_input(BenchmarkId::new("cold_has_table", n.to_string()), &n, |b, _| {
            b.iter(|| {
                let mut cat = LazySchema::new(provider.clone());
                for t in &names { let _ = cat.has_table(t); }
                criterion::black_box(&cat);
            });
        });

        // Warm once, then measure cache hits only
        let mut warm = LazySchema::new(provider.clone());
        for t in &names { let _ = warm.has_table(t); }
        group.bench_with_input(BenchmarkId::new("warm_has_table", n.to_string()), &n, |b, _| {
            b.iter(|| {
                let mut hits = 0usize;
                for t in &names {
                    if warm.has_table(t).unwrap_or(false) { hits += 1; }
                }
                criterion::black_box(hits);
            });
        });

        // Deep copy of a fully populated catalog
        group.bench_with_input(BenchmarkId::new("duplicate", n.to_string()), &n, |b, _| {
            b.iter(|| criterion::black_box(warm.duplicate()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_catalog);
criterion_main!(benches);

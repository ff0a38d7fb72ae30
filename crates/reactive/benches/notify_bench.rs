//! Benchmarks for ripple-reactive using criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ripple_reactive::{map, Property};

fn fire_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("property_set");

    for listeners in [0, 1, 4, 32].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(listeners), listeners, |b, &listeners| {
            let p = Property::new(0u64);
            let handles: Vec<_> = (0..listeners)
                .map(|_| p.on_changed(|_, _, new: &u64| {
                    black_box(*new);
                }))
                .collect();
            let mut next = 0u64;
            b.iter(|| {
                next += 1;
                p.set(next);
            });
            drop(handles);
        });
    }

    group.finish();
}

fn listener_churn_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("listener_add_remove");

    for count in [1, 10, 100].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let p = Property::new(0u64);
            b.iter(|| {
                let handles: Vec<_> = (0..count).map(|_| p.on_invalidated(|_| {})).collect();
                for handle in &handles {
                    black_box(ripple_reactive::ObservableValue::remove_invalidation_listener(&p, &**handle));
                }
            });
        });
    }

    group.finish();
}

fn mapped_chain_benchmark(c: &mut Criterion) {
    c.bench_function("mapped_chain_10", |b| {
        let source = Property::new(0i64);
        let mut last = map(&source, |v: &i64| v + 1);
        for _ in 0..9 {
            last = map(&last, |v: &i64| v + 1);
        }
        let mut next = 0;
        b.iter(|| {
            next += 1;
            source.set(next);
            black_box(last.get())
        });
    });
}

criterion_group!(
    benches,
    fire_benchmark,
    listener_churn_benchmark,
    mapped_chain_benchmark
);
criterion_main!(benches);

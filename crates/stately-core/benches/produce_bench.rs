//! Benchmarks for `produce`.
//!
//! Cost of a single deep write should track path depth, not tree width:
//! the `wide/*` group writes one leaf in trees of growing width and should
//! stay flat apart from the shallow copy of the root.
//!
//! Run with: cargo bench -p stately-core --bench produce_bench

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use stately_core::{DraftResult, Path, Value, path, produce};
use std::hint::black_box;

fn wide_tree(width: usize) -> Value {
    Value::record((0..width).map(|i| {
        (
            format!("k{i}"),
            Value::record([
                ("name", Value::from(format!("item {i}"))),
                ("nested", Value::record([("count", Value::from(i as i64))])),
            ]),
        )
    }))
}

fn deep_tree(depth: usize) -> (Value, Path) {
    let mut value = Value::from(0);
    let mut path = Path::root();
    for _ in 0..depth {
        value = Value::record([("next", value), ("side", Value::list([1, 2, 3]))]);
        path = path.key("next");
    }
    (value, path)
}

// =============================================================================
// Width: one write, growing tree
// =============================================================================

fn bench_wide(c: &mut Criterion) {
    let mut group = c.benchmark_group("produce/wide");

    for width in [16usize, 256, 4096] {
        let base = wide_tree(width);
        let target = path!("k7", "nested", "count");
        group.bench_with_input(BenchmarkId::from_parameter(width), &base, |b, base| {
            b.iter(|| {
                black_box(
                    produce(base, |draft| -> DraftResult<()> { draft.set(&target, 42) })
                        .unwrap_or_default(),
                )
            })
        });
    }

    group.finish();
}

// =============================================================================
// Depth: one write at the bottom of a chain
// =============================================================================

fn bench_deep(c: &mut Criterion) {
    let mut group = c.benchmark_group("produce/deep");

    for depth in [4usize, 32, 256] {
        let (base, target) = deep_tree(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &base, |b, base| {
            b.iter(|| {
                black_box(
                    produce(base, |draft| -> DraftResult<()> { draft.set(&target, 1) })
                        .unwrap_or_default(),
                )
            })
        });
    }

    group.finish();
}

// =============================================================================
// Many writes under one parent (copy once, write many)
// =============================================================================

fn bench_batch(c: &mut Criterion) {
    let base = wide_tree(256);
    c.bench_function("produce/batch_256_writes", |b| {
        b.iter(|| {
            black_box(
                produce(&base, |draft| -> DraftResult<()> {
                    for i in 0..256 {
                        draft.set(path!(format!("k{i}"), "name"), "renamed")?;
                    }
                    Ok(())
                })
                .unwrap_or_default(),
            )
        })
    });
}

criterion_group!(benches, bench_wide, bench_deep, bench_batch);
criterion_main!(benches);

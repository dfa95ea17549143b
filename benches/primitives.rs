//! Primitive operation benchmarks (row commitment, Poseidon, Merkle, circuit emission)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use unique_rows::{
    build_tree, circuit, commit_rows, config, Dataset, FieldElement, PoseidonContext,
};

fn bench_poseidon_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("poseidon");
    let ctx = PoseidonContext::new().unwrap();

    let a = FieldElement::from(config::TEST_RANDOM_SEED);
    let b = FieldElement::from(123u64);

    group.bench_function("hash2", |bencher| {
        bencher.iter(|| black_box(ctx.hash2(black_box(a), black_box(b)).unwrap()));
    });

    group.finish();
}

fn bench_commit_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit");

    for num_rows in [100, 1_000, 10_000] {
        let dataset = Dataset::sample(num_rows);
        group.bench_with_input(
            BenchmarkId::new("commit_rows", num_rows),
            &dataset,
            |bencher, dataset| {
                bencher.iter(|| black_box(commit_rows(black_box(&dataset.rows))));
            },
        );
    }

    group.finish();
}

fn bench_merkle_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("merkle");
    let ctx = PoseidonContext::new().unwrap();

    // Non-powers of two exercise the padding path
    for num_rows in [16, 100, 1_000] {
        let leaves = commit_rows(&Dataset::sample(num_rows).rows);
        group.bench_with_input(
            BenchmarkId::new("build_tree", num_rows),
            &leaves,
            |bencher, leaves| {
                bencher.iter(|| build_tree(&ctx, black_box(leaves)).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit");

    for num_rows in [10, 1_000, 100_000] {
        group.bench_with_input(
            BenchmarkId::new("threshold", num_rows),
            &num_rows,
            |bencher, &num_rows| {
                bencher.iter(|| circuit::emit(black_box(num_rows), Some(9)).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_poseidon_hash,
    bench_commit_rows,
    bench_merkle_operations,
    bench_emit
);
criterion_main!(benches);

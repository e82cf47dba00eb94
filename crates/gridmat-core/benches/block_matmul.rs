//! Benchmarks for blocked matrix multiplication.
//!
//! Compares tile sides against a flat row-major triple loop.
//!
//! Run with:
//! ```bash
//! cargo bench --bench block_matmul
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gridmat_core::{BlockMatrix, BlockOrder, DenseND};
use std::hint::black_box;

fn operand(n: usize, seed: f64) -> DenseND<f64> {
    let data = (0..n * n).map(|i| ((i as f64) * seed).sin()).collect();
    DenseND::from_vec(data, &[n, n]).expect("square operand")
}

fn naive(a: &[f64], b: &[f64], n: usize) -> Vec<f64> {
    let mut c = vec![0.0; n * n];
    for i in 0..n {
        for k in 0..n {
            let aik = a[i * n + k];
            for j in 0..n {
                c[i * n + j] += aik * b[k * n + j];
            }
        }
    }
    c
}

fn bench_matmul(c: &mut Criterion) {
    let mut group = c.benchmark_group("matmul");

    for n in [64usize, 128, 256] {
        let a = operand(n, 0.37);
        let b = operand(n, 0.71);
        group.throughput(Throughput::Elements((n * n * n) as u64));

        let flat_a = a.to_vec();
        let flat_b = b.to_vec();
        group.bench_with_input(BenchmarkId::new("flat", n), &n, |bench, &n| {
            bench.iter(|| black_box(naive(black_box(&flat_a), black_box(&flat_b), n)));
        });

        for side in [16usize, 32, 64] {
            let ba = BlockMatrix::from_dense(&a, side, BlockOrder::RowMajor).expect("tiling");
            let bb = BlockMatrix::from_dense(&b, side, BlockOrder::RowMajor).expect("tiling");
            group.bench_with_input(
                BenchmarkId::new(format!("blocked_{side}"), n),
                &n,
                |bench, _| {
                    bench.iter(|| black_box(ba.matmul(black_box(&bb)).expect("matmul")));
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_matmul);
criterion_main!(benches);

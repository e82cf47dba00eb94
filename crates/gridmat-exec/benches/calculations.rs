//! Benchmarks for calculation materialisation.
//!
//! Compares the contiguous buffer path of `calc_new` against cell-by-cell
//! evaluation through a linked view, and sparse against dense reductions.
//!
//! Run with:
//! ```bash
//! cargo bench --bench calculations
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gridmat_core::{Dimension, ElementKind, Matrix};
use gridmat_exec::{CalculationExt, Density, MatrixCalcExt, MatrixFactory};
use gridmat_sparse::SparseMatrix;
use std::hint::black_box;

fn dense(n: i64) -> Matrix {
    let m = MatrixFactory::default()
        .make(ElementKind::Double, Density::Dense, &[n, n])
        .expect("dense operand");
    for (i, coord) in m.all_coordinates().enumerate() {
        m.set_as_double(&coord, (i as f64 * 0.37).sin()).expect("in bounds");
    }
    m
}

fn bench_elementwise(c: &mut Criterion) {
    let mut group = c.benchmark_group("plus_scalar");
    for n in [64i64, 256] {
        let m = dense(n);
        group.throughput(Throughput::Elements((n * n) as u64));

        group.bench_with_input(BenchmarkId::new("calc_new", n), &m, |b, m| {
            b.iter(|| black_box(m.plus_scalar(1.0).unwrap().calc_new().unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("linked_reads", n), &m, |b, m| {
            let view = m.plus_scalar(1.0).unwrap().calc_link();
            b.iter(|| {
                let mut total = 0.0;
                for coord in view.all_coordinates() {
                    total += view.get_as_double(&coord).unwrap();
                }
                black_box(total)
            })
        });
    }
    group.finish();
}

fn bench_reductions(c: &mut Criterion) {
    let mut group = c.benchmark_group("sum_rows");
    let n = 512i64;

    let mut sparse = SparseMatrix::<f64>::new(&[n as usize, n as usize]);
    for i in 0..n {
        sparse.set(&[i, (i * 7) % n], 1.5).expect("in bounds");
    }
    let sparse = Matrix::new(sparse);
    let dense = dense(n);

    group.bench_function("dense", |b| {
        b.iter(|| black_box(dense.sum(Dimension::Row).unwrap().calc_new().unwrap()))
    });
    group.bench_function("sparse", |b| {
        b.iter(|| black_box(sparse.sum(Dimension::Row).unwrap().calc_new().unwrap()))
    });
    group.bench_function("variance_linked", |b| {
        let view = dense.var(Dimension::Row).unwrap().calc_link();
        b.iter(|| black_box(view.get_as_double(&[0, 3]).unwrap()))
    });
    group.finish();
}

fn bench_mtimes(c: &mut Criterion) {
    let mut group = c.benchmark_group("mtimes");
    for n in [64i64, 128] {
        let a = dense(n);
        group.throughput(Throughput::Elements((n * n * n) as u64));
        group.bench_with_input(BenchmarkId::new("calc_new", n), &a, |b, a| {
            b.iter(|| black_box(a.mtimes(a).unwrap().calc_new().unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_elementwise, bench_reductions, bench_mtimes);
criterion_main!(benches);

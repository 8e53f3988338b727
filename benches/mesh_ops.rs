//! Benchmarks for mesh analysis and unfolding.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pleat::algo::curvature::{analyze_curvature, CurvatureOptions};
use pleat::algo::parameterize::{compute_distortion_with, LinearSolver, LscmOptions};
use pleat::prelude::*;

fn bench_analysis(c: &mut Criterion) {
    let mesh = synthetic_grid_mesh(50, 50).unwrap();

    c.bench_function("validate_50x50", |b| b.iter(|| validate(black_box(&mesh))));

    c.bench_function("curvature_50x50_parallel", |b| {
        let options = CurvatureOptions::default();
        b.iter(|| analyze_curvature(black_box(&mesh), &options))
    });

    c.bench_function("curvature_50x50_sequential", |b| {
        let options = CurvatureOptions::default().with_parallel(false);
        b.iter(|| analyze_curvature(black_box(&mesh), &options))
    });

    c.bench_function("geodesic_all_pairs_20_keys", |b| {
        let graph = GeodesicGraph::from_mesh(&mesh);
        let keys: Vec<usize> = (0..mesh.num_vertices()).step_by(mesh.num_vertices() / 20).collect();
        b.iter(|| graph.all_pairs_among(black_box(&keys)))
    });
}

fn bench_unfold(c: &mut Criterion) {
    let mesh = synthetic_grid_mesh(30, 30).unwrap();
    let manufacturing = ManufacturingConstraints::new();

    c.bench_function("unfold_30x30_cholesky", |b| {
        let options = UnfoldOptions::default();
        b.iter(|| unfold(black_box(&mesh), &[], &manufacturing, &options).unwrap())
    });

    c.bench_function("unfold_30x30_cg", |b| {
        let options = UnfoldOptions::default().with_lscm(
            LscmOptions::default()
                .with_solver(LinearSolver::ConjugateGradient)
                .with_pin_weight(1.0),
        );
        b.iter(|| unfold(black_box(&mesh), &[], &manufacturing, &options).unwrap())
    });

    let uv: Vec<_> = mesh
        .vertices()
        .iter()
        .map(|p| nalgebra::Point2::new(p.x, p.y))
        .collect();
    c.bench_function("distortion_30x30_sequential", |b| {
        b.iter(|| compute_distortion_with(black_box(&mesh), &uv, false))
    });
}

criterion_group!(benches, bench_analysis, bench_unfold);
criterion_main!(benches);

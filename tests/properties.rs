//! Cross-module properties of the analysis and unfolding pipelines.

use nalgebra::Point2;
use pleat::algo::decimate::decimate;
use pleat::algo::parameterize::compute_distortion;
use pleat::prelude::*;

fn flat_grid(n: usize) -> TriangleMesh {
    let mut vertices = Vec::with_capacity(n * n);
    for r in 0..n {
        for c in 0..n {
            vertices.push([c as f64, r as f64, 0.0]);
        }
    }
    let mut triangles = Vec::new();
    for r in 0..n - 1 {
        for c in 0..n - 1 {
            let v00 = r * n + c;
            triangles.push([v00, v00 + 1, v00 + n + 1]);
            triangles.push([v00, v00 + n + 1, v00 + n]);
        }
    }
    TriangleMesh::from_arrays(&vertices, &triangles)
}

fn octahedron() -> TriangleMesh {
    TriangleMesh::from_arrays(
        &[
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
        ],
        &[
            [0, 2, 4],
            [2, 1, 4],
            [1, 3, 4],
            [3, 0, 4],
            [2, 0, 5],
            [1, 2, 5],
            [3, 1, 5],
            [0, 3, 5],
        ],
    )
}

#[test]
fn euler_characteristic_matches_counts() {
    for mesh in [synthetic_grid_mesh(5, 7).unwrap(), octahedron(), flat_grid(3)] {
        let report = validate(&mesh);
        let expected = report.num_vertices as i64 - report.num_edges as i64 + report.num_triangles as i64;
        assert_eq!(report.euler_characteristic, expected);
    }
    assert_eq!(validate(&synthetic_grid_mesh(5, 7).unwrap()).euler_characteristic, 1);
    assert_eq!(validate(&octahedron()).euler_characteristic, 2);
}

#[test]
fn closed_mesh_has_no_boundary() {
    let report = validate(&octahedron());
    assert!(report.is_closed);
    assert!(!report.has_boundary);
    assert_eq!(report.num_boundary_edges(), 0);
    assert!(report.suitable_for_unfolding);
}

#[test]
fn synthetic_grid_is_deterministic() {
    let a = synthetic_grid_mesh(5, 5).unwrap();
    let b = synthetic_grid_mesh(5, 5).unwrap();
    assert_eq!(a.num_vertices(), 25);
    assert_eq!(a.num_triangles(), 32);
    assert_eq!(a, b);
}

#[test]
fn flat_diagonal_geodesic_is_straight() {
    let mesh = flat_grid(3);
    let graph = GeodesicGraph::from_mesh(&mesh);
    let path = graph.path_between(0, 8).unwrap();

    let straight = (mesh.position(8) - mesh.position(0)).norm();
    assert!((path.length - straight).abs() < 1e-6);
    assert_eq!(path.vertices, vec![0, 4, 8]);
}

#[test]
fn flat_lscm_reproduces_plane() {
    let mesh = flat_grid(4);
    let pins = [
        BoundaryConstraint::new(0, 0.0, 0.0),
        BoundaryConstraint::new(15, 3.0, 3.0),
    ];
    let report = unfold(&mesh, &pins, &ManufacturingConstraints::new(), &UnfoldOptions::default()).unwrap();

    for (v, uv) in report.uv.iter() {
        let p = mesh.position(v);
        assert!((uv.x - p.x).abs() < 1e-4, "vertex {} u = {}", v, uv.x);
        assert!((uv.y - p.y).abs() < 1e-4, "vertex {} v = {}", v, uv.y);
    }
    assert!(report.distortion.mean_area_distortion() < 1e-4);
    assert!(report.solution.auto_pins.is_empty());
}

#[test]
fn flat_lscm_single_pin_is_a_similarity() {
    let mesh = flat_grid(4);
    let pins = [BoundaryConstraint::new(5, 2.0, -1.0)];
    let report = unfold(&mesh, &pins, &ManufacturingConstraints::new(), &UnfoldOptions::default()).unwrap();

    assert!(report.distortion.mean_area_distortion() < 1e-4);
    assert!(report.distortion.max_angle_distortion() < 1e-2);
    assert!(report.manufacturing.distortion_acceptable);
}

#[test]
fn decimate_within_cap_is_identity() {
    let mesh = synthetic_grid_mesh(6, 6).unwrap();
    for cap in [36, 100] {
        let result = decimate(&mesh, cap).unwrap();
        assert_eq!(result.mesh, mesh);
    }
}

#[test]
fn distortion_ignores_corner_rotation() {
    let vertices = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.1], [0.3, 1.5, -0.2]];
    let uv = [Point2::new(0.0, 0.0), Point2::new(1.8, 0.2), Point2::new(0.1, 1.7)];

    let a = compute_distortion(&TriangleMesh::from_arrays(&vertices, &[[0, 1, 2]]), &uv);
    let b = compute_distortion(&TriangleMesh::from_arrays(&vertices, &[[1, 2, 0]]), &uv);
    let c = compute_distortion(&TriangleMesh::from_arrays(&vertices, &[[2, 0, 1]]), &uv);

    for other in [&b, &c] {
        assert!((a.area.mean - other.area.mean).abs() < 1e-12);
        assert!((a.angle.max - other.angle.max).abs() < 1e-9);
        assert!((a.angle.mean - other.angle.mean).abs() < 1e-9);
        assert!((a.edge.mean - other.edge.mean).abs() < 1e-12);
        assert!((a.edge.max - other.edge.max).abs() < 1e-12);
    }
}

#[test]
fn incidence_sums_to_three_per_triangle() {
    // Soup with a non-manifold fin and a repeated triangle
    let mesh = TriangleMesh::from_arrays(
        &[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 0.0, 1.0],
        ],
        &[[0, 1, 2], [1, 0, 3], [0, 1, 4], [0, 1, 2]],
    );
    let incidence = mesh.edge_incidence();

    assert_eq!(incidence.total_incidence(), 3 * mesh.num_triangles());
    assert_eq!(incidence.count(0, 1), 4);
    assert_eq!(incidence.count(2, 0), 2);
}

#[test]
fn unit_square_unfolds_without_constraints() {
    let mesh = TriangleMesh::from_arrays(
        &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        &[[0, 1, 2], [0, 2, 3]],
    );
    let report = unfold(&mesh, &[], &ManufacturingConstraints::new(), &UnfoldOptions::default()).unwrap();

    assert!(report.success());
    assert_eq!(report.uv.len(), 4);
    assert_eq!(report.triangles.len(), 2);
}

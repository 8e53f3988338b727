//! Distortion of a UV map relative to the 3D surface.

use nalgebra::{Point2, Point3};
use rayon::prelude::*;

use crate::mesh::geometry::{triangle_angle, triangle_angle_2d, triangle_area, triangle_area_2d, DEGENERATE_AREA};
use crate::mesh::TriangleMesh;

/// Mean, maximum and population variance of a set of values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stats {
    /// Arithmetic mean.
    pub mean: f64,
    /// Largest value.
    pub max: f64,
    /// Population variance.
    pub variance: f64,
}

impl Stats {
    /// Summarize `values`; all zero for an empty slice.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self { mean, max, variance }
    }
}

/// Distortion of a single triangle.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleDistortion {
    /// Triangle index in the mesh.
    pub triangle: usize,
    /// `area_uv / area_3d`.
    pub area_ratio: f64,
    /// Isotropic scale, `sqrt(area_ratio)`.
    pub scale: f64,
    /// Absolute corner angle differences in degrees, per corner.
    pub angle_deltas: [f64; 3],
    /// `|len_uv − len_3d| / len_3d` per edge, edge `i` running from corner
    /// `i` to corner `i + 1`.
    pub edge_deltas: [f64; 3],
}

/// Aggregated distortion of a UV map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistortionMetrics {
    /// Per-triangle values, in triangle order.
    pub triangles: Vec<TriangleDistortion>,
    /// Statistics of `|area_ratio − 1|`.
    pub area: Stats,
    /// Statistics of the isotropic scale.
    pub scale: Stats,
    /// Statistics of all corner angle deltas (degrees).
    pub angle: Stats,
    /// Statistics of all relative edge deltas.
    pub edge: Stats,
}

impl DistortionMetrics {
    /// Mean area distortion.
    pub fn mean_area_distortion(&self) -> f64 {
        self.area.mean
    }

    /// Maximum area distortion.
    pub fn max_area_distortion(&self) -> f64 {
        self.area.max
    }

    /// Maximum angle distortion in degrees.
    pub fn max_angle_distortion(&self) -> f64 {
        self.angle.max
    }

    /// Mean relative edge length distortion.
    pub fn mean_edge_distortion(&self) -> f64 {
        self.edge.mean
    }

    /// Number of triangles measured.
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }
}

/// Compare each triangle's 3D geometry with its UV image.
///
/// Triangles that are degenerate in 3D or reference a vertex without a UV
/// coordinate are skipped. Per-triangle work runs in parallel.
pub fn compute_distortion(mesh: &TriangleMesh, uv: &[Point2<f64>]) -> DistortionMetrics {
    compute_distortion_with(mesh, uv, true)
}

/// [`compute_distortion`] with explicit control over parallelism.
pub fn compute_distortion_with(mesh: &TriangleMesh, uv: &[Point2<f64>], parallel: bool) -> DistortionMetrics {
    let measure = |t: usize| triangle_distortion(mesh, uv, t);
    let triangles: Vec<TriangleDistortion> = if parallel {
        (0..mesh.num_triangles()).into_par_iter().filter_map(measure).collect()
    } else {
        (0..mesh.num_triangles()).filter_map(measure).collect()
    };

    let area: Vec<f64> = triangles.iter().map(|t| (t.area_ratio - 1.0).abs()).collect();
    let scale: Vec<f64> = triangles.iter().map(|t| t.scale).collect();
    let angle: Vec<f64> = triangles.iter().flat_map(|t| t.angle_deltas).collect();
    let edge: Vec<f64> = triangles.iter().flat_map(|t| t.edge_deltas).collect();

    DistortionMetrics {
        area: Stats::from_values(&area),
        scale: Stats::from_values(&scale),
        angle: Stats::from_values(&angle),
        edge: Stats::from_values(&edge),
        triangles,
    }
}

fn triangle_distortion(mesh: &TriangleMesh, uv: &[Point2<f64>], t: usize) -> Option<TriangleDistortion> {
    let tri = mesh.triangles()[t];
    if !mesh.triangle_in_range(t) || tri.iter().any(|&v| v >= uv.len()) {
        return None;
    }

    let p: [Point3<f64>; 3] = mesh.triangle_positions(t);
    let q: [Point2<f64>; 3] = [uv[tri[0]], uv[tri[1]], uv[tri[2]]];

    let area_3d = triangle_area(&p[0], &p[1], &p[2]);
    if area_3d < DEGENERATE_AREA {
        return None;
    }
    let area_ratio = triangle_area_2d(&q[0], &q[1], &q[2]) / area_3d;

    let mut angle_deltas = [0.0; 3];
    let mut edge_deltas = [0.0; 3];
    for i in 0..3 {
        let (j, k) = ((i + 1) % 3, (i + 2) % 3);
        let a3 = triangle_angle(&p[i], &p[j], &p[k]);
        let a2 = triangle_angle_2d(&q[i], &q[j], &q[k]);
        angle_deltas[i] = (a2 - a3).abs().to_degrees();

        let l3 = (p[j] - p[i]).norm();
        let l2 = (q[j] - q[i]).norm();
        edge_deltas[i] = if l3 > 0.0 { (l2 - l3).abs() / l3 } else { 0.0 };
    }

    Some(TriangleDistortion {
        triangle: t,
        area_ratio,
        scale: area_ratio.sqrt(),
        angle_deltas,
        edge_deltas,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn right_triangle(tri: [usize; 3]) -> TriangleMesh {
        TriangleMesh::from_arrays(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], &[tri])
    }

    #[test]
    fn test_stats() {
        let s = Stats::from_values(&[1.0, 2.0, 3.0]);
        assert!((s.mean - 2.0).abs() < 1e-12);
        assert_eq!(s.max, 3.0);
        assert!((s.variance - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(Stats::from_values(&[]), Stats::default());
    }

    #[test]
    fn test_identity_map_has_no_distortion() {
        let mesh = right_triangle([0, 1, 2]);
        let uv: Vec<Point2<f64>> = mesh.vertices().iter().map(|p| Point2::new(p.x, p.y)).collect();
        let metrics = compute_distortion(&mesh, &uv);

        assert_eq!(metrics.num_triangles(), 1);
        assert!(metrics.mean_area_distortion() < 1e-12);
        assert!(metrics.max_angle_distortion() < 1e-9);
        assert!(metrics.mean_edge_distortion() < 1e-12);
        assert!((metrics.scale.mean - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_uniform_scale() {
        let mesh = right_triangle([0, 1, 2]);
        let uv = vec![Point2::new(0.0, 0.0), Point2::new(2.0, 0.0), Point2::new(0.0, 2.0)];
        let metrics = compute_distortion(&mesh, &uv);

        let t = &metrics.triangles[0];
        assert!((t.area_ratio - 4.0).abs() < 1e-12);
        assert!((t.scale - 2.0).abs() < 1e-12);
        assert!((metrics.max_area_distortion() - 3.0).abs() < 1e-12);
        // Similarity keeps angles
        assert!(metrics.max_angle_distortion() < 1e-9);
        assert!((metrics.mean_edge_distortion() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_shear_changes_angles() {
        let mesh = right_triangle([0, 1, 2]);
        let uv = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(1.0, 1.0)];
        let metrics = compute_distortion(&mesh, &uv);

        // Area preserved, right angle at corner 0 becomes 45 degrees
        assert!(metrics.mean_area_distortion() < 1e-12);
        assert!((metrics.triangles[0].angle_deltas[0] - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_invariant_under_vertex_rotation() {
        let uv = vec![Point2::new(0.1, 0.0), Point2::new(1.3, 0.2), Point2::new(0.2, 0.8)];
        let a = compute_distortion(&right_triangle([0, 1, 2]), &uv);
        let b = compute_distortion(&right_triangle([1, 2, 0]), &uv);

        assert!((a.area.mean - b.area.mean).abs() < 1e-12);
        assert!((a.scale.mean - b.scale.mean).abs() < 1e-12);
        assert!((a.angle.mean - b.angle.mean).abs() < 1e-9);
        assert!((a.angle.max - b.angle.max).abs() < 1e-9);
        assert!((a.edge.mean - b.edge.mean).abs() < 1e-12);
        assert!((a.edge.variance - b.edge.variance).abs() < 1e-12);
    }

    #[test]
    fn test_skips_degenerate_and_missing_uv() {
        let mesh = TriangleMesh::from_arrays(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[[0, 1, 2], [0, 1, 3]],
        );
        let uv = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(2.0, 0.0)];
        let metrics = compute_distortion(&mesh, &uv);
        assert_eq!(metrics.num_triangles(), 0);
        assert_eq!(metrics.area, Stats::default());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mesh = crate::mesh::synthetic_grid_mesh(4, 4).unwrap();
        let uv: Vec<Point2<f64>> = mesh.vertices().iter().map(|p| Point2::new(p.x, p.y)).collect();
        assert_eq!(
            compute_distortion_with(&mesh, &uv, true),
            compute_distortion_with(&mesh, &uv, false)
        );
    }
}

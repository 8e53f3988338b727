//! Per-vertex normals and curvature estimation.
//!
//! The default estimator is a bending proxy rather than a true discrete
//! curvature: for each vertex it takes the area-weighted mean of the corner
//! angles at that vertex over its incident triangles. The proxy is what key
//! vertex selection is tuned against. The angle-defect estimator gives the
//! standard discrete Gaussian curvature for callers that need it.
//!
//! # Example
//!
//! ```
//! use pleat::mesh::synthetic_grid_mesh;
//! use pleat::algo::curvature::{analyze_curvature, CurvatureOptions};
//!
//! let mesh = synthetic_grid_mesh(5, 5).unwrap();
//! let analysis = analyze_curvature(&mesh, &CurvatureOptions::default());
//!
//! assert_eq!(analysis.curvature.len(), 25);
//! println!("surface: {}", analysis.surface_type);
//! ```
//!
//! # References
//!
//! - Meyer, M., et al. (2003). "Discrete Differential-Geometry Operators for
//!   Triangulated 2-Manifolds." Visualization and Mathematics III.

use std::f64::consts::PI;
use std::fmt;

use nalgebra::Vector3;
use rayon::prelude::*;

use crate::mesh::geometry::{triangle_angle, triangle_cross, DEGENERATE_AREA};
use crate::mesh::TriangleMesh;

/// Curvature range below which a surface counts as nearly flat.
const FLAT_RANGE: f64 = 0.1;

/// Curvature maximum above which a surface counts as highly curved.
const HIGH_CURVATURE: f64 = 2.0;

/// Which per-vertex curvature value to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurvatureEstimator {
    /// Area-weighted mean of incident corner angles.
    #[default]
    AngleProxy,
    /// Discrete Gaussian curvature: angle defect over barycentric area.
    AngleDefect,
}

/// Options for [`analyze_curvature`].
#[derive(Debug, Clone)]
pub struct CurvatureOptions {
    /// Curvature estimator.
    pub estimator: CurvatureEstimator,
    /// Compute per-triangle quantities in parallel.
    pub parallel: bool,
}

impl Default for CurvatureOptions {
    fn default() -> Self {
        Self {
            estimator: CurvatureEstimator::AngleProxy,
            parallel: true,
        }
    }
}

impl CurvatureOptions {
    /// Select the estimator.
    pub fn with_estimator(mut self, estimator: CurvatureEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    /// Enable or disable parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Coarse classification of a surface by its curvature spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceType {
    /// Curvature range below 0.1.
    NearlyFlat,
    /// Neither flat nor highly curved.
    ModeratelyCurved,
    /// Maximum curvature above 2.0.
    HighlyCurved,
}

impl fmt::Display for SurfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SurfaceType::NearlyFlat => "nearly_flat",
            SurfaceType::ModeratelyCurved => "moderately_curved",
            SurfaceType::HighlyCurved => "highly_curved",
        };
        f.write_str(s)
    }
}

/// Result of [`analyze_curvature`].
#[derive(Debug, Clone)]
pub struct CurvatureAnalysis {
    /// Curvature value per vertex.
    pub curvature: Vec<f64>,
    /// Unit area-weighted normal per vertex (zero for isolated vertices).
    pub normals: Vec<Vector3<f64>>,
    /// Area per triangle (zero for out-of-range triangles).
    pub face_areas: Vec<f64>,
    /// Classification from the curvature spread.
    pub surface_type: SurfaceType,
    /// Estimator that produced `curvature`.
    pub estimator: CurvatureEstimator,
}

impl CurvatureAnalysis {
    /// Smallest and largest curvature value, or `None` for an empty mesh.
    pub fn range(&self) -> Option<(f64, f64)> {
        curvature_range(&self.curvature)
    }
}

/// Per-triangle quantities computed independently of each other.
#[derive(Debug, Clone)]
struct TriangleTerms {
    indices: [usize; 3],
    weighted_normal: Vector3<f64>,
    area: f64,
    angles: [f64; 3],
}

/// Compute per-vertex normals and curvature.
///
/// Triangles with out-of-range indices are ignored. Degenerate triangles
/// contribute nothing to the curvature and a zero normal.
pub fn analyze_curvature(mesh: &TriangleMesh, options: &CurvatureOptions) -> CurvatureAnalysis {
    let n = mesh.num_vertices();

    let compute_triangle = |t: usize| -> Option<TriangleTerms> {
        if !mesh.triangle_in_range(t) {
            return None;
        }
        let [p0, p1, p2] = mesh.triangle_positions(t);
        let cross = triangle_cross(&p0, &p1, &p2);
        let area = 0.5 * cross.norm();
        Some(TriangleTerms {
            indices: mesh.triangles()[t],
            // |cross| = 2 * area, so this is the unit normal weighted by 2 * area
            weighted_normal: cross,
            area,
            angles: [
                triangle_angle(&p0, &p1, &p2),
                triangle_angle(&p1, &p2, &p0),
                triangle_angle(&p2, &p0, &p1),
            ],
        })
    };

    let terms: Vec<Option<TriangleTerms>> = if options.parallel {
        (0..mesh.num_triangles())
            .into_par_iter()
            .map(compute_triangle)
            .collect()
    } else {
        (0..mesh.num_triangles()).map(compute_triangle).collect()
    };

    let mut normals = vec![Vector3::zeros(); n];
    let mut face_areas = vec![0.0; mesh.num_triangles()];
    let mut weighted_angle = vec![0.0; n];
    let mut angle_sum = vec![0.0; n];
    let mut area_sum = vec![0.0; n];

    for (t, term) in terms.iter().enumerate() {
        let Some(term) = term else { continue };
        face_areas[t] = term.area;
        for (corner, &v) in term.indices.iter().enumerate() {
            normals[v] += term.weighted_normal;
            if term.area >= DEGENERATE_AREA {
                weighted_angle[v] += term.angles[corner] * term.area;
                angle_sum[v] += term.angles[corner];
                area_sum[v] += term.area;
            }
        }
    }

    for normal in &mut normals {
        let len = normal.norm();
        if len > 1e-15 {
            *normal /= len;
        }
    }

    let curvature: Vec<f64> = match options.estimator {
        CurvatureEstimator::AngleProxy => (0..n)
            .map(|v| {
                if area_sum[v] > 0.0 {
                    weighted_angle[v] / area_sum[v]
                } else {
                    0.0
                }
            })
            .collect(),
        CurvatureEstimator::AngleDefect => {
            let boundary = mesh.edge_incidence().boundary_vertices(n);
            let mut on_boundary = vec![false; n];
            for v in boundary {
                on_boundary[v] = true;
            }
            (0..n)
                .map(|v| {
                    let full = if on_boundary[v] { PI } else { 2.0 * PI };
                    let area = area_sum[v] / 3.0;
                    if area > 1e-10 {
                        (full - angle_sum[v]) / area
                    } else {
                        0.0
                    }
                })
                .collect()
        }
    };

    let surface_type = classify_surface(&curvature);

    CurvatureAnalysis {
        curvature,
        normals,
        face_areas,
        surface_type,
        estimator: options.estimator,
    }
}

/// Classify a surface from its per-vertex curvature values.
pub fn classify_surface(curvature: &[f64]) -> SurfaceType {
    match curvature_range(curvature) {
        None => SurfaceType::NearlyFlat,
        Some((min, max)) if max - min < FLAT_RANGE => SurfaceType::NearlyFlat,
        Some((_, max)) if max > HIGH_CURVATURE => SurfaceType::HighlyCurved,
        Some(_) => SurfaceType::ModeratelyCurved,
    }
}

fn curvature_range(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    Some((min, max))
}

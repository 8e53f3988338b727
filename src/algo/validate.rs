//! Mesh validation.
//!
//! Checks a triangle soup for the defects that matter for unfolding:
//! non-manifold edges, degenerate triangles, duplicated vertices and
//! out-of-range indices. Validation never fails; it reports.
//!
//! # Example
//!
//! ```
//! use pleat::mesh::TriangleMesh;
//! use pleat::algo::validate::{validate, ValidationStatus};
//!
//! let mesh = TriangleMesh::from_arrays(
//!     &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
//!     &[[0, 1, 2], [0, 2, 3]],
//! );
//! let report = validate(&mesh);
//! assert_eq!(report.status, ValidationStatus::Valid);
//! assert_eq!(report.euler_characteristic, 1);
//! assert!(report.has_boundary);
//! ```

use std::collections::HashSet;
use std::fmt;

use crate::mesh::TriangleMesh;

/// Overall verdict of a validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    /// Manifold, non-degenerate and free of duplicate vertices.
    Valid,
    /// Topologically irregular but numerically usable.
    BasicValid,
    /// The mesh could not be checked (bad indices or coordinates).
    Error,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValidationStatus::Valid => "valid",
            ValidationStatus::BasicValid => "basic_valid",
            ValidationStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Result of [`validate`].
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Number of vertices.
    pub num_vertices: usize,
    /// Number of vertices with distinct coordinates.
    pub num_unique_vertices: usize,
    /// Number of triangles.
    pub num_triangles: usize,
    /// Number of distinct undirected edges.
    pub num_edges: usize,
    /// Edges used by exactly one triangle.
    pub boundary_edges: Vec<(usize, usize)>,
    /// Edges used by more than two triangles.
    pub non_manifold_edges: Vec<(usize, usize)>,
    /// Number of triangles with area below `1e-12`.
    pub num_degenerate_triangles: usize,
    /// `V - E + F`.
    pub euler_characteristic: i64,
    /// No edge is shared by more than two triangles.
    pub is_manifold: bool,
    /// At least one boundary edge exists.
    pub has_boundary: bool,
    /// The surface has triangles and no boundary edges.
    pub is_closed: bool,
    /// Manifold, non-degenerate and free of duplicate vertices.
    pub suitable_for_unfolding: bool,
    /// Overall verdict.
    pub status: ValidationStatus,
    /// Description of the failure when `status` is [`ValidationStatus::Error`].
    pub error: Option<String>,
    /// Human-readable notes about each defect class found.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Number of boundary edges.
    #[inline]
    pub fn num_boundary_edges(&self) -> usize {
        self.boundary_edges.len()
    }

    /// Number of non-manifold edges.
    #[inline]
    pub fn num_non_manifold_edges(&self) -> usize {
        self.non_manifold_edges.len()
    }
}

/// Validate a triangle mesh.
///
/// Triangles with out-of-range indices and non-finite coordinates put the
/// report in the [`ValidationStatus::Error`] state; counts are then computed
/// over the in-range triangles only.
pub fn validate(mesh: &TriangleMesh) -> ValidationReport {
    let num_vertices = mesh.num_vertices();
    let num_triangles = mesh.num_triangles();
    let mut errors: Vec<String> = Vec::new();

    if let Some(v) = mesh
        .vertices()
        .iter()
        .position(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
    {
        errors.push(format!("vertex {} has a non-finite coordinate", v));
    }

    let mut out_of_range = 0usize;
    for t in 0..num_triangles {
        if !mesh.triangle_in_range(t) {
            if out_of_range == 0 {
                errors.push(format!(
                    "triangle {} references a vertex outside [0, {})",
                    t, num_vertices
                ));
            }
            out_of_range += 1;
        }
    }
    if out_of_range > 1 {
        errors.push(format!("{} triangles have out-of-range indices", out_of_range));
    }

    let edges = mesh.edge_incidence();
    let boundary_edges = edges.boundary_edges();
    let non_manifold_edges = edges.non_manifold_edges();

    let num_degenerate_triangles = (0..num_triangles)
        .filter(|&t| mesh.triangle_in_range(t) && mesh.is_degenerate(t))
        .count();

    let num_unique_vertices = mesh
        .vertices()
        .iter()
        .map(|p| [coord_bits(p.x), coord_bits(p.y), coord_bits(p.z)])
        .collect::<HashSet<_>>()
        .len();

    let num_edges = edges.num_edges();
    let euler_characteristic = num_vertices as i64 - num_edges as i64 + num_triangles as i64;

    let is_manifold = non_manifold_edges.is_empty();
    let has_boundary = !boundary_edges.is_empty();
    let is_closed = num_triangles > 0 && !has_boundary;
    let suitable_for_unfolding = is_manifold
        && num_degenerate_triangles == 0
        && num_vertices == num_unique_vertices;

    let mut warnings = Vec::new();
    if num_degenerate_triangles > 0 {
        warnings.push(format!(
            "{} degenerate triangle(s) will be excluded from the solve",
            num_degenerate_triangles
        ));
    }
    if !is_manifold {
        warnings.push(format!(
            "{} non-manifold edge(s) shared by more than two triangles",
            non_manifold_edges.len()
        ));
    }
    if num_unique_vertices < num_vertices {
        warnings.push(format!(
            "{} duplicated vertex position(s)",
            num_vertices - num_unique_vertices
        ));
    }
    if is_closed {
        warnings.push("mesh is closed; unfolding needs a cut to produce a boundary".to_string());
    }

    let (status, error) = if !errors.is_empty() {
        (ValidationStatus::Error, Some(errors.join("; ")))
    } else if suitable_for_unfolding {
        (ValidationStatus::Valid, None)
    } else {
        (ValidationStatus::BasicValid, None)
    };

    ValidationReport {
        num_vertices,
        num_unique_vertices,
        num_triangles,
        num_edges,
        boundary_edges,
        non_manifold_edges,
        num_degenerate_triangles,
        euler_characteristic,
        is_manifold,
        has_boundary,
        is_closed,
        suitable_for_unfolding,
        status,
        error,
        warnings,
    }
}

/// Bit pattern of a coordinate with `-0.0` folded onto `0.0`.
#[inline]
fn coord_bits(x: f64) -> u64 {
    (x + 0.0).to_bits()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::synthetic_grid_mesh;

    fn tetrahedron() -> TriangleMesh {
        TriangleMesh::from_arrays(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.5, 1.0, 0.0],
                [0.5, 0.5, 1.0],
            ],
            &[[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]],
        )
    }

    #[test]
    fn test_closed_tetrahedron() {
        let report = validate(&tetrahedron());

        assert!(report.is_closed);
        assert!(!report.has_boundary);
        assert!(report.boundary_edges.is_empty());
        assert!(report.is_manifold);
        assert_eq!(report.num_edges, 6);
        assert_eq!(report.euler_characteristic, 2);
        assert_eq!(report.status, ValidationStatus::Valid);
    }

    #[test]
    fn test_grid_euler_characteristic() {
        let mesh = synthetic_grid_mesh(4, 6).unwrap();
        let report = validate(&mesh);

        let e = mesh.edge_incidence().num_edges() as i64;
        assert_eq!(
            report.euler_characteristic,
            mesh.num_vertices() as i64 - e + mesh.num_triangles() as i64
        );
        // Disk topology
        assert_eq!(report.euler_characteristic, 1);
        assert_eq!(report.num_boundary_edges(), 2 * (3 + 5));
        assert!(report.suitable_for_unfolding);
    }

    #[test]
    fn test_degenerate_triangle() {
        let mesh = TriangleMesh::from_arrays(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [2.0, 0.0, 0.0],
            ],
            &[[0, 1, 2], [0, 1, 3]],
        );
        let report = validate(&mesh);

        assert_eq!(report.num_degenerate_triangles, 1);
        assert!(!report.suitable_for_unfolding);
        assert_eq!(report.status, ValidationStatus::BasicValid);
        assert!(!report.warnings.is_empty());
    }

    #[test]
    fn test_non_manifold_edge() {
        let mesh = TriangleMesh::from_arrays(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.5, 1.0, 0.0],
                [0.5, -1.0, 0.0],
                [0.5, 0.0, 1.0],
            ],
            &[[0, 1, 2], [1, 0, 3], [0, 1, 4]],
        );
        let report = validate(&mesh);

        assert!(!report.is_manifold);
        assert_eq!(report.num_non_manifold_edges(), 1);
        assert_eq!(report.status, ValidationStatus::BasicValid);
    }

    #[test]
    fn test_duplicate_vertices() {
        let mesh = TriangleMesh::from_arrays(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [-0.0, 0.0, 0.0],
            ],
            &[[0, 1, 2]],
        );
        let report = validate(&mesh);

        assert_eq!(report.num_unique_vertices, 3);
        assert!(!report.suitable_for_unfolding);
    }

    #[test]
    fn test_out_of_range_is_error() {
        let mesh = TriangleMesh::from_arrays(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[[0, 1, 2], [0, 2, 5]],
        );
        let report = validate(&mesh);

        assert_eq!(report.status, ValidationStatus::Error);
        assert!(report.error.as_deref().unwrap().contains("triangle 1"));
        // Counts still reflect the in-range triangle
        assert_eq!(report.num_edges, 3);
    }

    #[test]
    fn test_non_finite_is_error() {
        let mesh = TriangleMesh::from_arrays(
            &[[0.0, 0.0, 0.0], [f64::NAN, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[[0, 1, 2]],
        );
        let report = validate(&mesh);
        assert_eq!(report.status, ValidationStatus::Error);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ValidationStatus::BasicValid.to_string(), "basic_valid");
    }
}

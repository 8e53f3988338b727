//! # Pleat
//!
//! Surface unfolding and mesh analysis for manufacturable flat patterns.
//!
//! Pleat takes a triangle mesh exported from a CAD application and answers
//! two questions: where should the surface be folded, and what flat pattern
//! does it unfold to?
//!
//! ## Features
//!
//! - **Validation**: manifoldness, degeneracy, duplicate vertices, Euler
//!   characteristic, reported as data
//! - **Curvature**: per-vertex normals and a curvature proxy or angle defect
//! - **Fold lines**: key vertex selection and geodesic paths classified into
//!   mountain folds, valley folds and score lines
//! - **Unfolding**: least squares conformal maps with sparse Cholesky or
//!   conjugate gradient, distortion metrics and a manufacturability verdict
//! - **File formats**: OBJ (with UVs) and STL
//!
//! ## Quick Start
//!
//! ```no_run
//! use pleat::prelude::*;
//!
//! let mesh = pleat::io::load("panel.obj").unwrap();
//!
//! let report = validate(&mesh);
//! println!("status: {}, euler: {}", report.status, report.euler_characteristic);
//!
//! let unfolded = unfold(&mesh, &[], &ManufacturingConstraints::new(), &UnfoldOptions::default()).unwrap();
//! println!("pattern: {:.3} x {:.3}", unfolded.pattern_size.x, unfolded.pattern_size.y);
//!
//! pleat::io::save_obj_with_uvs(&mesh, &unfolded.uv, "pattern.obj").unwrap();
//! ```
//!
//! ## Finding Fold Lines
//!
//! ```
//! use pleat::prelude::*;
//!
//! let mesh = synthetic_grid_mesh(6, 6).unwrap();
//! let curvature = analyze_curvature(&mesh, &CurvatureOptions::default());
//! let keys = select_key_vertices(&mesh, &curvature.curvature, &KeyVertexOptions::default());
//!
//! let graph = GeodesicGraph::from_mesh(&mesh);
//! let folds = fold_lines_from(&graph.all_pairs_among(&keys.vertices));
//! for fold in &folds {
//!     println!("{} -> {}: {:?}", fold.start, fold.end, fold.kind);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use pleat::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::curvature::{analyze_curvature, CurvatureAnalysis, CurvatureOptions};
    pub use crate::algo::geodesic::{fold_lines_from, FoldLine, GeodesicGraph, GeodesicPath};
    pub use crate::algo::keyvertex::{select_key_vertices, KeyVertexOptions, KeyVertexSet};
    pub use crate::algo::parameterize::{
        unfold, BoundaryConstraint, LscmOptions, LscmSolver, ManufacturingConstraints, UnfoldOptions,
        UnfoldReport, UvMap,
    };
    pub use crate::algo::validate::{validate, ValidationReport, ValidationStatus};
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{synthetic_grid_mesh, TriangleMesh};
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_tetrahedron() {
        let mesh = TriangleMesh::from_arrays(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.5, 1.0, 0.0],
                [0.5, 0.5, 1.0],
            ],
            &[
                [0, 2, 1], // bottom
                [0, 1, 3], // front
                [1, 2, 3], // right
                [2, 0, 3], // left
            ],
        );

        let report = validate(&mesh);
        assert_eq!(report.num_edges, 6);
        assert_eq!(report.euler_characteristic, 2);
        assert!(report.is_closed);
        assert!(report.is_manifold);
        assert_eq!(report.status, ValidationStatus::Valid);

        // Closed surfaces still unfold once pinned
        let unfolded = unfold(&mesh, &[], &ManufacturingConstraints::new(), &UnfoldOptions::default()).unwrap();
        assert_eq!(unfolded.uv.len(), 4);
        assert!(unfolded.uv.as_slice().iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }
}

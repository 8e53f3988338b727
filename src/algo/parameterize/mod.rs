//! Surface unfolding by least squares conformal maps.
//!
//! The pipeline assembles a sparse conformal system over the mesh
//! triangles, anchors it with boundary constraints, lets registered
//! adjusters react to manufacturing parameters, solves the regularized
//! normal equations, and measures how far the flat pattern departs from the
//! 3D surface.
//!
//! # Stages
//!
//! - [`LscmSolver`]: system assembly, constraints and the linear solve
//! - [`apply_manufacturing_constraints`]: named adjusters over the system
//! - [`compute_distortion`]: per-triangle area, angle and edge distortion
//! - [`unfold`]: all of the above plus a manufacturability verdict
//!
//! # Example
//!
//! ```
//! use pleat::mesh::synthetic_grid_mesh;
//! use pleat::algo::parameterize::{BoundaryConstraint, LscmOptions, LscmSolver};
//!
//! let mesh = synthetic_grid_mesh(4, 4).unwrap();
//! let solver = LscmSolver::new(&mesh, LscmOptions::default()).unwrap();
//! let mut system = solver.build_conformal_system().unwrap();
//! solver
//!     .apply_boundary_constraints(&mut system, &[BoundaryConstraint::new(0, 0.0, 0.0)])
//!     .unwrap();
//! let solution = solver.solve(&system).unwrap();
//! assert_eq!(solution.uv.len(), 16);
//! ```
//!
//! # References
//!
//! - Lévy, B., Petitjean, S., Ray, N., & Maillot, J. (2002). "Least squares
//!   conformal maps for automatic texture atlas generation." ACM SIGGRAPH.

mod distortion;
mod lscm;
mod manufacturing;
mod sparse;
mod unfold;
mod uv;

pub use distortion::{compute_distortion, compute_distortion_with, DistortionMetrics, Stats, TriangleDistortion};
pub use lscm::{
    Anchoring, BoundaryConstraint, ConformalSystem, LinearSolver, LscmOptions, LscmSolver, SystemLayout, UvSolution,
};
pub use manufacturing::{
    apply_manufacturing_constraints, AdjusterRegistry, ManufacturingConstraints, ManufacturingOutcome, SystemAdjuster,
};
pub use sparse::CsrMatrix;
pub use unfold::{unfold, ManufacturingData, SolutionInfo, UnfoldOptions, UnfoldReport};
pub use uv::UvMap;

//! Mesh analysis and unfolding algorithms.
//!
//! Two pipelines share a validated [`TriangleMesh`](crate::mesh::TriangleMesh):
//!
//! - **Analysis**: [`validate`] → [`curvature`] → [`keyvertex`] →
//!   [`geodesic`] (shortest paths and fold lines)
//! - **Unfolding**: [`parameterize`] (conformal system, solve, distortion,
//!   manufacturability)
//!
//! [`decimate`] thins oversized inputs before either pipeline.

pub mod curvature;
pub mod decimate;
pub mod geodesic;
pub mod keyvertex;
pub mod parameterize;
pub mod validate;

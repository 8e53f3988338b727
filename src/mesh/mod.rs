//! Core mesh data structures.
//!
//! This module provides the indexed triangle mesh used by every stage of the
//! unfolding pipeline, together with shared triangle geometry helpers and
//! grid mesh constructors.
//!
//! # Overview
//!
//! The primary type is [`TriangleMesh`], a face-vertex list of
//! `Point3<f64>` positions and `[usize; 3]` triangles. It deliberately
//! accepts any triangle soup: manifoldness, degeneracy and index range are
//! checked by [`crate::algo::validate`], which reports defects instead of
//! refusing the mesh.
//!
//! # Construction
//!
//! ```
//! use pleat::mesh::TriangleMesh;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let mesh = TriangleMesh::new(vertices, vec![[0, 1, 2]]);
//! assert_eq!(mesh.num_triangles(), 1);
//! ```

pub mod geometry;
mod grid;
mod triangle_mesh;

pub use grid::{extract_from_structured_grid, synthetic_grid_mesh};
pub use triangle_mesh::{EdgeIncidence, TriangleMesh};

//! Stride decimation of oversized meshes.
//!
//! Large CAD exports are thinned before analysis by keeping every `k`-th
//! vertex, where `k = ⌈V / max_vertices⌉`. This is sampling, not
//! error-driven simplification: triangles survive only when all three of
//! their corners are kept, so the result usually has holes and must be
//! validated again before unfolding.
//!
//! # Example
//!
//! ```
//! use pleat::mesh::synthetic_grid_mesh;
//! use pleat::algo::decimate::decimate;
//!
//! let mesh = synthetic_grid_mesh(10, 10).unwrap();
//! let result = decimate(&mesh, 50).unwrap();
//! assert_eq!(result.mesh.num_vertices(), 50);
//! assert_eq!(result.kept[1], 2);
//! ```

use crate::error::{MeshError, Result};
use crate::mesh::geometry::{triangle_area, DEGENERATE_AREA};
use crate::mesh::TriangleMesh;

/// Result of [`decimate`].
#[derive(Debug, Clone)]
pub struct Decimation {
    /// The decimated mesh.
    pub mesh: TriangleMesh,
    /// Original index of each vertex of `mesh`.
    pub kept: Vec<usize>,
    /// Sampling stride; 1 for a passthrough.
    pub stride: usize,
}

impl Decimation {
    /// Number of vertices removed from `original`.
    pub fn removed_vertices(&self, original: &TriangleMesh) -> usize {
        original.num_vertices().saturating_sub(self.kept.len())
    }
}

/// Reduce `mesh` to at most `max_vertices` vertices by stride sampling.
///
/// Meshes already within the cap are returned unchanged. Otherwise vertex
/// `i` is kept when `i % stride == 0`, triangles are remapped to the kept
/// vertices, and triangles touching a removed vertex or with zero area after
/// remapping are dropped.
///
/// # Errors
///
/// Returns [`MeshError::InvalidParameter`] if `max_vertices` is zero.
pub fn decimate(mesh: &TriangleMesh, max_vertices: usize) -> Result<Decimation> {
    if max_vertices == 0 {
        return Err(MeshError::invalid_param("max_vertices", max_vertices, "must be positive"));
    }

    let n = mesh.num_vertices();
    if n <= max_vertices {
        return Ok(Decimation {
            mesh: mesh.clone(),
            kept: (0..n).collect(),
            stride: 1,
        });
    }

    let stride = n.div_ceil(max_vertices);
    let kept: Vec<usize> = (0..n).step_by(stride).collect();

    let mut remap = vec![None; n];
    for (new, &old) in kept.iter().enumerate() {
        remap[old] = Some(new);
    }

    let vertices: Vec<_> = kept.iter().map(|&v| *mesh.position(v)).collect();
    let mut dropped = 0;
    let triangles: Vec<[usize; 3]> = mesh
        .triangles()
        .iter()
        .filter_map(|tri| {
            let mapped = [
                remap.get(tri[0]).copied().flatten()?,
                remap.get(tri[1]).copied().flatten()?,
                remap.get(tri[2]).copied().flatten()?,
            ];
            Some(mapped)
        })
        .filter(|t| {
            let keep = t[0] != t[1]
                && t[1] != t[2]
                && t[0] != t[2]
                && triangle_area(&vertices[t[0]], &vertices[t[1]], &vertices[t[2]]) >= DEGENERATE_AREA;
            if !keep {
                dropped += 1;
            }
            keep
        })
        .collect();

    log::debug!(
        "decimated {} -> {} vertices (stride {}), {} -> {} triangles, {} degenerate dropped",
        n,
        kept.len(),
        stride,
        mesh.num_triangles(),
        triangles.len(),
        dropped
    );

    Ok(Decimation {
        mesh: TriangleMesh::new(vertices, triangles),
        kept,
        stride,
    })
}

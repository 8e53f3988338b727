//! Structured grid meshes.
//!
//! Two entry points produce [`TriangleMesh`]es laid out on a rectangular
//! grid: [`synthetic_grid_mesh`] generates a deterministic test surface, and
//! [`extract_from_structured_grid`] rebuilds connectivity from a flat
//! coordinate stream such as a CAD application exports for a sampled
//! surface.

use std::collections::HashMap;
use std::f64::consts::PI;

use nalgebra::Point3;

use super::TriangleMesh;
use crate::error::{MeshError, Result};

/// Height amplitude of the synthetic grid perturbation.
const SYNTHETIC_AMPLITUDE: f64 = 0.1;

/// Coordinates closer than this are treated as the same grid line.
const GRID_SNAP: f64 = 1e-9;

/// Generate a `rows × cols` grid mesh with a small sinusoidal bump.
///
/// Vertices are unit-spaced in X (columns) and Y (rows), numbered row by
/// row. The height is `0.1 · sin(π·c/(cols−1)) · sin(π·r/(rows−1))`, which
/// vanishes on the border. Each cell is split into two counter-clockwise
/// triangles along its `(c, r)–(c+1, r+1)` diagonal. The output depends only
/// on the arguments.
///
/// # Errors
///
/// Returns [`MeshError::InvalidParameter`] if `rows` or `cols` is below 2.
///
/// # Example
/// ```
/// use pleat::mesh::synthetic_grid_mesh;
///
/// let mesh = synthetic_grid_mesh(5, 5).unwrap();
/// assert_eq!(mesh.num_vertices(), 25);
/// assert_eq!(mesh.num_triangles(), 32);
/// ```
pub fn synthetic_grid_mesh(rows: usize, cols: usize) -> Result<TriangleMesh> {
    if rows < 2 {
        return Err(MeshError::invalid_param("rows", rows, "must be at least 2"));
    }
    if cols < 2 {
        return Err(MeshError::invalid_param("cols", cols, "must be at least 2"));
    }

    let mut vertices = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            let sx = (PI * c as f64 / (cols - 1) as f64).sin();
            let sy = (PI * r as f64 / (rows - 1) as f64).sin();
            vertices.push(Point3::new(
                c as f64,
                r as f64,
                SYNTHETIC_AMPLITUDE * sx * sy,
            ));
        }
    }

    let mut triangles = Vec::with_capacity(2 * (rows - 1) * (cols - 1));
    for r in 0..rows - 1 {
        for c in 0..cols - 1 {
            let v00 = r * cols + c;
            let v10 = v00 + 1;
            let v01 = v00 + cols;
            let v11 = v01 + 1;

            triangles.push([v00, v10, v11]);
            triangles.push([v00, v11, v01]);
        }
    }

    Ok(TriangleMesh::new(vertices, triangles))
}

/// Rebuild a grid mesh from a flat `x y z x y z ...` coordinate stream.
///
/// The grid dimensions are inferred from the distinct X and Y values. Each
/// point becomes a vertex (in stream order) and is assigned to the grid
/// cell of its X/Y values; if two points land on the same grid position the
/// first one wins. Every cell whose four corners are present is split into
/// two triangles. Cells with a missing corner, and a trailing partial
/// coordinate triple, are logged and skipped.
pub fn extract_from_structured_grid(coordinates: &[f64]) -> TriangleMesh {
    let remainder = coordinates.len() % 3;
    if remainder != 0 {
        log::debug!(
            "ignoring {} trailing coordinate value(s) that do not form a point",
            remainder
        );
    }

    let vertices: Vec<Point3<f64>> = coordinates
        .chunks_exact(3)
        .map(|c| Point3::new(c[0], c[1], c[2]))
        .collect();

    if vertices.is_empty() {
        return TriangleMesh::default();
    }

    let xs = distinct_values(vertices.iter().map(|p| p.x));
    let ys = distinct_values(vertices.iter().map(|p| p.y));

    let mut grid: HashMap<(usize, usize), usize> = HashMap::with_capacity(vertices.len());
    for (vi, p) in vertices.iter().enumerate() {
        let (Some(ix), Some(iy)) = (grid_index(&xs, p.x), grid_index(&ys, p.y)) else {
            log::debug!("point {} has a non-finite coordinate; not placed on grid", vi);
            continue;
        };
        grid.entry((ix, iy)).or_insert(vi);
    }

    log::debug!(
        "structured grid: {} x {} from {} points",
        xs.len(),
        ys.len(),
        vertices.len()
    );

    let mut triangles = Vec::new();
    let mut skipped = 0usize;
    for iy in 0..ys.len().saturating_sub(1) {
        for ix in 0..xs.len().saturating_sub(1) {
            let corners = (
                grid.get(&(ix, iy)),
                grid.get(&(ix + 1, iy)),
                grid.get(&(ix + 1, iy + 1)),
                grid.get(&(ix, iy + 1)),
            );
            match corners {
                (Some(&v00), Some(&v10), Some(&v11), Some(&v01)) => {
                    triangles.push([v00, v10, v11]);
                    triangles.push([v00, v11, v01]);
                }
                _ => {
                    log::debug!("grid cell ({}, {}) has a missing corner; skipped", ix, iy);
                    skipped += 1;
                }
            }
        }
    }

    if skipped > 0 {
        log::debug!("skipped {} incomplete grid cell(s)", skipped);
    }

    TriangleMesh::new(vertices, triangles)
}

/// Sorted distinct finite values, merging values within [`GRID_SNAP`].
fn distinct_values(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut distinct: Vec<f64> = Vec::new();
    for v in sorted {
        match distinct.last() {
            Some(&last) if (v - last).abs() <= GRID_SNAP => {}
            _ => distinct.push(v),
        }
    }
    distinct
}

/// Position of `value` among the snapped grid lines.
fn grid_index(lines: &[f64], value: f64) -> Option<usize> {
    if !value.is_finite() {
        return None;
    }
    let idx = lines.partition_point(|&l| l < value - GRID_SNAP);
    (idx < lines.len() && (lines[idx] - value).abs() <= GRID_SNAP).then_some(idx)
}

//! Geodesic shortest paths and fold lines.
//!
//! Distances are measured along mesh edges: [`GeodesicGraph`] turns the
//! triangle soup into an undirected weighted graph and runs Dijkstra on it.
//! Paths between key vertices are then classified into fold lines by how
//! sharply they turn.
//!
//! # Example
//!
//! ```
//! use pleat::mesh::synthetic_grid_mesh;
//! use pleat::algo::geodesic::{fold_lines_from, GeodesicGraph};
//!
//! let mesh = synthetic_grid_mesh(4, 4).unwrap();
//! let graph = GeodesicGraph::from_mesh(&mesh);
//!
//! let result = graph.shortest_path(0, None);
//! println!("distance to far corner: {}", result.distance(15));
//!
//! let paths = graph.all_pairs_among(&[0, 3, 12, 15]);
//! assert_eq!(paths.len(), 6);
//! let folds = fold_lines_from(&paths);
//! assert_eq!(folds.len(), 6);
//! ```

mod dijkstra;
mod fold;

use std::collections::HashMap;

use nalgebra::Point3;
use rayon::prelude::*;

pub use fold::{fold_lines_from, FoldKind, FoldLine, LineStyle};

use crate::mesh::geometry::edge_key;
use crate::mesh::TriangleMesh;

/// Undirected edge graph of a triangle mesh, weighted by edge length.
///
/// Parallel edges (an edge shared by several triangles) collapse to a single
/// edge carrying the minimum weight. Self-loops from repeated triangle
/// indices and triangles with out-of-range indices are ignored.
#[derive(Debug, Clone)]
pub struct GeodesicGraph<'a> {
    mesh: &'a TriangleMesh,
    adjacency: Vec<Vec<(usize, f64)>>,
}

impl<'a> GeodesicGraph<'a> {
    /// Build the edge graph of `mesh`.
    pub fn from_mesh(mesh: &'a TriangleMesh) -> Self {
        let mut weights: HashMap<(usize, usize), f64> = HashMap::new();

        for (t, tri) in mesh.triangles().iter().enumerate() {
            if !mesh.triangle_in_range(t) {
                continue;
            }
            for i in 0..3 {
                let (a, b) = (tri[i], tri[(i + 1) % 3]);
                if a == b {
                    continue;
                }
                let length = (mesh.position(b) - mesh.position(a)).norm();
                weights
                    .entry(edge_key(a, b))
                    .and_modify(|w| *w = w.min(length))
                    .or_insert(length);
            }
        }

        let mut adjacency = vec![Vec::new(); mesh.num_vertices()];
        for (&(a, b), &w) in &weights {
            adjacency[a].push((b, w));
            adjacency[b].push((a, w));
        }
        // Deterministic relaxation order
        for neighbors in &mut adjacency {
            neighbors.sort_unstable_by_key(|&(v, _)| v);
        }

        Self { mesh, adjacency }
    }

    /// The mesh the graph was built from.
    #[inline]
    pub fn mesh(&self) -> &'a TriangleMesh {
        self.mesh
    }

    /// Number of vertices (graph nodes).
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of undirected edges.
    pub fn num_edges(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Neighbors of `v` with edge weights, ascending by neighbor index.
    #[inline]
    pub fn neighbors(&self, v: usize) -> &[(usize, f64)] {
        &self.adjacency[v]
    }

    /// Single-source shortest paths from `source`.
    ///
    /// With a `target`, the search stops once the target is settled; the
    /// distances of vertices not yet settled are then upper bounds or
    /// infinite.
    pub fn shortest_path(&self, source: usize, target: Option<usize>) -> ShortestPaths {
        dijkstra::dijkstra(self, source, target)
    }

    /// Shortest path between two vertices, or `None` if either index is out
    /// of range or `target` is unreachable.
    pub fn path_between(&self, source: usize, target: usize) -> Option<GeodesicPath> {
        if source >= self.num_vertices() || target >= self.num_vertices() {
            return None;
        }
        let result = self.shortest_path(source, Some(target));
        self.to_geodesic_path(&result, target)
    }

    /// Shortest paths between every unordered pair of `vertices`.
    ///
    /// Pairs are visited as `(vertices[i], vertices[j])` with `i < j` and the
    /// output keeps that order. Unreachable and out-of-range pairs are
    /// skipped.
    pub fn all_pairs_among(&self, vertices: &[usize]) -> Vec<GeodesicPath> {
        self.all_pairs_among_with(vertices, true)
    }

    /// [`all_pairs_among`](Self::all_pairs_among) with explicit control over
    /// parallelism.
    pub fn all_pairs_among_with(&self, vertices: &[usize], parallel: bool) -> Vec<GeodesicPath> {
        let paths_from = |i: usize| -> Vec<GeodesicPath> {
            let source = vertices[i];
            if source >= self.num_vertices() {
                return Vec::new();
            }
            let result = self.shortest_path(source, None);
            vertices[i + 1..]
                .iter()
                .filter_map(|&target| {
                    if target >= self.num_vertices() {
                        return None;
                    }
                    self.to_geodesic_path(&result, target)
                })
                .collect()
        };

        let per_source: Vec<Vec<GeodesicPath>> = if parallel {
            (0..vertices.len()).into_par_iter().map(paths_from).collect()
        } else {
            (0..vertices.len()).map(paths_from).collect()
        };

        let paths: Vec<GeodesicPath> = per_source.into_iter().flatten().collect();
        log::debug!(
            "computed {} geodesic paths among {} vertices",
            paths.len(),
            vertices.len()
        );
        paths
    }

    fn to_geodesic_path(&self, result: &ShortestPaths, target: usize) -> Option<GeodesicPath> {
        let vertices = result.path_to(target)?;
        let points = vertices.iter().map(|&v| *self.mesh.position(v)).collect();
        Some(GeodesicPath {
            length: result.distance(target),
            vertices,
            points,
        })
    }
}

/// Single-source shortest path result.
///
/// Contains distances from the source to all vertices and predecessor
/// information for path reconstruction.
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    /// Distance from the source to each vertex.
    /// `f64::INFINITY` if the vertex is unreachable.
    distances: Vec<f64>,

    /// Predecessor vertex for each vertex. `None` for the source and for
    /// unreachable vertices.
    predecessors: Vec<Option<usize>>,
}

impl ShortestPaths {
    pub(crate) fn new(distances: Vec<f64>, predecessors: Vec<Option<usize>>) -> Self {
        Self {
            distances,
            predecessors,
        }
    }

    /// Distance to `v`; infinite if unreachable or out of range.
    #[inline]
    pub fn distance(&self, v: usize) -> f64 {
        self.distances.get(v).copied().unwrap_or(f64::INFINITY)
    }

    /// All distances as a slice.
    #[inline]
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Check if `v` is reachable from the source.
    #[inline]
    pub fn is_reachable(&self, v: usize) -> bool {
        self.distance(v).is_finite()
    }

    /// Count the number of reachable vertices.
    pub fn reachable_count(&self) -> usize {
        self.distances.iter().filter(|d| d.is_finite()).count()
    }

    /// Find the vertex with the maximum finite distance.
    pub fn farthest_vertex(&self) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &d) in self.distances.iter().enumerate() {
            if d.is_finite() && best.map_or(true, |(_, bd)| d > bd) {
                best = Some((i, d));
            }
        }
        best
    }

    /// Reconstruct the path from the source to `target`.
    ///
    /// Returns `None` if the target is unreachable. The path includes both
    /// endpoints; the path to the source itself is `[source]`.
    pub fn path_to(&self, target: usize) -> Option<Vec<usize>> {
        if !self.is_reachable(target) {
            return None;
        }

        let mut path = vec![target];
        let mut current = target;
        while let Some(pred) = self.predecessors[current] {
            path.push(pred);
            current = pred;

            if path.len() > self.distances.len() {
                return None;
            }
        }

        path.reverse();
        Some(path)
    }
}

/// A shortest path along mesh edges.
#[derive(Debug, Clone, PartialEq)]
pub struct GeodesicPath {
    /// Vertex indices from start to end.
    pub vertices: Vec<usize>,
    /// Sum of edge lengths along the path.
    pub length: f64,
    /// Positions of `vertices`.
    pub points: Vec<Point3<f64>>,
}

impl GeodesicPath {
    /// First vertex of the path.
    pub fn start(&self) -> Option<usize> {
        self.vertices.first().copied()
    }

    /// Last vertex of the path.
    pub fn end(&self) -> Option<usize> {
        self.vertices.last().copied()
    }

    /// Number of edges traversed.
    pub fn num_edges(&self) -> usize {
        self.vertices.len().saturating_sub(1)
    }
}

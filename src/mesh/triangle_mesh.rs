//! Indexed triangle mesh.

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};

use super::geometry::{edge_key, triangle_area, triangle_cross, DEGENERATE_AREA};
use crate::error::{MeshError, Result};

/// An indexed triangle mesh (face-vertex list).
///
/// Unlike a half-edge structure this accepts any triangle soup, including
/// non-manifold, degenerate or out-of-range input, so that defects can be
/// reported by [`crate::algo::validate`] rather than rejected up front.
/// The mesh is immutable once built; operations such as decimation return
/// a new mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    vertices: Vec<Point3<f64>>,
    triangles: Vec<[usize; 3]>,
}

impl TriangleMesh {
    /// Create a mesh from vertex positions and triangle indices.
    pub fn new(vertices: Vec<Point3<f64>>, triangles: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            triangles,
        }
    }

    /// Create a mesh, rejecting empty or out-of-range triangle lists.
    ///
    /// # Errors
    ///
    /// - [`MeshError::EmptyMesh`] if `triangles` is empty.
    /// - [`MeshError::InvalidVertexIndex`] for the first index not below
    ///   `vertices.len()`.
    pub fn try_new(vertices: Vec<Point3<f64>>, triangles: Vec<[usize; 3]>) -> Result<Self> {
        if triangles.is_empty() {
            return Err(MeshError::EmptyMesh);
        }
        for (triangle, tri) in triangles.iter().enumerate() {
            if let Some(&vertex) = tri.iter().find(|&&v| v >= vertices.len()) {
                return Err(MeshError::InvalidVertexIndex { triangle, vertex });
            }
        }
        Ok(Self::new(vertices, triangles))
    }

    /// Create a mesh from raw coordinate arrays.
    ///
    /// # Example
    /// ```
    /// use pleat::mesh::TriangleMesh;
    ///
    /// let mesh = TriangleMesh::from_arrays(
    ///     &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
    ///     &[[0, 1, 2], [0, 2, 3]],
    /// );
    /// assert_eq!(mesh.num_vertices(), 4);
    /// assert_eq!(mesh.num_triangles(), 2);
    /// ```
    pub fn from_arrays(vertices: &[[f64; 3]], triangles: &[[usize; 3]]) -> Self {
        Self {
            vertices: vertices
                .iter()
                .map(|v| Point3::new(v[0], v[1], v[2]))
                .collect(),
            triangles: triangles.to_vec(),
        }
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[inline]
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Check if the mesh has no triangles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Vertex positions.
    #[inline]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Triangle index triples.
    #[inline]
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Position of a vertex.
    #[inline]
    pub fn position(&self, v: usize) -> &Point3<f64> {
        &self.vertices[v]
    }

    /// Whether every index of triangle `t` is a valid vertex.
    #[inline]
    pub fn triangle_in_range(&self, t: usize) -> bool {
        let n = self.vertices.len();
        self.triangles[t].iter().all(|&v| v < n)
    }

    /// Corner positions of triangle `t`.
    ///
    /// Panics if the triangle references an out-of-range vertex.
    #[inline]
    pub fn triangle_positions(&self, t: usize) -> [Point3<f64>; 3] {
        let [a, b, c] = self.triangles[t];
        [self.vertices[a], self.vertices[b], self.vertices[c]]
    }

    /// Area of triangle `t`.
    pub fn triangle_area(&self, t: usize) -> f64 {
        let [p0, p1, p2] = self.triangle_positions(t);
        triangle_area(&p0, &p1, &p2)
    }

    /// Unit normal of triangle `t` (zero for degenerate triangles).
    pub fn triangle_normal(&self, t: usize) -> Vector3<f64> {
        let [p0, p1, p2] = self.triangle_positions(t);
        let n = triangle_cross(&p0, &p1, &p2);
        let len = n.norm();
        if len < 2.0 * DEGENERATE_AREA {
            Vector3::zeros()
        } else {
            n / len
        }
    }

    /// Whether triangle `t` has (numerically) zero area.
    #[inline]
    pub fn is_degenerate(&self, t: usize) -> bool {
        self.triangle_area(t) < DEGENERATE_AREA
    }

    /// Total surface area over in-range triangles.
    pub fn surface_area(&self) -> f64 {
        (0..self.triangles.len())
            .filter(|&t| self.triangle_in_range(t))
            .map(|t| self.triangle_area(t))
            .sum()
    }

    /// Axis-aligned bounding box. Returns `None` for a mesh without vertices.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?;
        let mut min = *first;
        let mut max = *first;
        for p in &self.vertices {
            min = min.inf(p);
            max = max.sup(p);
        }
        Some((min, max))
    }

    /// Mean length of all distinct edges.
    pub fn average_edge_length(&self) -> f64 {
        let edges = self.edge_incidence();
        let mut total = 0.0;
        let mut count = 0usize;
        for &(a, b) in edges.counts.keys() {
            if a != b {
                total += (self.vertices[b] - self.vertices[a]).norm();
                count += 1;
            }
        }
        if count == 0 {
            0.0
        } else {
            total / count as f64
        }
    }

    /// Build the edge incidence map over in-range triangles.
    pub fn edge_incidence(&self) -> EdgeIncidence {
        let mut incidence = EdgeIncidence::default();
        for t in 0..self.triangles.len() {
            if self.triangle_in_range(t) {
                incidence.add_triangle(&self.triangles[t]);
            }
        }
        incidence
    }

    /// Sorted indices of vertices lying on a boundary edge.
    pub fn boundary_vertices(&self) -> Vec<usize> {
        self.edge_incidence().boundary_vertices(self.vertices.len())
    }

    /// Decompose into vertex and triangle vectors.
    pub fn into_parts(self) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        (self.vertices, self.triangles)
    }
}

/// Number of triangles incident to each undirected edge.
///
/// Keys are sorted vertex pairs. A triangle with repeated indices
/// contributes a self-loop key `(v, v)`, so the total incidence is always
/// three times the number of triangles counted.
#[derive(Debug, Clone, Default)]
pub struct EdgeIncidence {
    counts: HashMap<(usize, usize), usize>,
}

impl EdgeIncidence {
    /// Count the three edges of `tri`.
    pub fn add_triangle(&mut self, tri: &[usize; 3]) {
        for i in 0..3 {
            *self.counts.entry(edge_key(tri[i], tri[(i + 1) % 3])).or_insert(0) += 1;
        }
    }

    /// Number of distinct edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.counts.len()
    }

    /// Incidence count of the edge (a, b), in either order.
    pub fn count(&self, a: usize, b: usize) -> usize {
        self.counts.get(&edge_key(a, b)).copied().unwrap_or(0)
    }

    /// Sum of all incidence counts.
    pub fn total_incidence(&self) -> usize {
        self.counts.values().sum()
    }

    /// Iterate over `(edge, count)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), usize)> + '_ {
        self.counts.iter().map(|(&e, &c)| (e, c))
    }

    /// Edges used by exactly one triangle, sorted.
    pub fn boundary_edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<_> = self
            .counts
            .iter()
            .filter(|&(_, &c)| c == 1)
            .map(|(&e, _)| e)
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Edges shared by more than two triangles, sorted.
    pub fn non_manifold_edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<_> = self
            .counts
            .iter()
            .filter(|&(_, &c)| c > 2)
            .map(|(&e, _)| e)
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Sorted vertices touching a boundary edge.
    pub fn boundary_vertices(&self, num_vertices: usize) -> Vec<usize> {
        let mut is_boundary = vec![false; num_vertices];
        for (&(a, b), &count) in &self.counts {
            if count == 1 {
                is_boundary[a] = true;
                is_boundary[b] = true;
            }
        }
        is_boundary
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| if b { Some(i) } else { None })
            .collect()
    }
}

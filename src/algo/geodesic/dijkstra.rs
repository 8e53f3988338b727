//! Dijkstra's algorithm on the mesh edge graph.
//!
//! Computes shortest path distances along mesh edges. This gives exact
//! distances on the edge graph, which approximates true geodesic distances
//! on the surface.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::{GeodesicGraph, ShortestPaths};

/// Entry in Dijkstra's priority queue.
#[derive(Debug, Clone)]
struct DijkstraEntry {
    /// The vertex index.
    vertex: usize,
    /// Distance from source.
    distance: f64,
}

impl DijkstraEntry {
    fn new(vertex: usize, distance: f64) -> Self {
        Self { vertex, distance }
    }
}

// Implement ordering for min-heap (BinaryHeap is a max-heap by default)
impl PartialEq for DijkstraEntry {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance
    }
}

impl Eq for DijkstraEntry {}

impl PartialOrd for DijkstraEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DijkstraEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .distance
            .partial_cmp(&self.distance)
            .unwrap_or(Ordering::Equal)
    }
}

/// Run Dijkstra from `source`, stopping once `target` is settled.
///
/// An out-of-range source leaves every vertex unreachable.
pub(super) fn dijkstra(graph: &GeodesicGraph<'_>, source: usize, target: Option<usize>) -> ShortestPaths {
    let n = graph.num_vertices();
    let mut distances = vec![f64::INFINITY; n];
    let mut predecessors: Vec<Option<usize>> = vec![None; n];

    if source >= n {
        return ShortestPaths::new(distances, predecessors);
    }

    let mut heap = BinaryHeap::new();
    distances[source] = 0.0;
    heap.push(DijkstraEntry::new(source, 0.0));

    let mut settled = 0usize;
    while let Some(entry) = heap.pop() {
        let u = entry.vertex;
        let dist_u = entry.distance;

        // Stale entry: a shorter path was already found
        if dist_u > distances[u] {
            continue;
        }
        settled += 1;

        if target == Some(u) {
            break;
        }

        for &(v, weight) in graph.neighbors(u) {
            let new_dist = dist_u + weight;
            if new_dist < distances[v] {
                distances[v] = new_dist;
                predecessors[v] = Some(u);
                heap.push(DijkstraEntry::new(v, new_dist));
            }
        }
    }

    log::trace!("dijkstra from {} settled {} of {} vertices", source, settled, n);

    ShortestPaths::new(distances, predecessors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::TriangleMesh;

    fn single_triangle() -> TriangleMesh {
        TriangleMesh::from_arrays(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]],
            &[[0, 1, 2]],
        )
    }

    #[test]
    fn test_heap_pops_smallest_first() {
        let mut heap = BinaryHeap::new();
        heap.push(DijkstraEntry::new(0, 3.0));
        heap.push(DijkstraEntry::new(1, 1.0));
        heap.push(DijkstraEntry::new(2, 2.0));

        let order: Vec<usize> = std::iter::from_fn(|| heap.pop().map(|e| e.vertex)).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_single_triangle_distances() {
        let mesh = single_triangle();
        let graph = GeodesicGraph::from_mesh(&mesh);
        let result = dijkstra(&graph, 0, None);

        assert!((result.distance(0) - 0.0).abs() < 1e-10);
        assert!((result.distance(1) - 1.0).abs() < 1e-10);
        let expected = (0.5_f64.powi(2) + 1.0).sqrt();
        assert!((result.distance(2) - expected).abs() < 1e-10);
    }

    #[test]
    fn test_out_of_range_source() {
        let mesh = single_triangle();
        let graph = GeodesicGraph::from_mesh(&mesh);
        let result = dijkstra(&graph, 7, None);
        assert_eq!(result.reachable_count(), 0);
    }

    #[test]
    fn test_early_termination_settles_target() {
        // A path 0 - 1 - 2 - 3 along a strip of triangles
        let mesh = TriangleMesh::from_arrays(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [2.0, 0.0, 0.0],
                [3.0, 0.0, 0.0],
                [0.5, 5.0, 0.0],
            ],
            &[[0, 1, 4], [1, 2, 4], [2, 3, 4]],
        );
        let graph = GeodesicGraph::from_mesh(&mesh);
        let result = dijkstra(&graph, 0, Some(1));

        assert!((result.distance(1) - 1.0).abs() < 1e-10);
        assert_eq!(result.path_to(1), Some(vec![0, 1]));
        // Vertex 3 is two edges further and never relaxed
        assert!(!result.is_reachable(3));
    }
}

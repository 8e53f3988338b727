//! UV coordinate storage.
//!
//! This module provides the [`UvMap`] type for storing the 2D image of every
//! mesh vertex produced by the conformal solve.

use nalgebra::{Point2, Vector2};

use crate::mesh::geometry::triangle_area_2d;

/// UV coordinates for mesh vertices.
///
/// Index `i` holds the image of vertex `i`. Coordinates are in the same
/// length units as the input mesh unless [`UvMap::normalize`] was called.
///
/// # Example
///
/// ```
/// use pleat::algo::parameterize::UvMap;
/// use nalgebra::Point2;
///
/// let uv = UvMap::new(vec![
///     Point2::new(0.0, 0.0),
///     Point2::new(2.0, 0.0),
///     Point2::new(0.0, 1.0),
/// ]);
/// assert!((uv.total_area(&[[0, 1, 2]]) - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UvMap {
    coords: Vec<Point2<f64>>,
}

impl UvMap {
    /// Create a new UV map with the given coordinates.
    pub fn new(coords: Vec<Point2<f64>>) -> Self {
        Self { coords }
    }

    /// Create a UV map filled with zeros.
    pub fn zeros(n: usize) -> Self {
        Self {
            coords: vec![Point2::origin(); n],
        }
    }

    /// Get the UV coordinates for a vertex.
    #[inline]
    pub fn get(&self, v: usize) -> Point2<f64> {
        self.coords[v]
    }

    /// Set the UV coordinates for a vertex.
    #[inline]
    pub fn set(&mut self, v: usize, uv: Point2<f64>) {
        self.coords[v] = uv;
    }

    /// Get the number of UV coordinates.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Iterate over all UV coordinates with their vertex indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Point2<f64>)> + '_ {
        self.coords.iter().copied().enumerate()
    }

    /// Get the raw coordinates slice.
    pub fn as_slice(&self) -> &[Point2<f64>] {
        &self.coords
    }

    /// Consume the map, returning the coordinates.
    pub fn into_vec(self) -> Vec<Point2<f64>> {
        self.coords
    }

    /// Compute the bounding box of the UV coordinates.
    ///
    /// Returns `None` if the UV map is empty.
    pub fn bounding_box(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let first = *self.coords.first()?;
        Some(self.coords.iter().fold((first, first), |(min, max), uv| {
            (min.inf(uv), max.sup(uv))
        }))
    }

    /// Width and height of the bounding box; zero for an empty map.
    pub fn size(&self) -> Vector2<f64> {
        self.bounding_box()
            .map(|(min, max)| max - min)
            .unwrap_or_else(Vector2::zeros)
    }

    /// Normalize UV coordinates to fit within [0, 1] range.
    ///
    /// Maintains aspect ratio by scaling uniformly based on the larger dimension.
    pub fn normalize(&mut self) {
        if let Some((min, max)) = self.bounding_box() {
            let scale = (max.x - min.x).max(max.y - min.y);

            if scale > 1e-10 {
                for uv in &mut self.coords {
                    uv.x = (uv.x - min.x) / scale;
                    uv.y = (uv.y - min.y) / scale;
                }
            }
        }
    }

    /// Compute the total area in UV space.
    ///
    /// Triangles referencing a vertex outside the map are skipped.
    pub fn total_area(&self, triangles: &[[usize; 3]]) -> f64 {
        triangles
            .iter()
            .filter(|tri| tri.iter().all(|&v| v < self.coords.len()))
            .map(|tri| triangle_area_2d(&self.coords[tri[0]], &self.coords[tri[1]], &self.coords[tri[2]]))
            .sum()
    }
}

impl From<Vec<Point2<f64>>> for UvMap {
    fn from(coords: Vec<Point2<f64>>) -> Self {
        Self::new(coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uv_map_basic() {
        let mut uv_map = UvMap::zeros(3);
        uv_map.set(1, Point2::new(1.0, 0.0));

        assert_eq!(uv_map.len(), 3);
        assert_eq!(uv_map.get(0), Point2::origin());
        assert_eq!(uv_map.get(1), Point2::new(1.0, 0.0));
    }

    #[test]
    fn test_uv_map_bounding_box() {
        let uv_map = UvMap::new(vec![
            Point2::new(-1.0, 0.5),
            Point2::new(2.0, -0.5),
            Point2::new(0.5, 3.0),
        ]);

        let (min, max) = uv_map.bounding_box().unwrap();
        assert_eq!(min, Point2::new(-1.0, -0.5));
        assert_eq!(max, Point2::new(2.0, 3.0));
        assert_eq!(uv_map.size(), Vector2::new(3.0, 3.5));
        assert!(UvMap::default().bounding_box().is_none());
    }

    #[test]
    fn test_uv_map_normalize() {
        let mut uv_map = UvMap::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(2.0, 2.0),
        ]);
        uv_map.normalize();

        let (min, max) = uv_map.bounding_box().unwrap();
        assert!((min.x - 0.0).abs() < 1e-10);
        assert!((min.y - 0.0).abs() < 1e-10);
        // Max x should be 1.0 (since x range is larger)
        assert!((max.x - 1.0).abs() < 1e-10);
        // Max y should be 0.5 (maintains aspect ratio)
        assert!((max.y - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_uv_map_total_area() {
        let uv_map = UvMap::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ]);

        assert!((uv_map.total_area(&[[0, 1, 2]]) - 0.5).abs() < 1e-10);
        // Out-of-range triangle ignored
        assert!((uv_map.total_area(&[[0, 1, 2], [0, 1, 7]]) - 0.5).abs() < 1e-10);
    }
}

//! Triangle geometry helpers shared by the analysis and solver stages.

use nalgebra::{Point2, Point3, Vector3};

/// Area below which a triangle is considered degenerate.
pub const DEGENERATE_AREA: f64 = 1e-12;

/// Unnormalized normal of triangle (p0, p1, p2): `(p1 - p0) × (p2 - p0)`.
///
/// Its length is twice the triangle area.
#[inline]
pub fn triangle_cross(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> Vector3<f64> {
    (p1 - p0).cross(&(p2 - p0))
}

/// Area of a 3D triangle.
#[inline]
pub fn triangle_area(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> f64 {
    0.5 * triangle_cross(p0, p1, p2).norm()
}

/// Unsigned area of a 2D triangle.
#[inline]
pub fn triangle_area_2d(p0: &Point2<f64>, p1: &Point2<f64>, p2: &Point2<f64>) -> f64 {
    0.5 * ((p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y)).abs()
}

/// Compute the angle at vertex `a` in triangle (a, b, c).
///
/// Returns 0 when either edge has zero length.
pub fn triangle_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    vector_angle(&(b - a), &(c - a))
}

/// Angle at vertex `a` in the 2D triangle (a, b, c).
pub fn triangle_angle_2d(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    let ab = b - a;
    let ac = c - a;
    let (nab, nac) = (ab.norm(), ac.norm());
    if nab < 1e-15 || nac < 1e-15 {
        return 0.0;
    }
    (ab.dot(&ac) / (nab * nac)).clamp(-1.0, 1.0).acos()
}

/// Angle between two 3D vectors, in radians.
pub fn vector_angle(u: &Vector3<f64>, v: &Vector3<f64>) -> f64 {
    let (nu, nv) = (u.norm(), v.norm());
    if nu < 1e-15 || nv < 1e-15 {
        return 0.0;
    }
    (u.dot(v) / (nu * nv)).clamp(-1.0, 1.0).acos()
}

/// Canonical (sorted) key for the undirected edge (a, b).
#[inline]
pub fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

//! Fold-line classification of geodesic paths.

use std::f64::consts::PI;

use nalgebra::Point3;

use super::GeodesicPath;
use crate::mesh::geometry::vector_angle;

/// Maximum turning angle (radians) above which a path folds as a mountain.
const MOUNTAIN_TURN: f64 = 0.5;

/// Mean turning angle (radians) above which a path folds as a valley.
const VALLEY_TURN: f64 = 0.1;

/// Maximum turning angle (radians) above which a fold is high priority.
const HIGH_PRIORITY_TURN: f64 = 0.3;

/// Direction of a fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldKind {
    /// Sharp fold toward the viewer.
    Mountain,
    /// Gentle fold away from the viewer.
    Valley,
    /// Nearly straight; scored rather than folded.
    Score,
}

/// How a fold is drawn on the flat pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    /// Used for mountain folds.
    Dashed,
    /// Used for valley folds.
    Dotted,
    /// Used for score lines.
    Solid,
}

/// A fold line derived from a geodesic path.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldLine {
    /// First path vertex.
    pub start: usize,
    /// Last path vertex.
    pub end: usize,
    /// Position of `start`.
    pub start_point: Point3<f64>,
    /// Position of `end`.
    pub end_point: Point3<f64>,
    /// Vertex indices along the fold.
    pub path: Vec<usize>,
    /// Mean turning angle over interior path vertices, in radians.
    pub mean_turn: f64,
    /// Maximum turning angle over interior path vertices, in radians.
    pub max_turn: f64,
    /// Fold direction.
    pub kind: FoldKind,
    /// Drawing style matching `kind`.
    pub style: LineStyle,
    /// 1.0 for sharp folds, 0.5 otherwise.
    pub priority: f64,
}

/// Classify geodesic paths into fold lines.
///
/// Paths with fewer than two vertices are ignored. The turning angle at an
/// interior vertex is `π` minus the angle between the edges to its
/// neighbors, so a straight continuation turns by zero. The result is sorted
/// by descending priority, keeping input order among equal priorities.
pub fn fold_lines_from(paths: &[GeodesicPath]) -> Vec<FoldLine> {
    let mut folds: Vec<FoldLine> = paths
        .iter()
        .filter(|p| p.vertices.len() >= 2 && p.points.len() == p.vertices.len())
        .map(classify)
        .collect();

    // Stable: equal priorities keep path order
    folds.sort_by(|a, b| b.priority.total_cmp(&a.priority));
    folds
}

fn classify(path: &GeodesicPath) -> FoldLine {
    let turns: Vec<f64> = path
        .points
        .windows(3)
        .map(|w| PI - vector_angle(&(w[0] - w[1]), &(w[2] - w[1])))
        .collect();

    let (mean_turn, max_turn) = if turns.is_empty() {
        (0.0, 0.0)
    } else {
        let max = turns.iter().copied().fold(0.0, f64::max);
        (turns.iter().sum::<f64>() / turns.len() as f64, max)
    };

    let (kind, style) = if max_turn > MOUNTAIN_TURN {
        (FoldKind::Mountain, LineStyle::Dashed)
    } else if mean_turn > VALLEY_TURN {
        (FoldKind::Valley, LineStyle::Dotted)
    } else {
        (FoldKind::Score, LineStyle::Solid)
    };

    let priority = if max_turn > HIGH_PRIORITY_TURN { 1.0 } else { 0.5 };

    let last = path.vertices.len() - 1;
    FoldLine {
        start: path.vertices[0],
        end: path.vertices[last],
        start_point: path.points[0],
        end_point: path.points[last],
        path: path.vertices.clone(),
        mean_turn,
        max_turn,
        kind,
        style,
        priority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_through(points: &[[f64; 3]]) -> GeodesicPath {
        let points: Vec<Point3<f64>> = points.iter().map(|p| Point3::new(p[0], p[1], p[2])).collect();
        let length = points.windows(2).map(|w| (w[1] - w[0]).norm()).sum();
        GeodesicPath {
            vertices: (0..points.len()).collect(),
            length,
            points,
        }
    }

    #[test]
    fn test_straight_path_is_score() {
        let path = path_through(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        let folds = fold_lines_from(&[path]);

        assert_eq!(folds.len(), 1);
        assert!(folds[0].max_turn.abs() < 1e-12);
        assert_eq!(folds[0].kind, FoldKind::Score);
        assert_eq!(folds[0].style, LineStyle::Solid);
        assert_eq!(folds[0].priority, 0.5);
    }

    #[test]
    fn test_right_angle_is_mountain() {
        let path = path_through(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]]);
        let fold = &fold_lines_from(&[path])[0];

        assert!((fold.max_turn - PI / 2.0).abs() < 1e-12);
        assert_eq!(fold.kind, FoldKind::Mountain);
        assert_eq!(fold.style, LineStyle::Dashed);
        assert_eq!(fold.priority, 1.0);
        assert_eq!((fold.start, fold.end), (0, 2));
    }

    #[test]
    fn test_gentle_turn_is_valley() {
        // Turn of 0.2 rad at the middle vertex
        let turn: f64 = 0.2;
        let path = path_through(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0 + turn.cos(), turn.sin(), 0.0],
        ]);
        let fold = &fold_lines_from(&[path])[0];

        assert!((fold.mean_turn - turn).abs() < 1e-9);
        assert_eq!(fold.kind, FoldKind::Valley);
        assert_eq!(fold.style, LineStyle::Dotted);
        assert_eq!(fold.priority, 0.5);
    }

    #[test]
    fn test_two_vertex_path_and_short_paths() {
        let edge = path_through(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let single = path_through(&[[0.0, 0.0, 0.0]]);
        let folds = fold_lines_from(&[edge, single]);

        assert_eq!(folds.len(), 1);
        assert_eq!(folds[0].kind, FoldKind::Score);
        assert_eq!(folds[0].mean_turn, 0.0);
    }

    #[test]
    fn test_sorted_by_priority_stably() {
        let low_a = path_through(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let high = path_through(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]]);
        let mut low_b = path_through(&[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        low_b.vertices = vec![7, 8];

        let folds = fold_lines_from(&[low_a, high, low_b]);
        assert_eq!(folds[0].priority, 1.0);
        assert_eq!(folds[1].start, 0);
        assert_eq!(folds[2].start, 7);
    }
}

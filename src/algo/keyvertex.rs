//! Key vertex selection.
//!
//! Picks the small set of vertices that anchor the fold-line network: the
//! most strongly bent vertices, boundary corners, and an even sample of the
//! boundary so that fold lines can reach the pattern outline.

use std::cmp::Ordering;

use crate::mesh::TriangleMesh;

/// Options for [`select_key_vertices`].
#[derive(Debug, Clone)]
pub struct KeyVertexOptions {
    /// Percentile (0..=1) of curvature above which a boundary vertex is a corner.
    pub corner_percentile: f64,
    /// Number of highest-curvature vertices always included.
    pub max_high_curvature: usize,
    /// Approximate number of boundary vertices sampled.
    pub boundary_samples: usize,
    /// Cap on the size of the final set.
    pub max_key_vertices: usize,
}

impl Default for KeyVertexOptions {
    fn default() -> Self {
        Self {
            corner_percentile: 0.9,
            max_high_curvature: 10,
            boundary_samples: 4,
            max_key_vertices: 20,
        }
    }
}

impl KeyVertexOptions {
    /// Set the cap on the final set size.
    pub fn with_max_key_vertices(mut self, max: usize) -> Self {
        self.max_key_vertices = max;
        self
    }

    /// Set the number of high-curvature vertices always included.
    pub fn with_max_high_curvature(mut self, count: usize) -> Self {
        self.max_high_curvature = count;
        self
    }
}

/// Selected key vertices.
#[derive(Debug, Clone, Default)]
pub struct KeyVertexSet {
    /// Sorted, deduplicated vertex indices.
    pub vertices: Vec<usize>,
    /// Boundary vertices whose curvature exceeds `threshold` (sorted).
    pub corners: Vec<usize>,
    /// Curvature percentile used for corner detection.
    pub threshold: f64,
}

impl KeyVertexSet {
    /// Number of selected vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Whether `v` was selected.
    pub fn contains(&self, v: usize) -> bool {
        self.vertices.binary_search(&v).is_ok()
    }
}

/// Select key vertices from per-vertex curvature values.
///
/// `curvature` must hold one value per mesh vertex; missing entries count
/// as zero.
///
/// # Example
///
/// ```
/// use pleat::mesh::synthetic_grid_mesh;
/// use pleat::algo::curvature::{analyze_curvature, CurvatureOptions};
/// use pleat::algo::keyvertex::{select_key_vertices, KeyVertexOptions};
///
/// let mesh = synthetic_grid_mesh(6, 6).unwrap();
/// let analysis = analyze_curvature(&mesh, &CurvatureOptions::default());
/// let keys = select_key_vertices(&mesh, &analysis.curvature, &KeyVertexOptions::default());
/// assert!(keys.len() <= 20);
/// ```
pub fn select_key_vertices(
    mesh: &TriangleMesh,
    curvature: &[f64],
    options: &KeyVertexOptions,
) -> KeyVertexSet {
    let n = mesh.num_vertices();
    if n == 0 {
        return KeyVertexSet::default();
    }

    let score = |v: usize| curvature.get(v).copied().unwrap_or(0.0);
    let scores: Vec<f64> = (0..n).map(score).collect();
    let threshold = percentile(&scores, options.corner_percentile);

    // Highest curvature first, lower index wins ties
    let mut ranked: Vec<usize> = (0..n).collect();
    ranked.sort_by(|&a, &b| by_score_desc(&scores, a, b));

    let boundary = mesh.boundary_vertices();
    let corners: Vec<usize> = boundary
        .iter()
        .copied()
        .filter(|&v| scores[v] > threshold)
        .collect();

    let stride = (boundary.len() / options.boundary_samples.max(1)).max(1);

    let mut selected: Vec<usize> = ranked
        .iter()
        .take(options.max_high_curvature)
        .copied()
        .collect();
    selected.extend_from_slice(&corners);
    selected.extend(boundary.iter().step_by(stride).copied());

    selected.sort_unstable();
    selected.dedup();

    if selected.len() > options.max_key_vertices {
        selected.sort_by(|&a, &b| by_score_desc(&scores, a, b));
        selected.truncate(options.max_key_vertices);
        selected.sort_unstable();
    }

    log::debug!(
        "selected {} key vertices ({} corners, threshold {:.4})",
        selected.len(),
        corners.len(),
        threshold
    );

    KeyVertexSet {
        vertices: selected,
        corners,
        threshold,
    }
}

fn by_score_desc(scores: &[f64], a: usize, b: usize) -> Ordering {
    scores[b]
        .partial_cmp(&scores[a])
        .unwrap_or(Ordering::Equal)
        .then(a.cmp(&b))
}

/// Percentile with linear interpolation between order statistics.
///
/// `q` is clamped to [0, 1]. Returns 0 for an empty slice.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

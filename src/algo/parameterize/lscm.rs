//! Least Squares Conformal Maps (LSCM) system assembly and solve.
//!
//! LSCM computes a conformal (angle-preserving) parameterization of a triangle
//! mesh with boundary. Each triangle contributes the discrete Cauchy-Riemann
//! equation `Σ Wj · Uj = 0`, where `Uj` is the complex image of corner `j` and
//! `Wj` the complex coefficient built from the triangle's local 2D frame. The
//! stacked equations are solved in the least-squares sense.
//!
//! # References
//!
//! - Lévy, B., Petitjean, S., Ray, N., & Maillot, J. (2002). "Least squares
//!   conformal maps for automatic texture atlas generation." ACM SIGGRAPH.

use std::collections::HashSet;
use std::fmt;

use nalgebra::{DVector, Point2, Point3};
use rayon::prelude::*;

use crate::error::{MeshError, Result};
use crate::mesh::geometry::{triangle_cross, DEGENERATE_AREA};
use crate::mesh::{EdgeIncidence, TriangleMesh};

use super::sparse::{cholesky_solve, conjugate_gradient, symmetric_condition_number, CsrMatrix};
use super::uv::UvMap;

/// Unknown count below which the condition number is computed.
const CONDITION_NUMBER_LIMIT: usize = 1000;

/// Candidate count above which the farthest pair is approximated.
const EXACT_FARTHEST_PAIR_LIMIT: usize = 2048;

/// Column layout of the conformal system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SystemLayout {
    /// One scalar unknown per vertex.
    ///
    /// Rows hold the real and imaginary parts of each coefficient at the
    /// vertex column. The `V` solved scalars are read back as consecutive
    /// `(u, v)` pairs, giving `⌈V/2⌉` pairs followed by zero padding.
    SingleUnknown,
    /// Interleaved `(u, v)` unknowns per vertex (columns `2j` and `2j + 1`).
    #[default]
    Conformal,
}

impl SystemLayout {
    /// Number of unknowns for `num_vertices` vertices.
    #[inline]
    pub fn num_unknowns(self, num_vertices: usize) -> usize {
        match self {
            SystemLayout::SingleUnknown => num_vertices,
            SystemLayout::Conformal => 2 * num_vertices,
        }
    }
}

impl fmt::Display for SystemLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemLayout::SingleUnknown => f.write_str("single-unknown"),
            SystemLayout::Conformal => f.write_str("conformal"),
        }
    }
}

/// How the solve is anchored when few boundary constraints are supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchoring {
    /// Add pins until two vertices are fixed.
    ///
    /// With no constraints the two farthest boundary vertices are pinned at
    /// `(0, 0)` and `(d, 0)`, `d` being their 3D distance. With one
    /// constraint the vertex farthest from it is pinned at distance `d`
    /// along +u from the given pin.
    #[default]
    AutoPin,
    /// Fail with [`MeshError::MissingConstraints`] when none are supplied.
    RequireConstraints,
    /// Solve exactly as given; zero constraints yield the trivial map.
    Unanchored,
}

/// Linear solver for the regularized normal equations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinearSolver {
    /// Sparse Cholesky factorization.
    #[default]
    Cholesky,
    /// Conjugate gradient iteration.
    ConjugateGradient,
}

impl fmt::Display for LinearSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinearSolver::Cholesky => f.write_str("cholesky"),
            LinearSolver::ConjugateGradient => f.write_str("conjugate-gradient"),
        }
    }
}

/// Options for the LSCM solver.
#[derive(Debug, Clone)]
pub struct LscmOptions {
    /// Column layout of the system.
    pub layout: SystemLayout,

    /// Anchoring policy for under-constrained solves.
    pub anchoring: Anchoring,

    /// Linear solver.
    pub solver: LinearSolver,

    /// Scale of the rows pinning constrained vertices.
    pub pin_weight: f64,

    /// Diagonal regularization added to the normal matrix.
    pub regularization: f64,

    /// Maximum iterations for the conjugate gradient solver.
    pub max_iterations: usize,

    /// Convergence tolerance for the CG solver.
    pub tolerance: f64,

    /// Assemble per-triangle blocks in parallel.
    pub parallel: bool,
}

impl Default for LscmOptions {
    fn default() -> Self {
        Self {
            layout: SystemLayout::default(),
            anchoring: Anchoring::default(),
            solver: LinearSolver::default(),
            pin_weight: 1e3,
            regularization: 1e-8,
            max_iterations: 10_000,
            tolerance: 1e-10,
            parallel: true,
        }
    }
}

impl LscmOptions {
    /// Set the system layout.
    pub fn with_layout(mut self, layout: SystemLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the anchoring policy.
    pub fn with_anchoring(mut self, anchoring: Anchoring) -> Self {
        self.anchoring = anchoring;
        self
    }

    /// Set the linear solver.
    pub fn with_solver(mut self, solver: LinearSolver) -> Self {
        self.solver = solver;
        self
    }

    /// Set the pin row weight.
    pub fn with_pin_weight(mut self, weight: f64) -> Self {
        self.pin_weight = weight;
        self
    }

    /// Set the maximum CG iterations.
    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Set the CG convergence tolerance.
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Enable or disable parallel assembly.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// A vertex pinned to a specific UV coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryConstraint {
    /// The vertex index to pin.
    pub vertex: usize,
    /// The fixed U coordinate.
    pub u: f64,
    /// The fixed V coordinate.
    pub v: f64,
}

impl BoundaryConstraint {
    /// Create a new boundary constraint.
    pub fn new(vertex: usize, u: f64, v: f64) -> Self {
        Self { vertex, u, v }
    }
}

/// Assembled least-squares system `A x ≈ b`.
#[derive(Debug, Clone)]
pub struct ConformalSystem {
    /// Coefficient matrix.
    pub matrix: CsrMatrix,
    /// Right-hand side, one entry per row.
    pub rhs: DVector<f64>,
    /// Column layout.
    pub layout: SystemLayout,
    /// Number of mesh vertices the system was built for.
    pub num_vertices: usize,
    /// Number of triangles that contributed rows.
    pub num_triangles: usize,
    /// Number of constraint row pairs appended.
    pub num_constraints: usize,
}

impl ConformalSystem {
    /// Number of rows.
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of unknowns.
    #[inline]
    pub fn num_unknowns(&self) -> usize {
        self.matrix.ncols()
    }

    /// Append rows given as `(row offset, col, value)` triplets and their
    /// right-hand side values.
    pub fn append_rows(&mut self, triplets: Vec<(usize, usize, f64)>, rhs: &[f64]) {
        let base = self.num_rows();
        let mut all: Vec<(usize, usize, f64)> = self.matrix.triplets().collect();
        all.extend(triplets.into_iter().map(|(r, c, v)| (base + r, c, v)));

        self.matrix = CsrMatrix::from_triplets(base + rhs.len(), self.num_unknowns(), all);
        self.rhs = DVector::from_iterator(
            base + rhs.len(),
            self.rhs.iter().copied().chain(rhs.iter().copied()),
        );
    }
}

/// Result of a conformal solve.
#[derive(Debug, Clone)]
pub struct UvSolution {
    /// One UV coordinate per mesh vertex.
    pub uv: UvMap,
    /// `‖Ax − b‖` of the solved system.
    pub residual: f64,
    /// Condition number of the regularized normal matrix, for small systems.
    pub condition_number: Option<f64>,
    /// Solver that produced the solution.
    pub solver: LinearSolver,
}

/// Conformal map solver over a validated triangle set.
///
/// Construction checks coordinates and filters triangles; the solve then
/// runs in three steps so callers can inspect or extend the system:
///
/// ```
/// use pleat::mesh::TriangleMesh;
/// use pleat::algo::parameterize::{BoundaryConstraint, LscmOptions, LscmSolver};
///
/// let mesh = TriangleMesh::from_arrays(
///     &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
///     &[[0, 1, 2], [0, 2, 3]],
/// );
/// let solver = LscmSolver::new(&mesh, LscmOptions::default()).unwrap();
/// let mut system = solver.build_conformal_system().unwrap();
/// solver
///     .apply_boundary_constraints(&mut system, &[BoundaryConstraint::new(0, 0.0, 0.0)])
///     .unwrap();
/// let solution = solver.solve(&system).unwrap();
/// assert_eq!(solution.uv.len(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct LscmSolver<'a> {
    mesh: &'a TriangleMesh,
    triangles: Vec<[usize; 3]>,
    options: LscmOptions,
}

impl<'a> LscmSolver<'a> {
    /// Prepare a solver for `mesh`.
    ///
    /// Triangles with out-of-range indices and repeated triangles (same
    /// vertex set) are dropped.
    ///
    /// # Errors
    ///
    /// - [`MeshError::EmptyMesh`] if the mesh has no triangles.
    /// - [`MeshError::NonFiniteCoordinate`] if a vertex is NaN or infinite.
    /// - [`MeshError::NoValidTriangles`] if no triangle remains.
    pub fn new(mesh: &'a TriangleMesh, options: LscmOptions) -> Result<Self> {
        if mesh.num_triangles() == 0 {
            return Err(MeshError::EmptyMesh);
        }
        if let Some(vertex) = mesh
            .vertices()
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
        {
            return Err(MeshError::NonFiniteCoordinate { vertex });
        }

        let mut seen: HashSet<[usize; 3]> = HashSet::with_capacity(mesh.num_triangles());
        let triangles: Vec<[usize; 3]> = mesh
            .triangles()
            .iter()
            .enumerate()
            .filter(|&(t, _)| mesh.triangle_in_range(t))
            .map(|(_, tri)| *tri)
            .filter(|tri| {
                let mut key = *tri;
                key.sort_unstable();
                seen.insert(key)
            })
            .collect();

        let rejected = mesh.num_triangles() - triangles.len();
        if rejected > 0 {
            log::debug!("dropped {} out-of-range or duplicate triangle(s)", rejected);
        }
        if triangles.is_empty() {
            return Err(MeshError::NoValidTriangles { rejected });
        }

        Ok(Self {
            mesh,
            triangles,
            options,
        })
    }

    /// The triangles kept for assembly.
    #[inline]
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// The solver options.
    #[inline]
    pub fn options(&self) -> &LscmOptions {
        &self.options
    }

    /// Assemble two conformality rows per non-degenerate triangle.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::EmptySystem`] if every triangle is degenerate.
    pub fn build_conformal_system(&self) -> Result<ConformalSystem> {
        let vertices = self.mesh.vertices();
        let block = |tri: &[usize; 3]| triangle_coefficients(vertices, tri);

        let blocks: Vec<Option<[(f64, f64); 3]>> = if self.options.parallel {
            self.triangles.par_iter().map(block).collect()
        } else {
            self.triangles.iter().map(block).collect()
        };

        let layout = self.options.layout;
        let n = self.mesh.num_vertices();
        let mut triplets: Vec<(usize, usize, f64)> = Vec::with_capacity(12 * blocks.len());
        let mut num_triangles = 0usize;

        for (tri, coeffs) in self.triangles.iter().zip(&blocks) {
            let Some(coeffs) = coeffs else { continue };
            let (re_row, im_row) = (2 * num_triangles, 2 * num_triangles + 1);

            for (&j, &(re, im)) in tri.iter().zip(coeffs.iter()) {
                match layout {
                    SystemLayout::SingleUnknown => {
                        triplets.push((re_row, j, re));
                        triplets.push((im_row, j, im));
                    }
                    SystemLayout::Conformal => {
                        let (u, v) = (2 * j, 2 * j + 1);
                        triplets.push((re_row, u, re));
                        triplets.push((re_row, v, -im));
                        triplets.push((im_row, u, im));
                        triplets.push((im_row, v, re));
                    }
                }
            }
            num_triangles += 1;
        }

        let skipped = self.triangles.len() - num_triangles;
        if skipped > 0 {
            log::debug!("excluded {} degenerate triangle(s) from assembly", skipped);
        }
        if num_triangles == 0 {
            return Err(MeshError::EmptySystem);
        }

        let rows = 2 * num_triangles;
        Ok(ConformalSystem {
            matrix: CsrMatrix::from_triplets(rows, layout.num_unknowns(n), triplets),
            rhs: DVector::zeros(rows),
            layout,
            num_vertices: n,
            num_triangles,
            num_constraints: 0,
        })
    }

    /// Append two pin rows per constraint, adding anchor pins according to
    /// [`LscmOptions::anchoring`].
    ///
    /// Returns the pins added automatically (empty unless anchoring is
    /// [`Anchoring::AutoPin`] and fewer than two constraints were given).
    ///
    /// # Errors
    ///
    /// - [`MeshError::InvalidConstraint`] if a constraint vertex is out of range.
    /// - [`MeshError::MissingConstraints`] under
    ///   [`Anchoring::RequireConstraints`] with no constraints.
    pub fn apply_boundary_constraints(
        &self,
        system: &mut ConformalSystem,
        constraints: &[BoundaryConstraint],
    ) -> Result<Vec<BoundaryConstraint>> {
        let n = self.mesh.num_vertices();
        if let Some(bad) = constraints.iter().find(|c| c.vertex >= n) {
            return Err(MeshError::InvalidConstraint {
                vertex: bad.vertex,
                num_vertices: n,
            });
        }

        let auto_pins = match self.options.anchoring {
            Anchoring::AutoPin => self.anchor_pins(constraints),
            Anchoring::RequireConstraints if constraints.is_empty() => {
                return Err(MeshError::MissingConstraints);
            }
            Anchoring::RequireConstraints => Vec::new(),
            Anchoring::Unanchored => {
                if constraints.is_empty() {
                    log::warn!("solving without boundary constraints; the result is the trivial map");
                }
                Vec::new()
            }
        };

        let w = self.options.pin_weight;
        let mut triplets = Vec::new();
        let mut rhs = Vec::new();
        for (k, pin) in constraints.iter().chain(&auto_pins).enumerate() {
            let (u_col, v_col) = match system.layout {
                SystemLayout::SingleUnknown => (pin.vertex, pin.vertex),
                SystemLayout::Conformal => (2 * pin.vertex, 2 * pin.vertex + 1),
            };
            triplets.push((2 * k, u_col, w));
            triplets.push((2 * k + 1, v_col, w));
            rhs.push(w * pin.u);
            rhs.push(w * pin.v);
        }

        if !rhs.is_empty() {
            system.append_rows(triplets, &rhs);
            system.num_constraints += rhs.len() / 2;
        }
        Ok(auto_pins)
    }

    /// Solve the regularized normal equations and read back one UV pair per
    /// vertex.
    ///
    /// # Errors
    ///
    /// - [`MeshError::TooFewElements`] with fewer than 3 vertices.
    /// - [`MeshError::EmptySystem`] if the system has no rows.
    /// - [`MeshError::SolverFailed`] or [`MeshError::ConvergenceFailed`] if
    ///   the linear solve fails.
    pub fn solve(&self, system: &ConformalSystem) -> Result<UvSolution> {
        let n = self.mesh.num_vertices();
        if n < 3 || self.triangles.is_empty() {
            return Err(MeshError::TooFewElements {
                vertices: n,
                triangles: self.triangles.len(),
            });
        }
        if system.num_rows() == 0 || system.matrix.nnz() == 0 {
            return Err(MeshError::EmptySystem);
        }

        let a = &system.matrix;
        let normal = a.normal_matrix(self.options.regularization);
        let atb = a.transpose_mul_vec(&system.rhs);

        let (x, solver) = match self.options.solver {
            LinearSolver::Cholesky => match cholesky_solve(&normal, &atb) {
                Ok(x) => (x, LinearSolver::Cholesky),
                Err(err) => {
                    log::warn!("{}; falling back to conjugate gradient", err);
                    let x = self.conjugate_gradient(&normal, &atb).map_err(|cg_err| {
                        MeshError::SolverFailed(format!("{}; fallback: {}", err, cg_err))
                    })?;
                    (x, LinearSolver::ConjugateGradient)
                }
            },
            LinearSolver::ConjugateGradient => {
                (self.conjugate_gradient(&normal, &atb)?, LinearSolver::ConjugateGradient)
            }
        };

        if x.iter().any(|v| !v.is_finite()) {
            return Err(MeshError::SolverFailed("solution is not finite".to_string()));
        }

        let residual = (a.mul_vec(&x) - &system.rhs).norm();
        let condition_number = if system.num_unknowns() < CONDITION_NUMBER_LIMIT {
            symmetric_condition_number(&normal)
        } else {
            None
        };

        log::trace!(
            "{} solve: {} rows, {} unknowns, residual {:.3e}",
            solver,
            system.num_rows(),
            system.num_unknowns(),
            residual
        );

        Ok(UvSolution {
            uv: reshape_solution(x.as_slice(), system.layout, n),
            residual,
            condition_number,
            solver,
        })
    }

    fn conjugate_gradient(&self, a: &CsrMatrix, b: &DVector<f64>) -> Result<DVector<f64>> {
        conjugate_gradient(a, b, None, self.options.max_iterations, self.options.tolerance)
    }

    /// Pins that bring the constraint set up to two vertices.
    fn anchor_pins(&self, constraints: &[BoundaryConstraint]) -> Vec<BoundaryConstraint> {
        if constraints.len() >= 2 {
            return Vec::new();
        }

        let vertices = self.mesh.vertices();
        let candidates = self.anchor_candidates();

        let pins = match constraints.first() {
            None => farthest_pair(vertices, &candidates)
                .map(|(a, b)| {
                    let d = pin_distance(&vertices[a], &vertices[b]);
                    vec![BoundaryConstraint::new(a, 0.0, 0.0), BoundaryConstraint::new(b, d, 0.0)]
                })
                .unwrap_or_default(),
            Some(given) => farthest_from(vertices, &candidates, given.vertex)
                .map(|b| {
                    let d = pin_distance(&vertices[given.vertex], &vertices[b]);
                    vec![BoundaryConstraint::new(b, given.u + d, given.v)]
                })
                .unwrap_or_default(),
        };

        for pin in &pins {
            log::debug!("auto-pinned vertex {} at ({:.6}, {:.6})", pin.vertex, pin.u, pin.v);
        }
        pins
    }

    /// Boundary vertices of the kept triangles, or every vertex they use
    /// when the surface is closed.
    fn anchor_candidates(&self) -> Vec<usize> {
        let mut incidence = EdgeIncidence::default();
        for tri in &self.triangles {
            incidence.add_triangle(tri);
        }
        let boundary = incidence.boundary_vertices(self.mesh.num_vertices());
        if !boundary.is_empty() {
            return boundary;
        }

        let mut used: Vec<usize> = self.triangles.iter().flatten().copied().collect();
        used.sort_unstable();
        used.dedup();
        used
    }
}

/// Complex conformality coefficients `(Re Wj, Im Wj)` of a triangle, or
/// `None` when it is degenerate.
fn triangle_coefficients(vertices: &[Point3<f64>], tri: &[usize; 3]) -> Option<[(f64, f64); 3]> {
    let (p0, p1, p2) = (&vertices[tri[0]], &vertices[tri[1]], &vertices[tri[2]]);
    let cross = triangle_cross(p0, p1, p2);
    let area = 0.5 * cross.norm();
    if area < DEGENERATE_AREA {
        return None;
    }

    // Local frame: u along p1 - p0, v = n × u
    let e1 = p1 - p0;
    let e2 = p2 - p0;
    let u_axis = e1.normalize();
    let v_axis = cross.normalize().cross(&u_axis);

    let q0 = Point2::origin();
    let q1 = Point2::new(e1.norm(), 0.0);
    let q2 = Point2::new(e2.dot(&u_axis), e2.dot(&v_axis));

    let inv_2a = 1.0 / (2.0 * area);
    let w = |a: &Point2<f64>, b: &Point2<f64>| ((a.x - b.x) * inv_2a, (a.y - b.y) * inv_2a);
    Some([w(&q2, &q1), w(&q0, &q2), w(&q1, &q0)])
}

/// Turn the solution vector into exactly `n` UV pairs.
fn reshape_solution(x: &[f64], layout: SystemLayout, n: usize) -> UvMap {
    let mut coords: Vec<Point2<f64>> = x
        .chunks(2)
        .map(|pair| Point2::new(pair[0], pair.get(1).copied().unwrap_or(0.0)))
        .take(n)
        .collect();

    if layout == SystemLayout::SingleUnknown && coords.len() < n {
        log::debug!(
            "single-unknown layout: padding {} solved pairs to {} vertices",
            coords.len(),
            n
        );
    }
    coords.resize(n, Point2::origin());
    UvMap::new(coords)
}

/// Distance used to place the second anchor; 1 when the points coincide.
fn pin_distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    let d = (b - a).norm();
    if d > 1e-12 {
        d
    } else {
        1.0
    }
}

/// The candidate farthest from `from`, excluding `from` itself.
fn farthest_from(vertices: &[Point3<f64>], candidates: &[usize], from: usize) -> Option<usize> {
    let origin = &vertices[from];
    let mut best: Option<(usize, f64)> = None;
    for &c in candidates {
        if c == from {
            continue;
        }
        let d = (vertices[c] - origin).norm_squared();
        if best.map_or(true, |(_, bd)| d > bd) {
            best = Some((c, d));
        }
    }
    best.map(|(c, _)| c)
}

/// The farthest pair among `candidates`.
///
/// Exact for small sets; larger sets use a double sweep from the first
/// candidate.
fn farthest_pair(vertices: &[Point3<f64>], candidates: &[usize]) -> Option<(usize, usize)> {
    if candidates.len() < 2 {
        return None;
    }

    if candidates.len() > EXACT_FARTHEST_PAIR_LIMIT {
        let a = farthest_from(vertices, candidates, candidates[0])?;
        let b = farthest_from(vertices, candidates, a)?;
        return Some((a.min(b), a.max(b)));
    }

    let mut max_dist = -1.0;
    let mut best_pair = (candidates[0], candidates[1]);
    for (i, &v0) in candidates.iter().enumerate() {
        for &v1 in &candidates[i + 1..] {
            let dist = (vertices[v1] - vertices[v0]).norm_squared();
            if dist > max_dist {
                max_dist = dist;
                best_pair = (v0, v1);
            }
        }
    }
    Some(best_pair)
}

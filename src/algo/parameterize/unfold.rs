//! End-to-end unfolding of a 3D surface into a flat pattern.

use nalgebra::{Point2, Vector2};

use super::distortion::{compute_distortion_with, DistortionMetrics};
use super::lscm::{BoundaryConstraint, LinearSolver, LscmOptions, LscmSolver, SystemLayout};
use super::manufacturing::{apply_manufacturing_constraints, AdjusterRegistry, ManufacturingConstraints};
use super::uv::UvMap;
use crate::algo::validate::{validate, ValidationStatus};
use crate::error::{MeshError, Result};
use crate::mesh::TriangleMesh;

/// Options for [`unfold`].
#[derive(Debug, Clone)]
pub struct UnfoldOptions {
    /// Options for the conformal solve.
    pub lscm: LscmOptions,
    /// Largest acceptable mean relative edge length distortion.
    pub tolerance: f64,
    /// Largest acceptable corner angle distortion, in degrees.
    pub max_angle_distortion: f64,
    /// Largest acceptable area distortion `|ratio − 1|`.
    pub max_area_distortion: f64,
    /// Fraction added to each side of the pattern for the material size.
    pub material_margin: f64,
    /// Adjusters for manufacturing constraints.
    pub adjusters: AdjusterRegistry,
}

impl Default for UnfoldOptions {
    fn default() -> Self {
        Self {
            lscm: LscmOptions::default(),
            tolerance: 0.001,
            max_angle_distortion: 5.0,
            max_area_distortion: 1.2,
            material_margin: 0.1,
            adjusters: AdjusterRegistry::default(),
        }
    }
}

impl UnfoldOptions {
    /// Set the LSCM options.
    pub fn with_lscm(mut self, lscm: LscmOptions) -> Self {
        self.lscm = lscm;
        self
    }

    /// Set the edge distortion tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the manufacturing adjuster registry.
    pub fn with_adjusters(mut self, adjusters: AdjusterRegistry) -> Self {
        self.adjusters = adjusters;
        self
    }
}

/// Diagnostics of the linear solve.
#[derive(Debug, Clone)]
pub struct SolutionInfo {
    /// `‖Ax − b‖`.
    pub residual: f64,
    /// Condition number of the normal matrix, for small systems.
    pub condition_number: Option<f64>,
    /// Constraints supplied by the caller.
    pub num_constraints: usize,
    /// Pins added by anchoring.
    pub auto_pins: Vec<BoundaryConstraint>,
    /// Rows of the final system.
    pub num_rows: usize,
    /// Unknowns of the final system.
    pub num_unknowns: usize,
    /// Column layout used.
    pub layout: SystemLayout,
    /// Solver that produced the solution.
    pub solver: LinearSolver,
}

/// Manufacturing summary of the pattern.
#[derive(Debug, Clone)]
pub struct ManufacturingData {
    /// Pattern size enlarged by the material margin.
    pub material_size: Vector2<f64>,
    /// All distortion thresholds are met.
    pub distortion_acceptable: bool,
    /// Manufacturing constraints handled by an adjuster.
    pub applied_constraints: Vec<String>,
    /// Manufacturing constraints with no adjuster.
    pub unsupported_constraints: Vec<String>,
}

/// Result of a successful [`unfold`].
#[derive(Debug, Clone)]
pub struct UnfoldReport {
    /// One UV coordinate per vertex.
    pub uv: UvMap,
    /// Triangles of the input mesh, unchanged.
    pub triangles: Vec<[usize; 3]>,
    /// Lower and upper corners of the pattern.
    pub pattern_bounds: (Point2<f64>, Point2<f64>),
    /// Width and height of the pattern.
    pub pattern_size: Vector2<f64>,
    /// Distortion relative to the 3D surface.
    pub distortion: DistortionMetrics,
    /// Solve diagnostics.
    pub solution: SolutionInfo,
    /// Manufacturing summary.
    pub manufacturing: ManufacturingData,
    /// Non-fatal findings, in pipeline order.
    pub warnings: Vec<String>,
}

impl UnfoldReport {
    /// Always true: failures are returned as errors instead.
    pub fn success(&self) -> bool {
        true
    }
}

/// Flatten `mesh` into a UV pattern.
///
/// Runs validation, system assembly, boundary and manufacturing constraints,
/// the solve and the distortion analysis, then judges manufacturability.
///
/// # Errors
///
/// - [`MeshError::InvalidParameter`] if `options.tolerance` is not positive.
/// - [`MeshError::InvalidMesh`] if validation reports an error.
/// - Any construction or numerical error of [`LscmSolver`].
///
/// # Example
///
/// ```
/// use pleat::mesh::TriangleMesh;
/// use pleat::algo::parameterize::{unfold, ManufacturingConstraints, UnfoldOptions};
///
/// let mesh = TriangleMesh::from_arrays(
///     &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
///     &[[0, 1, 2], [0, 2, 3]],
/// );
/// let report = unfold(&mesh, &[], &ManufacturingConstraints::new(), &UnfoldOptions::default()).unwrap();
/// assert!(report.success());
/// assert_eq!(report.uv.len(), 4);
/// ```
pub fn unfold(
    mesh: &TriangleMesh,
    constraints: &[BoundaryConstraint],
    manufacturing: &ManufacturingConstraints,
    options: &UnfoldOptions,
) -> Result<UnfoldReport> {
    if !(options.tolerance > 0.0) {
        return Err(MeshError::invalid_param("tolerance", options.tolerance, "must be positive"));
    }

    let report = validate(mesh);
    if report.status == ValidationStatus::Error {
        return Err(MeshError::InvalidMesh(
            report.error.unwrap_or_else(|| "validation failed".to_string()),
        ));
    }
    let mut warnings = report.warnings;

    let solver = LscmSolver::new(mesh, options.lscm.clone())?;
    let mut system = solver.build_conformal_system()?;

    let auto_pins = solver.apply_boundary_constraints(&mut system, constraints)?;
    if !auto_pins.is_empty() {
        let pins: Vec<String> = auto_pins
            .iter()
            .map(|p| format!("{} at ({:.4}, {:.4})", p.vertex, p.u, p.v))
            .collect();
        warnings.push(format!(
            "{} boundary constraint(s) supplied; auto-pinned vertex {}",
            constraints.len(),
            pins.join(" and ")
        ));
    } else if constraints.is_empty() {
        warnings.push("no boundary constraints; the solution is the trivial map".to_string());
    }

    let outcome = apply_manufacturing_constraints(&mut system, manufacturing, &options.adjusters)?;
    if !outcome.unsupported.is_empty() {
        warnings.push(format!(
            "unsupported manufacturing constraint(s) ignored: {}",
            outcome.unsupported.join(", ")
        ));
    }

    let solution = solver.solve(&system)?;
    let distortion = compute_distortion_with(mesh, solution.uv.as_slice(), options.lscm.parallel);

    let pattern_bounds = solution
        .uv
        .bounding_box()
        .unwrap_or((Point2::origin(), Point2::origin()));
    let pattern_size = pattern_bounds.1 - pattern_bounds.0;

    let angle_ok = distortion.max_angle_distortion() < options.max_angle_distortion;
    let edge_ok = distortion.mean_edge_distortion() < options.tolerance;
    let area_ok = distortion.max_area_distortion() < options.max_area_distortion;
    if !angle_ok {
        warnings.push(format!(
            "maximum angle distortion {:.3} degrees exceeds {:.3}",
            distortion.max_angle_distortion(),
            options.max_angle_distortion
        ));
    }
    if !edge_ok {
        warnings.push(format!(
            "mean edge length distortion {:.5} exceeds tolerance {:.5}",
            distortion.mean_edge_distortion(),
            options.tolerance
        ));
    }
    if !area_ok {
        warnings.push(format!(
            "maximum area distortion {:.3} exceeds {:.3}",
            distortion.max_area_distortion(),
            options.max_area_distortion
        ));
    }

    log::debug!(
        "unfolded {} vertices: pattern {:.4} x {:.4}, residual {:.3e}",
        mesh.num_vertices(),
        pattern_size.x,
        pattern_size.y,
        solution.residual
    );

    Ok(UnfoldReport {
        triangles: mesh.triangles().to_vec(),
        pattern_bounds,
        pattern_size,
        distortion,
        solution: SolutionInfo {
            residual: solution.residual,
            condition_number: solution.condition_number,
            num_constraints: constraints.len(),
            auto_pins,
            num_rows: system.num_rows(),
            num_unknowns: system.num_unknowns(),
            layout: system.layout,
            solver: solution.solver,
        },
        manufacturing: ManufacturingData {
            material_size: pattern_size * (1.0 + options.material_margin),
            distortion_acceptable: angle_ok && edge_ok && area_ok,
            applied_constraints: outcome.applied,
            unsupported_constraints: outcome.unsupported,
        },
        uv: solution.uv,
        warnings,
    })
}

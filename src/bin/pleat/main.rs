//! Pleat CLI - mesh analysis and unfolding tool.
//!
//! Usage: pleat <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `pleat --help` for available commands. Set `RUST_LOG=debug` for
//! library diagnostics.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use pleat::algo::curvature::{analyze_curvature, CurvatureEstimator, CurvatureOptions};
use pleat::algo::decimate::decimate;
use pleat::algo::geodesic::{fold_lines_from, GeodesicGraph};
use pleat::algo::keyvertex::{select_key_vertices, KeyVertexOptions};
use pleat::algo::parameterize::{
    unfold, Anchoring, BoundaryConstraint, LinearSolver, LscmOptions, ManufacturingConstraints, SystemLayout,
    UnfoldOptions,
};
use pleat::algo::validate::validate;
use pleat::io;
use pleat::mesh::synthetic_grid_mesh;

#[derive(Parser)]
#[command(name = "pleat")]
#[command(author, version, about = "Surface unfolding CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a mesh and summarize its curvature
    Info {
        /// Input mesh file
        input: PathBuf,

        /// Curvature estimator
        #[arg(short, long, value_enum, default_value = "proxy")]
        estimator: EstimatorArg,
    },

    /// Select key vertices and classify fold lines between them
    Folds {
        /// Input mesh file
        input: PathBuf,

        /// Maximum number of key vertices
        #[arg(short = 'k', long, default_value = "20")]
        max_keys: usize,

        /// Number of fold lines to print
        #[arg(short = 'n', long, default_value = "10")]
        show: usize,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },

    /// Unfold a mesh into a flat pattern and write it as OBJ with UVs
    Unfold {
        /// Input mesh file
        input: PathBuf,

        /// Output OBJ file
        output: PathBuf,

        /// Pin a vertex: `index,u,v` (repeatable)
        #[arg(short, long = "pin", value_parser = parse_pin)]
        pins: Vec<BoundaryConstraint>,

        /// Column layout of the conformal system
        #[arg(short, long, value_enum, default_value = "conformal")]
        layout: LayoutArg,

        /// Linear solver
        #[arg(short, long, value_enum, default_value = "cholesky")]
        solver: SolverArg,

        /// Behaviour with fewer than two pins
        #[arg(short, long, value_enum, default_value = "auto")]
        anchoring: AnchoringArg,

        /// Mean edge length distortion tolerance
        #[arg(short, long, default_value = "0.001")]
        tolerance: f64,

        /// Scale the pattern into the unit square
        #[arg(long)]
        normalize: bool,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },

    /// Reduce a mesh to at most N vertices by stride sampling
    Decimate {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Vertex cap
        #[arg(short, long)]
        max_vertices: usize,
    },

    /// Write a synthetic bumped grid mesh
    Grid {
        /// Output mesh file
        output: PathBuf,

        /// Number of rows
        #[arg(short, long, default_value = "10")]
        rows: usize,

        /// Number of columns
        #[arg(short, long, default_value = "10")]
        cols: usize,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum EstimatorArg {
    /// Area-weighted corner angle proxy
    Proxy,
    /// Angle defect (discrete Gaussian curvature)
    AngleDefect,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum LayoutArg {
    /// Interleaved u/v columns
    Conformal,
    /// One column per vertex
    SingleUnknown,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum SolverArg {
    /// Sparse Cholesky with conjugate gradient fallback
    Cholesky,
    /// Conjugate gradient only
    Cg,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum AnchoringArg {
    /// Add pins at the farthest boundary vertices
    Auto,
    /// Fail without pins
    Require,
    /// Solve as given
    None,
}

fn parse_pin(s: &str) -> Result<BoundaryConstraint, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [index, u, v] = parts.as_slice() else {
        return Err(format!("expected `index,u,v`, got `{}`", s));
    };
    let index = index.parse::<usize>().map_err(|e| format!("pin index: {}", e))?;
    let u = u.parse::<f64>().map_err(|e| format!("pin u: {}", e))?;
    let v = v.parse::<f64>().map_err(|e| format!("pin v: {}", e))?;
    Ok(BoundaryConstraint::new(index, u, v))
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input, estimator } => {
            cmd_info(&input, estimator)?;
        }

        Commands::Folds {
            input,
            max_keys,
            show,
            sequential,
        } => {
            cmd_folds(&input, max_keys, show, sequential)?;
        }

        Commands::Unfold {
            input,
            output,
            pins,
            layout,
            solver,
            anchoring,
            tolerance,
            normalize,
            sequential,
        } => {
            let lscm = LscmOptions::default()
                .with_layout(match layout {
                    LayoutArg::Conformal => SystemLayout::Conformal,
                    LayoutArg::SingleUnknown => SystemLayout::SingleUnknown,
                })
                .with_solver(match solver {
                    SolverArg::Cholesky => LinearSolver::Cholesky,
                    SolverArg::Cg => LinearSolver::ConjugateGradient,
                })
                .with_anchoring(match anchoring {
                    AnchoringArg::Auto => Anchoring::AutoPin,
                    AnchoringArg::Require => Anchoring::RequireConstraints,
                    AnchoringArg::None => Anchoring::Unanchored,
                })
                .with_parallel(!sequential);
            let options = UnfoldOptions::default().with_lscm(lscm).with_tolerance(tolerance);
            cmd_unfold(&input, &output, &pins, &options, normalize)?;
        }

        Commands::Decimate {
            input,
            output,
            max_vertices,
        } => {
            cmd_decimate(&input, &output, max_vertices)?;
        }

        Commands::Grid { output, rows, cols } => {
            let mesh = synthetic_grid_mesh(rows, cols)?;
            io::save(&mesh, &output)?;
            println!(
                "Saved: {} ({} vertices, {} triangles)",
                output.display(),
                mesh.num_vertices(),
                mesh.num_triangles()
            );
        }
    }

    Ok(())
}

fn cmd_info(input: &Path, estimator: EstimatorArg) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;
    let report = validate(&mesh);

    println!("File: {}", input.display());
    println!("Status: {}", report.status);
    if let Some(error) = &report.error {
        println!("Error: {}", error);
    }
    println!(
        "Vertices: {} ({} unique)",
        report.num_vertices, report.num_unique_vertices
    );
    println!("Triangles: {} ({} degenerate)", report.num_triangles, report.num_degenerate_triangles);
    println!(
        "Edges: {} ({} boundary, {} non-manifold)",
        report.num_edges,
        report.num_boundary_edges(),
        report.num_non_manifold_edges()
    );
    println!("Euler characteristic: {}", report.euler_characteristic);
    println!(
        "Topology: {}",
        if report.is_closed { "closed" } else if report.has_boundary { "open" } else { "empty" }
    );
    println!("Suitable for unfolding: {}", report.suitable_for_unfolding);
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }

    println!("Surface area: {:.6}", mesh.surface_area());
    if let Some((min, max)) = mesh.bounding_box() {
        let diag = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }
    println!("Average edge length: {:.6}", mesh.average_edge_length());

    let estimator = match estimator {
        EstimatorArg::Proxy => CurvatureEstimator::AngleProxy,
        EstimatorArg::AngleDefect => CurvatureEstimator::AngleDefect,
    };
    let curvature = analyze_curvature(&mesh, &CurvatureOptions::default().with_estimator(estimator));
    println!("\nCurvature ({:?}):", curvature.estimator);
    if let Some((lo, hi)) = curvature.range() {
        let avg = curvature.curvature.iter().sum::<f64>() / curvature.curvature.len() as f64;
        println!("  min={:.4}, max={:.4}, avg={:.4}", lo, hi, avg);
    }
    println!("  Surface type: {}", curvature.surface_type);

    Ok(())
}

fn cmd_folds(input: &Path, max_keys: usize, show: usize, sequential: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;
    println!("Loaded: {} vertices, {} triangles", mesh.num_vertices(), mesh.num_triangles());

    let start = Instant::now();
    let curvature = analyze_curvature(&mesh, &CurvatureOptions::default().with_parallel(!sequential));
    let keys = select_key_vertices(
        &mesh,
        &curvature.curvature,
        &KeyVertexOptions::default().with_max_key_vertices(max_keys),
    );
    println!(
        "Key vertices: {} ({} corners, threshold {:.4})",
        keys.len(),
        keys.corners.len(),
        keys.threshold
    );

    let graph = GeodesicGraph::from_mesh(&mesh);
    let paths = graph.all_pairs_among_with(&keys.vertices, !sequential);
    let folds = fold_lines_from(&paths);
    let elapsed = start.elapsed();

    println!("Fold lines: {} from {} paths ({:.2?})", folds.len(), paths.len(), elapsed);
    for fold in folds.iter().take(show) {
        println!(
            "  {:>5} -> {:<5} {:?} ({:?}), {} vertices, max turn {:.3}, priority {}",
            fold.start,
            fold.end,
            fold.kind,
            fold.style,
            fold.path.len(),
            fold.max_turn,
            fold.priority
        );
    }

    Ok(())
}

fn cmd_unfold(
    input: &Path,
    output: &Path,
    pins: &[BoundaryConstraint],
    options: &UnfoldOptions,
    normalize: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;
    println!("Loaded: {} vertices, {} triangles", mesh.num_vertices(), mesh.num_triangles());
    println!(
        "Unfolding ({} layout, {} solver, {} pin(s))...",
        options.lscm.layout,
        options.lscm.solver,
        pins.len()
    );

    let start = Instant::now();
    let mut report = unfold(&mesh, pins, &ManufacturingConstraints::new(), options)?;
    let elapsed = start.elapsed();

    let info = &report.solution;
    println!(
        "Solved with {}: {} rows x {} unknowns, residual {:.3e} ({:.2?})",
        info.solver, info.num_rows, info.num_unknowns, info.residual, elapsed
    );
    if let Some(cond) = info.condition_number {
        println!("Condition number: {:.3e}", cond);
    }
    for pin in &info.auto_pins {
        println!("Auto pin: vertex {} at ({:.4}, {:.4})", pin.vertex, pin.u, pin.v);
    }

    let d = &report.distortion;
    println!("Pattern size: {:.4} x {:.4}", report.pattern_size.x, report.pattern_size.y);
    println!(
        "Material size: {:.4} x {:.4}",
        report.manufacturing.material_size.x, report.manufacturing.material_size.y
    );
    println!("Distortion:");
    println!("  Area:  mean={:.5}, max={:.5}", d.area.mean, d.area.max);
    println!("  Angle: mean={:.4}°, max={:.4}°", d.angle.mean, d.angle.max);
    println!("  Edge:  mean={:.5}, max={:.5}", d.edge.mean, d.edge.max);
    println!("Acceptable: {}", report.manufacturing.distortion_acceptable);
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }

    if normalize {
        report.uv.normalize();
    }
    io::save_obj_with_uvs(&mesh, &report.uv, output)?;
    println!("Saved: {}", output.display());

    Ok(())
}

fn cmd_decimate(input: &Path, output: &Path, max_vertices: usize) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;
    println!("Loaded: {} vertices, {} triangles", mesh.num_vertices(), mesh.num_triangles());

    let result = decimate(&mesh, max_vertices)?;
    println!(
        "Result: {} vertices, {} triangles (stride {})",
        result.mesh.num_vertices(),
        result.mesh.num_triangles(),
        result.stride
    );

    let report = validate(&result.mesh);
    if !report.suitable_for_unfolding {
        println!("Note: decimated mesh is not suitable for unfolding ({})", report.status);
    }

    io::save(&result.mesh, output)?;
    println!("Saved: {}", output.display());

    Ok(())
}

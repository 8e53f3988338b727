//! Error types for pleat.
//!
//! This module defines all error types used throughout the library. Errors
//! are fatal: recoverable mesh defects (degenerate triangles, non-manifold
//! edges, unreachable vertex pairs) are reported as data by the analysis
//! stages instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Broad classes of [`MeshError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The input could not be turned into a solvable problem.
    Construction,
    /// The linear system could not be assembled or solved.
    Numerical,
    /// Reading or writing a mesh file failed.
    Io,
    /// An option or argument was out of range.
    Parameter,
}

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no triangles.
    #[error("mesh has no triangles")]
    EmptyMesh,

    /// A triangle references an invalid vertex index.
    #[error("triangle {triangle} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The triangle index.
        triangle: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A vertex coordinate is NaN or infinite.
    #[error("vertex {vertex} has a non-finite coordinate")]
    NonFiniteCoordinate {
        /// The offending vertex.
        vertex: usize,
    },

    /// No triangle survived index checks and deduplication.
    #[error("no valid triangles remain ({rejected} rejected)")]
    NoValidTriangles {
        /// Number of triangles dropped during construction.
        rejected: usize,
    },

    /// Validation flagged the mesh as unusable.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// A boundary constraint references a vertex outside the mesh.
    #[error("boundary constraint on vertex {vertex} is out of range (mesh has {num_vertices} vertices)")]
    InvalidConstraint {
        /// The constrained vertex.
        vertex: usize,
        /// Number of vertices in the mesh.
        num_vertices: usize,
    },

    /// The solver was configured to require constraints but none were given.
    #[error("at least one boundary constraint is required")]
    MissingConstraints,

    /// Not enough geometry to set up a parameterization.
    #[error("mesh has {vertices} vertices and {triangles} triangles; need at least 3 and 1")]
    TooFewElements {
        /// Vertex count.
        vertices: usize,
        /// Triangle count.
        triangles: usize,
    },

    /// System assembly produced no equations.
    #[error("conformal system is empty (every triangle is degenerate)")]
    EmptySystem,

    /// The linear solver could not produce a solution.
    #[error("linear solve failed: {0}")]
    SolverFailed(String),

    /// Algorithm failed to converge.
    #[error("algorithm failed to converge after {iterations} iterations")]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// A line of mesh text could not be parsed.
    #[error("line {line}: {message}")]
    ParseError {
        /// One-based line number.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// The class this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            MeshError::EmptyMesh
            | MeshError::InvalidVertexIndex { .. }
            | MeshError::NonFiniteCoordinate { .. }
            | MeshError::NoValidTriangles { .. }
            | MeshError::InvalidMesh(_)
            | MeshError::InvalidConstraint { .. }
            | MeshError::MissingConstraints => ErrorCategory::Construction,
            MeshError::TooFewElements { .. }
            | MeshError::EmptySystem
            | MeshError::SolverFailed(_)
            | MeshError::ConvergenceFailed { .. } => ErrorCategory::Numerical,
            MeshError::Io(_)
            | MeshError::LoadError { .. }
            | MeshError::ParseError { .. }
            | MeshError::SaveError { .. }
            | MeshError::UnsupportedFormat { .. } => ErrorCategory::Io,
            MeshError::InvalidParameter { .. } => ErrorCategory::Parameter,
        }
    }
}

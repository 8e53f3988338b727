//! Mesh file I/O.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | Wavefront OBJ | `.obj` | ✓ | ✓ | Polygons fan-triangulated; UVs on save |
//! | STL | `.stl` | ✓ | ✓ | Binary and ASCII load, binary save |
//!
//! # Usage
//!
//! ```no_run
//! use pleat::io::{load, save};
//!
//! let mesh = load("model.stl").unwrap();
//! save(&mesh, "model.obj").unwrap();
//! ```

pub mod obj;
pub mod stl;

use std::path::Path;

use crate::algo::parameterize::UvMap;
use crate::error::{MeshError, Result};
use crate::mesh::TriangleMesh;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront OBJ format.
    Obj,
    /// STL (stereolithography) format.
    Stl,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "obj" => Some(Format::Obj),
            "stl" => Some(Format::Stl),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

fn detect(path: &Path) -> Result<Format> {
    Format::from_path(path).ok_or_else(|| MeshError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

/// Load a mesh from a file with automatic format detection.
///
/// The format is determined by the file extension.
pub fn load<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Obj => obj::load(path),
        Format::Stl => stl::load(path),
    }
}

/// Save a mesh to a file with automatic format detection.
///
/// The format is determined by the file extension.
pub fn save<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Obj => obj::save(mesh, path),
        Format::Stl => stl::save(mesh, path),
    }
}

/// Save a mesh and its unfolded UV coordinates as OBJ.
///
/// # Errors
///
/// [`MeshError::UnsupportedFormat`] unless `path` ends in `.obj`, plus any
/// error of [`obj::save_with_uvs`].
pub fn save_obj_with_uvs<P: AsRef<Path>>(mesh: &TriangleMesh, uv: &UvMap, path: P) -> Result<()> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Obj => obj::save_with_uvs(mesh, uv, path),
        Format::Stl => Err(MeshError::UnsupportedFormat {
            extension: "stl (no UV support)".to_string(),
        }),
    }
}

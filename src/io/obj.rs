//! Wavefront OBJ format support.
//!
//! Only geometry is read: `v` positions and `f` faces. Polygon faces are
//! fan-triangulated, and the texture and normal parts of `v/vt/vn` face
//! references are ignored. Negative (relative) indices are resolved against
//! the vertices defined so far. Unfolded patterns are written with one `vt`
//! line per vertex so that face references can reuse the vertex index.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::algo::parameterize::UvMap;
use crate::error::{MeshError, Result};
use crate::mesh::TriangleMesh;

/// Load a mesh from an OBJ file.
///
/// # Example
///
/// ```no_run
/// use pleat::io::obj;
///
/// let mesh = obj::load("panel.obj").unwrap();
/// println!("{} triangles", mesh.num_triangles());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let path = path.as_ref();
    let file = File::open(path)?;
    read(BufReader::new(file)).map_err(|e| match e {
        MeshError::ParseError { .. } | MeshError::Io(_) => MeshError::LoadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        },
        other => other,
    })
}

/// Save a mesh to an OBJ file.
pub fn save<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write(&mut writer, mesh, None)?;
    writer.flush()?;
    Ok(())
}

/// Save a mesh to an OBJ file with one UV coordinate per vertex.
///
/// # Errors
///
/// Returns [`MeshError::SaveError`] if `uv` does not have one coordinate per
/// vertex.
pub fn save_with_uvs<P: AsRef<Path>>(mesh: &TriangleMesh, uv: &UvMap, path: P) -> Result<()> {
    let path = path.as_ref();
    if uv.len() != mesh.num_vertices() {
        return Err(MeshError::SaveError {
            path: path.to_path_buf(),
            message: format!("{} UV coordinates for {} vertices", uv.len(), mesh.num_vertices()),
        });
    }
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write(&mut writer, mesh, Some(uv))?;
    writer.flush()?;
    Ok(())
}

/// Parse OBJ text into a mesh.
///
/// # Errors
///
/// Returns [`MeshError::ParseError`] for the first malformed line, and the
/// [`TriangleMesh::try_new`] errors for out-of-range or missing faces.
pub fn read<R: BufRead>(reader: R) -> Result<TriangleMesh> {
    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut triangles: Vec<[usize; 3]> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = line_no + 1;
        let malformed = |message: String| MeshError::ParseError {
            line: line_no,
            message,
        };
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("v") => {
                let mut coords = [0.0; 3];
                for c in &mut coords {
                    *c = tokens
                        .next()
                        .and_then(|t| t.parse::<f64>().ok())
                        .ok_or_else(|| malformed("malformed vertex".to_string()))?;
                }
                vertices.push(Point3::new(coords[0], coords[1], coords[2]));
            }
            Some("f") => {
                let face = tokens
                    .map(|t| resolve_index(t, vertices.len()))
                    .collect::<Option<Vec<usize>>>()
                    .ok_or_else(|| malformed("malformed face".to_string()))?;
                if face.len() < 3 {
                    return Err(malformed(format!("face with {} vertices", face.len())));
                }
                for i in 1..face.len() - 1 {
                    triangles.push([face[0], face[i], face[i + 1]]);
                }
            }
            _ => {}
        }
    }

    TriangleMesh::try_new(vertices, triangles)
}

/// Write a mesh as OBJ text, with `vt` lines when `uv` is given.
pub fn write<W: Write>(w: &mut W, mesh: &TriangleMesh, uv: Option<&UvMap>) -> std::io::Result<()> {
    writeln!(w, "# pleat")?;
    for p in mesh.vertices() {
        writeln!(w, "v {} {} {}", p.x, p.y, p.z)?;
    }
    if let Some(uv) = uv {
        for (_, q) in uv.iter() {
            writeln!(w, "vt {} {}", q.x, q.y)?;
        }
    }
    for tri in mesh.triangles() {
        let [a, b, c] = tri.map(|v| v + 1);
        if uv.is_some() {
            writeln!(w, "f {a}/{a} {b}/{b} {c}/{c}")?;
        } else {
            writeln!(w, "f {a} {b} {c}")?;
        }
    }
    Ok(())
}

/// Resolve one face reference (`7`, `7/2`, `7/2/3`, `7//3` or `-1`) to a
/// zero-based vertex index.
fn resolve_index(token: &str, num_vertices: usize) -> Option<usize> {
    let index: i64 = token.split('/').next()?.parse().ok()?;
    match index {
        0 => None,
        i if i > 0 => Some(i as usize - 1),
        i => num_vertices.checked_sub(i.unsigned_abs() as usize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    #[test]
    fn test_read_quad_is_fan_triangulated() {
        let text = "# quad\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvt 0 0\nf 1/1 2/2 3/3 4/4\n";
        let mesh = read(text.as_bytes()).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.triangles(), &[[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_read_normal_and_relative_indices() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3//1 -2//1 -1//1\n";
        let mesh = read(text.as_bytes()).unwrap();
        assert_eq!(mesh.triangles(), &[[0, 1, 2]]);
    }

    #[test]
    fn test_read_errors() {
        let err = read("v 0 0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, MeshError::ParseError { line: 1, .. }));

        let err = read("v 0 0 0\nv 1 0 0\nf 1 2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, MeshError::ParseError { line: 3, .. }));
        assert_eq!(err.to_string(), "line 3: face with 2 vertices");

        let err = read("v 0 0 0\nf 1 2 0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, MeshError::ParseError { line: 2, .. }));

        let err = read("v 0 0 0\nf 1 2 3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, MeshError::InvalidVertexIndex { triangle: 0, vertex: 1 }));
        assert!(matches!(read("# nothing\n".as_bytes()), Err(MeshError::EmptyMesh)));
    }

    #[test]
    fn test_load_reports_path_and_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.obj");
        std::fs::write(&path, "v 0 0 0\nv x 0 0\n").unwrap();

        match load(&path).unwrap_err() {
            MeshError::LoadError { path: p, message } => {
                assert_eq!(p, path);
                assert_eq!(message, "line 2: malformed vertex");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_write_with_uvs() {
        let mesh = TriangleMesh::from_arrays(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], &[[0, 1, 2]]);
        let uv = UvMap::new(vec![Point2::new(0.0, 0.0), Point2::new(0.5, 0.0), Point2::new(0.0, 0.5)]);

        let mut out = Vec::new();
        write(&mut out, &mesh, Some(&uv)).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.lines().filter(|l| l.starts_with("vt ")).count(), 3);
        assert!(text.contains("vt 0.5 0\n"));
        assert!(text.contains("f 1/1 2/2 3/3\n"));

        // Written text reads back to the same geometry
        let back = read(text.as_bytes()).unwrap();
        assert_eq!(back.vertices(), mesh.vertices());
        assert_eq!(back.triangles(), mesh.triangles());
    }
}

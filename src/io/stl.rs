//! STL (stereolithography) format support.
//!
//! STL stores three corners per triangle. Corners with bit-identical
//! coordinates are welded into one vertex on load; no tolerance is applied,
//! so near-duplicates survive and show up in validation.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::TriangleMesh;

/// Load a mesh from an STL file.
///
/// Automatically detects binary vs ASCII format.
///
/// # Example
///
/// ```no_run
/// use pleat::io::stl;
///
/// let mesh = stl::load("model.stl").unwrap();
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    read(&mut file).map_err(|e| match e {
        MeshError::Io(_) => MeshError::LoadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        },
        other => other,
    })
}

/// Parse binary or ASCII STL data, welding identical corners.
pub fn read<R: Read + Seek>(reader: &mut R) -> Result<TriangleMesh> {
    let stl = stl_io::read_stl(reader)?;

    let mut welded: HashMap<[u32; 3], usize> = HashMap::new();
    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut triangles: Vec<[usize; 3]> = Vec::with_capacity(stl.faces.len());

    for (t, face) in stl.faces.iter().enumerate() {
        let mut tri = [0; 3];
        for (slot, &corner) in tri.iter_mut().zip(&face.vertices) {
            let p = stl.vertices.get(corner).ok_or(MeshError::InvalidVertexIndex {
                triangle: t,
                vertex: corner,
            })?;
            let key = [p[0].to_bits(), p[1].to_bits(), p[2].to_bits()];
            *slot = *welded.entry(key).or_insert_with(|| {
                vertices.push(Point3::new(p[0] as f64, p[1] as f64, p[2] as f64));
                vertices.len() - 1
            });
        }
        triangles.push(tri);
    }

    log::debug!(
        "read STL: {} triangles, {} corners welded into {} vertices",
        triangles.len(),
        3 * triangles.len(),
        vertices.len()
    );
    TriangleMesh::try_new(vertices, triangles)
}

/// Save a mesh to a binary STL file.
///
/// Triangles with out-of-range indices are skipped.
pub fn save<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write(&mut writer, mesh).map_err(|e| MeshError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    writer.flush()?;
    Ok(())
}

/// Write a mesh as binary STL.
pub fn write<W: Write>(w: &mut W, mesh: &TriangleMesh) -> std::io::Result<()> {
    let to_vertex = |p: &Point3<f64>| stl_io::Vertex::new([p.x as f32, p.y as f32, p.z as f32]);

    let triangles: Vec<stl_io::Triangle> = (0..mesh.num_triangles())
        .filter(|&t| mesh.triangle_in_range(t))
        .map(|t| {
            let [p0, p1, p2] = mesh.triangle_positions(t);
            let n = mesh.triangle_normal(t);
            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [to_vertex(&p0), to_vertex(&p1), to_vertex(&p2)],
            }
        })
        .collect();

    stl_io::write_stl(w, triangles.iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_write_then_read_welds_shared_corners() {
        let mesh = TriangleMesh::from_arrays(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            &[[0, 1, 2], [0, 2, 3]],
        );

        let mut buffer = Vec::new();
        write(&mut buffer, &mesh).unwrap();
        // 80-byte header, 4-byte count, 50 bytes per triangle
        assert_eq!(buffer.len(), 84 + 2 * 50);

        let back = read(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(back.num_vertices(), 4);
        assert_eq!(back.num_triangles(), 2);
        assert!((back.surface_area() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_read_garbage_fails() {
        let mut cursor = Cursor::new(b"not an stl file".to_vec());
        assert!(matches!(read(&mut cursor), Err(MeshError::Io(_))));
    }
}

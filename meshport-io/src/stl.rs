//! STL format support
//!
//! STL stores independent triangles, so every facet gets its own three
//! vertices on read. Facet normals are recomputed on write from the single
//! precision coordinates actually stored, which keeps rewrites byte-stable.

use crate::options::EncodeOptions;
use crate::ply::fan_triangulate;
use crate::text::{parse_token, Records};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use meshport_core::{Error, Point3d, Result, TriangleMesh};
use std::io::{BufRead, Cursor, Write};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// True when `data` has exactly the size a binary STL with its declared
/// facet count would have
fn is_binary(data: &[u8]) -> bool {
    if data.len() < HEADER_LEN + 4 {
        return false;
    }
    let count = LittleEndian::read_u32(&data[HEADER_LEN..]) as usize;
    count
        .checked_mul(FACET_LEN)
        .and_then(|body| body.checked_add(HEADER_LEN + 4))
        == Some(data.len())
}

fn looks_ascii(data: &[u8]) -> bool {
    let start = data.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(data.len());
    data[start..].starts_with(b"solid")
}

pub(crate) fn read_triangle_mesh(reader: &mut dyn BufRead) -> Result<TriangleMesh> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    if is_binary(&data) {
        read_binary(&data)
    } else if looks_ascii(&data) {
        read_ascii(&mut Cursor::new(data))
    } else if data.len() >= HEADER_LEN + 4 {
        Err(Error::parse(format!(
            "binary STL size {} doesn't match its facet count",
            data.len()
        )))
    } else {
        Err(Error::parse("file is too short to be an STL mesh"))
    }
}

fn read_binary(data: &[u8]) -> Result<TriangleMesh> {
    let count = LittleEndian::read_u32(&data[HEADER_LEN..]) as usize;
    let mut mesh = TriangleMesh::new();
    mesh.vertices.reserve(count * 3);
    mesh.faces.reserve(count);

    for facet in data[HEADER_LEN + 4..].chunks_exact(FACET_LEN) {
        // Skip the stored normal, read three corners, ignore the attribute word.
        let base = mesh.vertices.len();
        for corner in facet[12..48].chunks_exact(12) {
            mesh.vertices.push(Point3d::new(
                LittleEndian::read_f32(&corner[0..4]) as f64,
                LittleEndian::read_f32(&corner[4..8]) as f64,
                LittleEndian::read_f32(&corner[8..12]) as f64,
            ));
        }
        mesh.faces.push([base, base + 1, base + 2]);
    }
    Ok(mesh)
}

fn read_ascii<R: BufRead>(reader: &mut R) -> Result<TriangleMesh> {
    let mut records = Records::new(reader);
    let mut mesh = TriangleMesh::new();
    let mut facet: Vec<usize> = Vec::with_capacity(3);
    let mut in_facet = false;

    while let Some(record) = records.next_line()? {
        let tokens = record.tokens();
        match tokens[0].to_ascii_lowercase().as_str() {
            "facet" => {
                facet.clear();
                in_facet = true;
            }
            "vertex" if in_facet => {
                if tokens.len() < 4 {
                    return Err(record.error("vertex needs three coordinates"));
                }
                // Parsed as f32 so ASCII and binary files read back identically.
                let mut xyz = [0.0f64; 3];
                for (slot, token) in xyz.iter_mut().zip(&tokens[1..4]) {
                    *slot = parse_token::<f32>(token, record.number)? as f64;
                }
                facet.push(mesh.vertices.len());
                mesh.vertices.push(Point3d::from(xyz));
            }
            "endfacet" => {
                fan_triangulate(&facet, &mut mesh.faces)
                    .map_err(|_| record.error(format!("facet with {} vertices", facet.len())))?;
                in_facet = false;
            }
            "vertex" => return Err(record.error("vertex outside of a facet")),
            "endsolid" => break,
            _ => {}
        }
    }
    if in_facet {
        return Err(Error::parse("ASCII STL ends inside a facet"));
    }
    Ok(mesh)
}

/// Corners of a face in single precision, as stored
fn corners(mesh: &TriangleMesh, face: &[usize; 3]) -> [[f32; 3]; 3] {
    face.map(|i| {
        let v = &mesh.vertices[i];
        [v.x as f32, v.y as f32, v.z as f32]
    })
}

fn facet_normal(c: &[[f32; 3]; 3]) -> [f32; 3] {
    let u = [c[1][0] - c[0][0], c[1][1] - c[0][1], c[1][2] - c[0][2]];
    let v = [c[2][0] - c[0][0], c[2][1] - c[0][1], c[2][2] - c[0][2]];
    let n = [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len > 0.0 && len.is_finite() {
        n.map(|x| x / len)
    } else {
        [0.0; 3]
    }
}

pub(crate) fn write_triangle_mesh(
    mesh: &TriangleMesh,
    options: &EncodeOptions,
    writer: &mut dyn Write,
) -> Result<()> {
    if options.ascii {
        write_ascii(mesh, writer)
    } else {
        write_binary(mesh, writer)
    }
}

fn write_binary(mesh: &TriangleMesh, writer: &mut dyn Write) -> Result<()> {
    let mut header = [0u8; HEADER_LEN];
    let banner = b"binary STL written by meshport";
    header[..banner.len()].copy_from_slice(banner);
    writer.write_all(&header)?;

    let count = u32::try_from(mesh.faces.len())
        .map_err(|_| Error::Unsupported("binary STL holds at most 2^32 - 1 facets".to_string()))?;
    writer.write_u32::<LittleEndian>(count)?;

    let mut facet = Vec::with_capacity(FACET_LEN);
    for face in &mesh.faces {
        let c = corners(mesh, face);
        facet.clear();
        for value in facet_normal(&c).iter().chain(c.iter().flatten()) {
            facet.write_f32::<LittleEndian>(*value)?;
        }
        facet.write_u16::<LittleEndian>(0)?;
        writer.write_all(&facet)?;
    }
    Ok(())
}

fn write_ascii(mesh: &TriangleMesh, writer: &mut dyn Write) -> Result<()> {
    writeln!(writer, "solid meshport")?;
    for face in &mesh.faces {
        let c = corners(mesh, face);
        let [nx, ny, nz] = facet_normal(&c);
        writeln!(writer, "  facet normal {} {} {}", nx, ny, nz)?;
        writeln!(writer, "    outer loop")?;
        for [x, y, z] in c {
            writeln!(writer, "      vertex {} {} {}", x, y, z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid meshport")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![Point3d::origin(), Point3d::new(1.0, 0.0, 0.0), Point3d::new(0.0, 1.0, 0.0)],
            vec![[0, 1, 2]],
        )
    }

    fn encode(mesh: &TriangleMesh, ascii: bool) -> Vec<u8> {
        let options = EncodeOptions {
            ascii,
            ..Default::default()
        };
        let mut out: Vec<u8> = Vec::new();
        write_triangle_mesh(mesh, &options, &mut out).unwrap();
        out
    }

    #[test]
    fn test_binary_layout() {
        let data = encode(&triangle(), false);
        assert_eq!(data.len(), HEADER_LEN + 4 + FACET_LEN);
        assert!(is_binary(&data));
        // The normal of a counter-clockwise triangle in the XY plane is +Z.
        assert_eq!(LittleEndian::read_f32(&data[92..96]), 1.0);
    }

    #[test]
    fn test_ascii_and_binary_agree() {
        let mesh = triangle();
        let from_binary = read_triangle_mesh(&mut Cursor::new(encode(&mesh, false))).unwrap();
        let from_ascii = read_triangle_mesh(&mut Cursor::new(encode(&mesh, true))).unwrap();
        assert_eq!(from_binary, mesh);
        assert_eq!(from_ascii, mesh);
    }

    #[test]
    fn test_binary_header_starting_with_solid() {
        let mut data = encode(&triangle(), false);
        data[..5].copy_from_slice(b"solid");
        let mesh = read_triangle_mesh(&mut Cursor::new(data)).unwrap();
        assert_eq!(mesh.face_count(), 1);
    }

    #[test]
    fn test_truncated_or_garbage_input() {
        let mut data = encode(&triangle(), false);
        data.truncate(data.len() - 1);
        assert!(matches!(read_triangle_mesh(&mut Cursor::new(data)), Err(Error::Parse(_))));
        assert!(matches!(read_triangle_mesh(&mut Cursor::new(b"xyz".to_vec())), Err(Error::Parse(_))));

        let open_facet = "solid t\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\n";
        assert!(matches!(
            read_triangle_mesh(&mut Cursor::new(open_facet.as_bytes().to_vec())),
            Err(Error::Parse(_))
        ));
    }
}

//! OBJ (Wavefront Object) format support
//!
//! Only geometry statements are interpreted: `v` (optionally followed by an
//! RGB triple), `vn` and `f`. Texture coordinates, groups and materials are
//! skipped.

use crate::options::EncodeOptions;
use crate::ply::fan_triangulate;
use crate::text::{fmt_f64, parse_floats, parse_token, Line, Records};
use meshport_core::{Color3d, Point3d, Result, TriangleMesh, Vector3d};
use std::io::{BufRead, Write};

/// Resolve a 1-based or negative (relative) OBJ index against `count` items
fn resolve_index(token: &str, count: usize, line: &Line<'_>) -> Result<usize> {
    let raw: i64 = parse_token(token, line.number)?;
    let index = if raw > 0 {
        raw - 1
    } else {
        count as i64 + raw
    };
    if raw == 0 || index < 0 || index >= count as i64 {
        return Err(line.error(format!("index {} is outside 1..={}", raw, count)));
    }
    Ok(index as usize)
}

pub(crate) fn read_triangle_mesh(reader: &mut dyn BufRead) -> Result<TriangleMesh> {
    let mut records = Records::new(reader);
    let mut mesh = TriangleMesh::new();
    let mut colors: Vec<Option<Color3d>> = Vec::new();
    let mut normals: Vec<Vector3d> = Vec::new();
    let mut vertex_normals: Vec<Option<Vector3d>> = Vec::new();

    while let Some(record) = records.next_line()? {
        let tokens = record.tokens();
        let (statement, args) = (tokens[0], &tokens[1..]);
        match statement {
            "v" => {
                let [x, y, z] = parse_floats(args, record.number)?;
                mesh.vertices.push(Point3d::new(x, y, z));
                colors.push(if args.len() >= 6 {
                    let [r, g, b] = parse_floats(&args[3..], record.number)?;
                    Some(Color3d::new(r, g, b))
                } else {
                    None
                });
            }
            "vn" => {
                let [x, y, z] = parse_floats(args, record.number)?;
                normals.push(Vector3d::new(x, y, z));
            }
            "f" => {
                let mut polygon = Vec::with_capacity(args.len());
                for corner in args {
                    let mut parts = corner.split('/');
                    let vertex = resolve_index(parts.next().unwrap_or(""), mesh.vertices.len(), &record)?;
                    if let Some(normal) = parts.nth(1).filter(|n| !n.is_empty()) {
                        let normal = resolve_index(normal, normals.len(), &record)?;
                        vertex_normals.resize(mesh.vertices.len(), None);
                        vertex_normals[vertex] = Some(normals[normal]);
                    }
                    polygon.push(vertex);
                }
                fan_triangulate(&polygon, &mut mesh.faces).map_err(|_| {
                    record.error(format!("face with {} corners", polygon.len()))
                })?;
            }
            _ => {}
        }
    }

    if !vertex_normals.is_empty() {
        vertex_normals.resize(mesh.vertices.len(), None);
        mesh.normals = vertex_normals
            .into_iter()
            .map(|n| n.unwrap_or_else(Vector3d::zeros))
            .collect();
    }

    if colors.iter().all(Option::is_some) {
        mesh.colors = colors.into_iter().flatten().collect();
    } else if colors.iter().any(Option::is_some) {
        log::debug!("dropping OBJ vertex colors: not every vertex has one");
    }
    Ok(mesh)
}

pub(crate) fn write_triangle_mesh(
    mesh: &TriangleMesh,
    options: &EncodeOptions,
    writer: &mut dyn Write,
) -> Result<()> {
    let with_normals = options.vertex_normals && mesh.has_normals();
    let with_colors = options.vertex_colors && mesh.has_colors();

    for (i, v) in mesh.vertices.iter().enumerate() {
        write!(writer, "v {} {} {}", fmt_f64(v.x), fmt_f64(v.y), fmt_f64(v.z))?;
        if with_colors {
            let c = &mesh.colors[i];
            write!(writer, " {} {} {}", fmt_f64(c.x), fmt_f64(c.y), fmt_f64(c.z))?;
        }
        writeln!(writer)?;
    }
    if with_normals {
        for n in &mesh.normals {
            writeln!(writer, "vn {} {} {}", fmt_f64(n.x), fmt_f64(n.y), fmt_f64(n.z))?;
        }
    }
    for face in &mesh.faces {
        let [a, b, c] = face.map(|i| i + 1);
        if with_normals {
            writeln!(writer, "f {a}//{a} {b}//{b} {c}//{c}")?;
        } else {
            writeln!(writer, "f {} {} {}", a, b, c)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshport_core::Error;
    use std::io::Cursor;

    #[test]
    fn test_corner_forms_and_negative_indices() {
        let data = "# quad\nmtllib scene.mtl\no quad\n\
                    v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
                    vt 0 0\nvn 0 0 1\n\
                    f 1/1/1 2//1 3/1 -1\n";
        let mesh = read_triangle_mesh(&mut Cursor::new(data)).unwrap();
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(mesh.normals.len(), 4);
        assert_eq!(mesh.normals[1], Vector3d::z());
        assert_eq!(mesh.normals[3], Vector3d::zeros());
        assert!(!mesh.has_colors());
    }

    #[test]
    fn test_vertex_colors() {
        let data = "v 0 0 0 1 0 0\nv 1 0 0 0 1 0\nv 0 1 0 0 0 1\nf 1 2 3\n";
        let mesh = read_triangle_mesh(&mut Cursor::new(data)).unwrap();
        assert_eq!(mesh.colors[2], Color3d::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_bad_indices() {
        for face in ["f 1 2 4", "f 0 1 2", "f 1 2"] {
            let data = format!("v 0 0 0\nv 1 0 0\nv 0 1 0\n{}\n", face);
            let result = read_triangle_mesh(&mut Cursor::new(data));
            assert!(matches!(result, Err(Error::Parse(_))), "{}", face);
        }
    }

    #[test]
    fn test_writer_omits_disabled_blocks() {
        let mut mesh = TriangleMesh::from_vertices_and_faces(
            vec![Point3d::origin(), Point3d::new(1.0, 0.0, 0.0), Point3d::new(0.0, 1.0, 0.0)],
            vec![[0, 1, 2]],
        );
        mesh.set_normals(vec![Vector3d::z(); 3]);
        mesh.set_colors(vec![Color3d::new(0.5, 0.5, 0.5); 3]);

        let options = EncodeOptions {
            vertex_normals: false,
            ..Default::default()
        };
        let mut out: Vec<u8> = Vec::new();
        write_triangle_mesh(&mesh, &options, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("v 1 0 0 0.5 0.5 0.5\n"));
        assert!(!text.contains("vn"));
        assert!(text.ends_with("f 1 2 3\n"));
    }
}

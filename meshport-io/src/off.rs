//! OFF (Object File Format) support
//!
//! Handles the `OFF`, `NOFF`, `COFF` and `CNOFF` variants. A vertex line is
//! `x y z [nx ny nz] [r g b [a]]`; colors written as integers are 0-255,
//! colors written with a decimal point or exponent are already in [0, 1].

use crate::options::EncodeOptions;
use crate::ply::fan_triangulate;
use crate::text::{fmt_f64, parse_floats, parse_token, Line, Records};
use meshport_core::{color_to_rgb8, Color3d, Error, Point3d, Result, TriangleMesh, Vector3d};
use std::io::{BufRead, Write};

struct OffHeader {
    normals: bool,
    colors: bool,
}

impl OffHeader {
    fn parse(keyword: &str) -> Option<Self> {
        let upper = keyword.to_ascii_uppercase();
        let prefix = upper.strip_suffix("OFF")?;
        if !prefix.chars().all(|c| c == 'C' || c == 'N') {
            return None;
        }
        Some(Self {
            normals: prefix.contains('N'),
            colors: prefix.contains('C'),
        })
    }

    fn keyword(&self) -> String {
        format!(
            "{}{}OFF",
            if self.colors { "C" } else { "" },
            if self.normals { "N" } else { "" }
        )
    }
}

fn color_channel(token: &str, line: &Line<'_>) -> Result<f64> {
    let value: f64 = parse_token(token, line.number)?;
    let integral = !token.contains(['.', 'e', 'E']);
    Ok(if integral { value / 255.0 } else { value })
}

fn next_record<'r, R: BufRead + ?Sized>(records: &'r mut Records<'_, R>, what: &str) -> Result<Line<'r>> {
    records
        .next_line()?
        .ok_or_else(|| Error::parse(format!("OFF data ends before {}", what)))
}

pub(crate) fn read_triangle_mesh(reader: &mut dyn BufRead) -> Result<TriangleMesh> {
    let mut records = Records::new(reader);

    let first = next_record(&mut records, "the header")?;
    let tokens = first.tokens();
    let header = OffHeader::parse(tokens[0])
        .ok_or_else(|| first.error(format!("'{}' is not an OFF header", tokens[0])))?;

    // Counts either share the header line or follow on their own.
    let counts: Vec<usize> = if tokens.len() > 1 {
        tokens[1..].iter().map(|t| parse_token(t, first.number)).collect::<Result<_>>()?
    } else {
        let line = next_record(&mut records, "the element counts")?;
        line.tokens().iter().map(|t| parse_token(t, line.number)).collect::<Result<_>>()?
    };
    if counts.len() < 2 {
        return Err(Error::parse("OFF counts line needs vertex and face counts"));
    }
    let (vertex_count, face_count) = (counts[0], counts[1]);

    let mut mesh = TriangleMesh::new();
    mesh.vertices.reserve(vertex_count.min(1 << 20));
    for _ in 0..vertex_count {
        let line = next_record(&mut records, "all vertices are read")?;
        let values = line.tokens();
        let [x, y, z] = parse_floats(&values, line.number)?;
        mesh.vertices.push(Point3d::new(x, y, z));

        let mut rest = &values[3..];
        if header.normals {
            let [nx, ny, nz] = parse_floats(rest, line.number)?;
            mesh.normals.push(Vector3d::new(nx, ny, nz));
            rest = &rest[3..];
        }
        if header.colors {
            if rest.len() < 3 {
                return Err(line.error("vertex color needs three channels"));
            }
            mesh.colors.push(Color3d::new(
                color_channel(rest[0], &line)?,
                color_channel(rest[1], &line)?,
                color_channel(rest[2], &line)?,
            ));
        }
    }

    mesh.faces.reserve(face_count.min(1 << 20));
    for _ in 0..face_count {
        let line = next_record(&mut records, "all faces are read")?;
        let values = line.tokens();
        let corners: usize = parse_token(values[0], line.number)?;
        if corners >= values.len() {
            return Err(line.error(format!("face lists {} of {} corners", values.len() - 1, corners)));
        }
        // Anything after the corner list is a face color, which is dropped.
        let polygon = values[1..=corners]
            .iter()
            .map(|t| {
                let index: usize = parse_token(t, line.number)?;
                if index >= vertex_count {
                    return Err(line.error(format!("vertex index {} is outside 0..{}", index, vertex_count)));
                }
                Ok(index)
            })
            .collect::<Result<Vec<_>>>()?;
        fan_triangulate(&polygon, &mut mesh.faces)
            .map_err(|_| line.error(format!("face with {} corners", corners)))?;
    }
    Ok(mesh)
}

pub(crate) fn write_triangle_mesh(
    mesh: &TriangleMesh,
    options: &EncodeOptions,
    writer: &mut dyn Write,
) -> Result<()> {
    let header = OffHeader {
        normals: options.vertex_normals && mesh.has_normals(),
        colors: options.vertex_colors && mesh.has_colors(),
    };
    writeln!(writer, "{}", header.keyword())?;
    writeln!(writer, "{} {} 0", mesh.vertex_count(), mesh.face_count())?;

    for (i, v) in mesh.vertices.iter().enumerate() {
        write!(writer, "{} {} {}", fmt_f64(v.x), fmt_f64(v.y), fmt_f64(v.z))?;
        if header.normals {
            let n = &mesh.normals[i];
            write!(writer, " {} {} {}", fmt_f64(n.x), fmt_f64(n.y), fmt_f64(n.z))?;
        }
        if header.colors {
            let [r, g, b] = color_to_rgb8(&mesh.colors[i]);
            write!(writer, " {} {} {} 255", r, g, b)?;
        }
        writeln!(writer)?;
    }
    for [a, b, c] in &mesh.faces {
        writeln!(writer, "3 {} {} {}", a, b, c)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_variants() {
        assert!(OffHeader::parse("off").is_some());
        let header = OffHeader::parse("CNOFF").unwrap();
        assert!(header.colors && header.normals);
        assert_eq!(header.keyword(), "CNOFF");
        assert!(OffHeader::parse("PLY").is_none());
        assert!(OffHeader::parse("STOFF").is_none());
    }

    #[test]
    fn test_quad_with_comments_and_float_colors() {
        let data = "COFF\n# a unit quad\n4 1 0\n\
                    0 0 0 1.0 0.0 0.0 1.0\n1 0 0 0.0 1.0 0.0 1.0\n\
                    1 1 0 0.0 0.0 1.0 1.0\n0 1 0 0.5 0.5 0.5 1.0\n\
                    4 0 1 2 3 255 0 0\n";
        let mesh = read_triangle_mesh(&mut Cursor::new(data)).unwrap();
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(mesh.colors[3], Color3d::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_integer_colors_and_inline_counts() {
        let data = "COFF 3 1 0\n0 0 0 255 0 0 255\n1 0 0 0 255 0 255\n0 1 0 0 0 255 255\n3 0 1 2\n";
        let mesh = read_triangle_mesh(&mut Cursor::new(data)).unwrap();
        assert_eq!(mesh.colors[1], Color3d::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_truncated_and_out_of_range() {
        let missing_face = "OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n";
        assert!(matches!(read_triangle_mesh(&mut Cursor::new(missing_face)), Err(Error::Parse(_))));
        let bad_index = "OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 3\n";
        assert!(matches!(read_triangle_mesh(&mut Cursor::new(bad_index)), Err(Error::Parse(_))));
        let short_face = "OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n4 0 1 2\n";
        assert!(matches!(read_triangle_mesh(&mut Cursor::new(short_face)), Err(Error::Parse(_))));
        let huge_corners = "OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n18446744073709551615 0 1 2\n";
        assert!(matches!(read_triangle_mesh(&mut Cursor::new(huge_corners)), Err(Error::Parse(_))));
    }
}

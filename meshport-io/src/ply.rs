//! PLY format support
//!
//! Reads ASCII and both binary encodings, writes ASCII or binary little
//! endian. Geometry and normals are stored as doubles and colors as `uchar`.

use crate::error::from_ply;
use crate::options::EncodeOptions;
use meshport_core::{
    color_from_u8, color_to_rgb8, Color3d, Error, LineSet, Point3d, PointCloud, Result,
    TriangleMesh, Vector3d, Voxel, VoxelGrid,
};
use ply_rs::{
    parser::Parser,
    ply::{
        Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
        ScalarType,
    },
    writer::Writer,
};
use std::io::{BufRead, Write};

const POSITION: [&str; 3] = ["x", "y", "z"];
const NORMAL: [&str; 3] = ["nx", "ny", "nz"];
const COLOR: [&str; 3] = ["red", "green", "blue"];

fn parse(mut reader: &mut dyn BufRead) -> Result<Ply<DefaultElement>> {
    Parser::<DefaultElement>::new()
        .read_ply(&mut reader)
        .map_err(from_ply)
}

fn new_ply(options: &EncodeOptions) -> Ply<DefaultElement> {
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = if options.ascii {
        Encoding::Ascii
    } else {
        Encoding::BinaryLittleEndian
    };
    ply
}

fn write_ply(mut writer: &mut dyn Write, mut ply: Ply<DefaultElement>) -> Result<()> {
    Writer::new().write_ply(&mut writer, &mut ply).map_err(from_ply)?;
    Ok(())
}

/// Element declared in the header with all of `names` as properties
fn declares(ply: &Ply<DefaultElement>, element: &str, names: &[&str]) -> bool {
    ply.header
        .elements
        .get(element)
        .map_or(false, |def| names.iter().all(|n| def.properties.contains_key(*n)))
}

fn elements<'a>(ply: &'a Ply<DefaultElement>, name: &str) -> &'a [DefaultElement] {
    ply.payload.get(name).map(|items| items.as_slice()).unwrap_or(&[])
}

fn scalar(element: &DefaultElement, name: &str) -> Result<f64> {
    match element.get(name) {
        Some(Property::Char(v)) => Ok(*v as f64),
        Some(Property::UChar(v)) => Ok(*v as f64),
        Some(Property::Short(v)) => Ok(*v as f64),
        Some(Property::UShort(v)) => Ok(*v as f64),
        Some(Property::Int(v)) => Ok(*v as f64),
        Some(Property::UInt(v)) => Ok(*v as f64),
        Some(Property::Float(v)) => Ok(*v as f64),
        Some(Property::Double(v)) => Ok(*v),
        Some(_) => Err(Error::parse(format!("PLY property '{}' is a list, expected a scalar", name))),
        None => Err(Error::parse(format!("PLY property '{}' is missing", name))),
    }
}

fn vector(element: &DefaultElement, names: &[&str; 3]) -> Result<Vector3d> {
    Ok(Vector3d::new(
        scalar(element, names[0])?,
        scalar(element, names[1])?,
        scalar(element, names[2])?,
    ))
}

/// Integer channels are 8-bit, float channels are already in [0, 1]
fn color(element: &DefaultElement) -> Result<Color3d> {
    let mut rgb = Color3d::zeros();
    for (channel, name) in rgb.iter_mut().zip(COLOR) {
        *channel = match element.get(name) {
            Some(Property::UChar(v)) => color_from_u8(*v),
            Some(Property::Float(v)) => *v as f64,
            Some(Property::Double(v)) => *v,
            _ => scalar(element, name)? / 255.0,
        };
    }
    Ok(rgb)
}

fn index(element: &DefaultElement, name: &str, count: usize) -> Result<usize> {
    let value = scalar(element, name)?;
    if value < 0.0 || value.fract() != 0.0 || value as usize >= count {
        return Err(Error::parse(format!(
            "PLY index {} in '{}' is outside 0..{}",
            value, name, count
        )));
    }
    Ok(value as usize)
}

fn list_indices(element: &DefaultElement) -> Result<Vec<i64>> {
    let list = element
        .get("vertex_indices")
        .or_else(|| element.get("vertex_index"))
        .ok_or_else(|| Error::parse("PLY face has no vertex_indices list"))?;
    Ok(match list {
        Property::ListChar(v) => v.iter().map(|&i| i as i64).collect(),
        Property::ListUChar(v) => v.iter().map(|&i| i as i64).collect(),
        Property::ListShort(v) => v.iter().map(|&i| i as i64).collect(),
        Property::ListUShort(v) => v.iter().map(|&i| i as i64).collect(),
        Property::ListInt(v) => v.iter().map(|&i| i as i64).collect(),
        Property::ListUInt(v) => v.iter().map(|&i| i as i64).collect(),
        _ => return Err(Error::parse("PLY face indices must be an integer list")),
    })
}

/// Split a polygon into a triangle fan around its first corner
pub(crate) fn fan_triangulate(polygon: &[usize], faces: &mut Vec<[usize; 3]>) -> Result<()> {
    if polygon.len() < 3 {
        return Err(Error::parse(format!(
            "face with {} corners, at least 3 are required",
            polygon.len()
        )));
    }
    for i in 1..polygon.len() - 1 {
        faces.push([polygon[0], polygon[i], polygon[i + 1]]);
    }
    Ok(())
}

struct VertexBlock {
    points: Vec<Point3d>,
    normals: Vec<Vector3d>,
    colors: Vec<Color3d>,
}

fn read_vertices(ply: &Ply<DefaultElement>) -> Result<VertexBlock> {
    let vertices = elements(ply, "vertex");
    let with_normals = declares(ply, "vertex", &NORMAL);
    let with_colors = declares(ply, "vertex", &COLOR);

    let mut block = VertexBlock {
        points: Vec::with_capacity(vertices.len()),
        normals: Vec::new(),
        colors: Vec::new(),
    };
    for vertex in vertices {
        block.points.push(vector(vertex, &POSITION)?.into());
        if with_normals {
            block.normals.push(vector(vertex, &NORMAL)?);
        }
        if with_colors {
            block.colors.push(color(vertex)?);
        }
    }
    Ok(block)
}

fn add_properties(def: &mut ElementDef, names: &[&str], scalar: ScalarType) {
    for name in names {
        def.properties.add(PropertyDef::new(name.to_string(), PropertyType::Scalar(scalar.clone())));
    }
}

fn insert_doubles(element: &mut DefaultElement, names: &[&str; 3], values: &Vector3d) {
    for (name, value) in names.iter().zip(values.iter()) {
        element.insert(name.to_string(), Property::Double(*value));
    }
}

fn insert_color(element: &mut DefaultElement, color: &Color3d) {
    for (name, value) in COLOR.iter().zip(color_to_rgb8(color)) {
        element.insert(name.to_string(), Property::UChar(value));
    }
}

/// Vertex element definition and payload for the given attributes
fn vertex_element(
    points: &[Point3d],
    normals: Option<&[Vector3d]>,
    colors: Option<&[Color3d]>,
) -> (ElementDef, Vec<DefaultElement>) {
    let mut def = ElementDef::new("vertex".to_string());
    add_properties(&mut def, &POSITION, ScalarType::Double);
    if normals.is_some() {
        add_properties(&mut def, &NORMAL, ScalarType::Double);
    }
    if colors.is_some() {
        add_properties(&mut def, &COLOR, ScalarType::UChar);
    }

    let payload = points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let mut element = DefaultElement::new();
            insert_doubles(&mut element, &POSITION, &point.coords);
            if let Some(normals) = normals {
                insert_doubles(&mut element, &NORMAL, &normals[i]);
            }
            if let Some(colors) = colors {
                insert_color(&mut element, &colors[i]);
            }
            element
        })
        .collect();
    (def, payload)
}

fn push_element(ply: &mut Ply<DefaultElement>, def: ElementDef, payload: Vec<DefaultElement>) {
    ply.payload.insert(def.name.clone(), payload);
    ply.header.elements.add(def);
}

pub(crate) fn read_point_cloud(reader: &mut dyn BufRead) -> Result<PointCloud> {
    let ply = parse(reader)?;
    let block = read_vertices(&ply)?;
    Ok(PointCloud {
        points: block.points,
        normals: block.normals,
        colors: block.colors,
    })
}

pub(crate) fn write_point_cloud(
    cloud: &PointCloud,
    options: &EncodeOptions,
    writer: &mut dyn Write,
) -> Result<()> {
    let mut ply = new_ply(options);
    let (def, payload) = vertex_element(
        &cloud.points,
        cloud.has_normals().then_some(cloud.normals.as_slice()),
        cloud.has_colors().then_some(cloud.colors.as_slice()),
    );
    push_element(&mut ply, def, payload);
    write_ply(writer, ply)
}

pub(crate) fn read_triangle_mesh(reader: &mut dyn BufRead) -> Result<TriangleMesh> {
    let ply = parse(reader)?;
    let block = read_vertices(&ply)?;
    let count = block.points.len();

    let mut faces = Vec::with_capacity(elements(&ply, "face").len());
    for face in elements(&ply, "face") {
        let polygon = list_indices(face)?
            .into_iter()
            .map(|i| {
                if i < 0 || i as usize >= count {
                    Err(Error::parse(format!("PLY face index {} is outside 0..{}", i, count)))
                } else {
                    Ok(i as usize)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        fan_triangulate(&polygon, &mut faces)?;
    }

    Ok(TriangleMesh {
        vertices: block.points,
        faces,
        normals: block.normals,
        colors: block.colors,
    })
}

pub(crate) fn write_triangle_mesh(
    mesh: &TriangleMesh,
    options: &EncodeOptions,
    writer: &mut dyn Write,
) -> Result<()> {
    let mut ply = new_ply(options);
    let (def, payload) = vertex_element(
        &mesh.vertices,
        (options.vertex_normals && mesh.has_normals()).then_some(mesh.normals.as_slice()),
        (options.vertex_colors && mesh.has_colors()).then_some(mesh.colors.as_slice()),
    );
    push_element(&mut ply, def, payload);

    let mut def = ElementDef::new("face".to_string());
    def.properties.add(PropertyDef::new(
        "vertex_indices".to_string(),
        PropertyType::List(ScalarType::UChar, ScalarType::Int),
    ));
    let payload = mesh
        .faces
        .iter()
        .map(|face| {
            let mut element = DefaultElement::new();
            element.insert(
                "vertex_indices".to_string(),
                Property::ListInt(face.iter().map(|&i| i as i32).collect()),
            );
            element
        })
        .collect();
    push_element(&mut ply, def, payload);

    write_ply(writer, ply)
}

pub(crate) fn read_line_set(reader: &mut dyn BufRead) -> Result<LineSet> {
    let ply = parse(reader)?;
    let points = read_vertices(&ply)?.points;
    let count = points.len();
    let with_colors = declares(&ply, "edge", &COLOR);

    let edges = elements(&ply, "edge");
    let mut lines = Vec::with_capacity(edges.len());
    let mut colors = Vec::new();
    for edge in edges {
        lines.push([index(edge, "vertex1", count)?, index(edge, "vertex2", count)?]);
        if with_colors {
            colors.push(color(edge)?);
        }
    }
    Ok(LineSet { points, lines, colors })
}

pub(crate) fn write_line_set(
    lines: &LineSet,
    options: &EncodeOptions,
    writer: &mut dyn Write,
) -> Result<()> {
    let mut ply = new_ply(options);
    let (def, payload) = vertex_element(&lines.points, None, None);
    push_element(&mut ply, def, payload);

    let mut def = ElementDef::new("edge".to_string());
    add_properties(&mut def, &["vertex1", "vertex2"], ScalarType::Int);
    if lines.has_colors() {
        add_properties(&mut def, &COLOR, ScalarType::UChar);
    }
    let payload = lines
        .lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let mut element = DefaultElement::new();
            element.insert("vertex1".to_string(), Property::Int(line[0] as i32));
            element.insert("vertex2".to_string(), Property::Int(line[1] as i32));
            if lines.has_colors() {
                insert_color(&mut element, &lines.colors[i]);
            }
            element
        })
        .collect();
    push_element(&mut ply, def, payload);

    write_ply(writer, ply)
}

pub(crate) fn read_voxel_grid(reader: &mut dyn BufRead) -> Result<VoxelGrid> {
    let ply = parse(reader)?;

    let origin: Point3d = match elements(&ply, "origin").first() {
        Some(origin) => vector(origin, &POSITION)?.into(),
        None => Point3d::origin(),
    };
    let voxel_size = match elements(&ply, "voxel_size").first() {
        Some(size) => scalar(size, "val")?,
        None => 0.0,
    };

    let mut grid = VoxelGrid::new(voxel_size, origin);
    let with_colors = declares(&ply, "vertex", &COLOR);
    for vertex in elements(&ply, "vertex") {
        let mut grid_index = [0i32; 3];
        for (slot, name) in grid_index.iter_mut().zip(POSITION) {
            let value = scalar(vertex, name)?;
            if value.fract() != 0.0 || value < i32::MIN as f64 || value > i32::MAX as f64 {
                return Err(Error::parse(format!("voxel grid index {} is not an integer", value)));
            }
            *slot = value as i32;
        }
        grid.insert(if with_colors {
            Voxel::with_color(grid_index, color(vertex)?)
        } else {
            Voxel::new(grid_index)
        });
    }
    Ok(grid)
}

pub(crate) fn write_voxel_grid(
    grid: &VoxelGrid,
    options: &EncodeOptions,
    writer: &mut dyn Write,
) -> Result<()> {
    let mut ply = new_ply(options);

    let mut def = ElementDef::new("origin".to_string());
    add_properties(&mut def, &POSITION, ScalarType::Double);
    let mut origin = DefaultElement::new();
    insert_doubles(&mut origin, &POSITION, &grid.origin.coords);
    push_element(&mut ply, def, vec![origin]);

    let mut def = ElementDef::new("voxel_size".to_string());
    add_properties(&mut def, &["val"], ScalarType::Double);
    let mut size = DefaultElement::new();
    size.insert("val".to_string(), Property::Double(grid.voxel_size));
    push_element(&mut ply, def, vec![size]);

    // Colors are written when any voxel has one; the others get black.
    let with_colors = grid.has_colors();
    let mut def = ElementDef::new("vertex".to_string());
    add_properties(&mut def, &POSITION, ScalarType::Int);
    if with_colors {
        add_properties(&mut def, &COLOR, ScalarType::UChar);
    }
    let payload = grid
        .voxels
        .values()
        .map(|voxel| {
            let mut element = DefaultElement::new();
            for (name, value) in POSITION.iter().zip(voxel.grid_index) {
                element.insert(name.to_string(), Property::Int(value));
            }
            if with_colors {
                insert_color(&mut element, &voxel.color.unwrap_or_else(Color3d::zeros));
            }
            element
        })
        .collect();
    push_element(&mut ply, def, payload);

    write_ply(writer, ply)
}

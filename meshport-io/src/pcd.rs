//! PCD (Point Cloud Data) format support
//!
//! Reads `ascii`, `binary` and `binary_compressed` data with any field
//! layout; `x y z`, `normal_x normal_y normal_z` and a packed `rgb`/`rgba`
//! field are picked out, everything else is skipped. Writes single precision
//! geometry and a `U 4` packed color.

use crate::lzf;
use crate::options::EncodeOptions;
use crate::text::{parse_token, Records};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use meshport_core::{color_from_rgb8, color_to_rgb8, Color3d, Error, Point3d, PointCloud, Result, Vector3d};
use std::io::{BufRead, Read, Write};

/// PCD data format variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcdDataFormat {
    Ascii,
    Binary,
    BinaryCompressed,
}

impl PcdDataFormat {
    fn keyword(self) -> &'static str {
        match self {
            PcdDataFormat::Ascii => "ascii",
            PcdDataFormat::Binary => "binary",
            PcdDataFormat::BinaryCompressed => "binary_compressed",
        }
    }

    /// Data section written for the given options; ASCII wins over compression
    pub fn for_options(options: &EncodeOptions) -> Self {
        if options.ascii {
            PcdDataFormat::Ascii
        } else if options.compressed {
            PcdDataFormat::BinaryCompressed
        } else {
            PcdDataFormat::Binary
        }
    }
}

/// PCD field data types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcdFieldType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl PcdFieldType {
    fn from_type_and_size(kind: &str, size: usize) -> Result<Self> {
        Ok(match (kind, size) {
            ("I", 1) => PcdFieldType::I8,
            ("I", 2) => PcdFieldType::I16,
            ("I", 4) => PcdFieldType::I32,
            ("I", 8) => PcdFieldType::I64,
            ("U", 1) => PcdFieldType::U8,
            ("U", 2) => PcdFieldType::U16,
            ("U", 4) => PcdFieldType::U32,
            ("U", 8) => PcdFieldType::U64,
            ("F", 4) => PcdFieldType::F32,
            ("F", 8) => PcdFieldType::F64,
            _ => {
                return Err(Error::parse(format!(
                    "unknown PCD field type/size combination: {}/{}",
                    kind, size
                )))
            }
        })
    }

    fn size(self) -> usize {
        match self {
            PcdFieldType::I8 | PcdFieldType::U8 => 1,
            PcdFieldType::I16 | PcdFieldType::U16 => 2,
            PcdFieldType::I32 | PcdFieldType::U32 | PcdFieldType::F32 => 4,
            PcdFieldType::I64 | PcdFieldType::U64 | PcdFieldType::F64 => 8,
        }
    }

    fn is_float(self) -> bool {
        matches!(self, PcdFieldType::F32 | PcdFieldType::F64)
    }

    /// Decode one little-endian sample
    fn read(self, bytes: &[u8]) -> f64 {
        match self {
            PcdFieldType::I8 => bytes[0] as i8 as f64,
            PcdFieldType::U8 => bytes[0] as f64,
            PcdFieldType::I16 => LittleEndian::read_i16(bytes) as f64,
            PcdFieldType::U16 => LittleEndian::read_u16(bytes) as f64,
            PcdFieldType::I32 => LittleEndian::read_i32(bytes) as f64,
            PcdFieldType::U32 => LittleEndian::read_u32(bytes) as f64,
            PcdFieldType::I64 => LittleEndian::read_i64(bytes) as f64,
            PcdFieldType::U64 => LittleEndian::read_u64(bytes) as f64,
            PcdFieldType::F32 => LittleEndian::read_f32(bytes) as f64,
            PcdFieldType::F64 => LittleEndian::read_f64(bytes),
        }
    }
}

/// What a field contributes to the point cloud
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Position(usize),
    Normal(usize),
    Rgb,
    Skip,
}

impl Role {
    fn from_name(name: &str) -> Self {
        match name {
            "x" => Role::Position(0),
            "y" => Role::Position(1),
            "z" => Role::Position(2),
            "normal_x" => Role::Normal(0),
            "normal_y" => Role::Normal(1),
            "normal_z" => Role::Normal(2),
            "rgb" | "rgba" => Role::Rgb,
            _ => Role::Skip,
        }
    }
}

/// PCD field definition
#[derive(Debug, Clone)]
pub struct PcdField {
    pub name: String,
    pub field_type: PcdFieldType,
    pub count: usize,
}

impl PcdField {
    /// Bytes occupied by one point's worth of this field
    fn stride(&self) -> usize {
        self.field_type.size() * self.count
    }

    fn checked_stride(&self) -> Option<usize> {
        self.field_type.size().checked_mul(self.count)
    }
}

/// PCD header information
#[derive(Debug, Clone)]
pub struct PcdHeader {
    pub version: String,
    pub fields: Vec<PcdField>,
    pub width: usize,
    pub height: usize,
    pub viewpoint: [f64; 7],
    pub points: usize,
    pub data_format: PcdDataFormat,
}

impl PcdHeader {
    fn point_size(&self) -> usize {
        self.fields.iter().map(PcdField::stride).sum()
    }

    /// Byte length of the binary data section. [`read_header`] only returns
    /// headers for which this succeeds, so the unchecked size helpers above
    /// cannot overflow on a parsed header.
    fn data_size(&self) -> Result<usize> {
        self.fields
            .iter()
            .try_fold(0usize, |total, field| total.checked_add(field.checked_stride()?))
            .and_then(|point_size| point_size.checked_mul(self.points))
            .ok_or_else(|| Error::parse("PCD data size overflows"))
    }

    fn roles(&self) -> Vec<Role> {
        self.fields.iter().map(|f| Role::from_name(&f.name)).collect()
    }

    fn has_normals(&self) -> bool {
        let roles = self.roles();
        (0..3).all(|axis| roles.contains(&Role::Normal(axis)))
    }

    fn has_colors(&self) -> bool {
        self.roles().contains(&Role::Rgb)
    }
}

fn parse_list(values: &[&str], line: usize) -> Result<Vec<usize>> {
    values.iter().map(|v| parse_token(v, line)).collect()
}

/// Read the header, leaving `reader` at the first byte of the data section
pub fn read_header<R: BufRead + ?Sized>(reader: &mut R) -> Result<PcdHeader> {
    let mut records = Records::new(reader);

    let mut version = String::from("0.7");
    let mut names: Vec<String> = Vec::new();
    let mut sizes: Vec<usize> = Vec::new();
    let mut types: Vec<String> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();
    let mut width: Option<usize> = None;
    let mut height: usize = 1;
    let mut viewpoint = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0];
    let mut points: Option<usize> = None;

    let data_format = loop {
        let record = match records.next_line()? {
            Some(record) => record,
            None => return Err(Error::parse("unexpected end of file in PCD header")),
        };
        let line = record.number;
        let tokens = record.tokens();
        let (keyword, values) = (tokens[0], &tokens[1..]);
        match keyword.to_ascii_uppercase().as_str() {
            "VERSION" => {
                if let Some(v) = values.first() {
                    version = v.to_string();
                }
            }
            "FIELDS" => names = values.iter().map(|v| v.to_string()).collect(),
            "SIZE" => sizes = parse_list(values, line)?,
            "TYPE" => types = values.iter().map(|v| v.to_ascii_uppercase()).collect(),
            "COUNT" => counts = parse_list(values, line)?,
            "WIDTH" => width = values.first().map(|v| parse_token(v, line)).transpose()?,
            "HEIGHT" => height = values.first().map(|v| parse_token(v, line)).transpose()?.unwrap_or(1),
            "VIEWPOINT" => {
                for (slot, value) in viewpoint.iter_mut().zip(values) {
                    *slot = parse_token(value, line)?;
                }
            }
            "POINTS" => points = values.first().map(|v| parse_token(v, line)).transpose()?,
            "DATA" => {
                break match values.first().map(|v| v.to_ascii_lowercase()).as_deref() {
                    Some("ascii") => PcdDataFormat::Ascii,
                    Some("binary") => PcdDataFormat::Binary,
                    Some("binary_compressed") => PcdDataFormat::BinaryCompressed,
                    other => {
                        return Err(record.error(format!("unknown PCD DATA type {:?}", other)))
                    }
                };
            }
            _ => log::debug!("ignoring PCD header keyword '{}'", keyword),
        }
    };

    if names.is_empty() {
        return Err(Error::parse("PCD header declares no FIELDS"));
    }
    if counts.is_empty() {
        counts = vec![1; names.len()];
    }
    if sizes.len() != names.len() || types.len() != names.len() || counts.len() != names.len() {
        return Err(Error::parse("mismatch between PCD FIELDS, SIZE, TYPE and COUNT declarations"));
    }

    let fields = names
        .into_iter()
        .zip(types.iter().zip(sizes.iter().zip(counts.iter())))
        .map(|(name, (kind, (&size, &count)))| {
            if count == 0 {
                return Err(Error::parse(format!("PCD field '{}' has COUNT 0", name)));
            }
            Ok(PcdField {
                name,
                field_type: PcdFieldType::from_type_and_size(kind, size)?,
                count,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let width = width.ok_or_else(|| Error::parse("missing WIDTH in PCD header"))?;
    let cells = width
        .checked_mul(height)
        .ok_or_else(|| Error::parse("PCD WIDTH * HEIGHT overflows"))?;
    let points = points.unwrap_or(cells);
    if points != cells {
        return Err(Error::parse(format!(
            "PCD POINTS ({}) doesn't match WIDTH * HEIGHT ({})",
            points, cells
        )));
    }

    let header = PcdHeader {
        version,
        fields,
        width,
        height,
        viewpoint,
        points,
        data_format,
    };
    for (field, role) in header.fields.iter().zip(header.roles()) {
        if role == Role::Rgb && field.field_type.size() != 4 {
            return Err(Error::parse(format!("PCD color field '{}' must be 4 bytes", field.name)));
        }
    }
    header.data_size()?;
    Ok(header)
}

/// Accumulates decoded fields into the point cloud
struct PointSink {
    roles: Vec<Role>,
    cloud: PointCloud,
    with_normals: bool,
    with_colors: bool,
}

impl PointSink {
    fn new(header: &PcdHeader) -> Self {
        // Bounded so a lying header cannot force a huge allocation up front.
        let capacity = header.points.min(1 << 20);
        let with_normals = header.has_normals();
        let with_colors = header.has_colors();
        Self {
            roles: header.roles(),
            cloud: PointCloud {
                points: Vec::with_capacity(capacity),
                normals: Vec::with_capacity(if with_normals { capacity } else { 0 }),
                colors: Vec::with_capacity(if with_colors { capacity } else { 0 }),
            },
            with_normals,
            with_colors,
        }
    }

    fn push(&mut self, position: Vector3d, normal: Vector3d, rgb: u32) {
        self.cloud.points.push(Point3d::from(position));
        if self.with_normals {
            self.cloud.normals.push(normal);
        }
        if self.with_colors {
            self.cloud.colors.push(unpack_rgb(rgb));
        }
    }
}

fn unpack_rgb(rgb: u32) -> Color3d {
    color_from_rgb8([(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8])
}

fn pack_rgb(color: &Color3d) -> u32 {
    let [r, g, b] = color_to_rgb8(color);
    (r as u32) << 16 | (g as u32) << 8 | b as u32
}

fn read_ascii<R: BufRead + ?Sized>(reader: &mut R, header: &PcdHeader, sink: &mut PointSink) -> Result<()> {
    let mut records = Records::new(reader);
    while sink.cloud.len() < header.points {
        let record = match records.next_line()? {
            Some(record) => record,
            None => {
                return Err(Error::parse(format!(
                    "PCD data ends after {} of {} points",
                    sink.cloud.len(),
                    header.points
                )))
            }
        };
        let line = record.number;
        let values = record.tokens();

        let mut position = Vector3d::zeros();
        let mut normal = Vector3d::zeros();
        let mut rgb = 0u32;
        let mut cursor = 0;
        for (field, role) in header.fields.iter().zip(&sink.roles) {
            let first = *values
                .get(cursor)
                .ok_or_else(|| record.error("not enough values for the PCD fields"))?;
            cursor += field.count;
            match role {
                Role::Position(axis) => position[*axis] = parse_token(first, line)?,
                Role::Normal(axis) => normal[*axis] = parse_token(first, line)?,
                Role::Rgb if field.field_type.is_float() => {
                    rgb = parse_token::<f32>(first, line)?.to_bits();
                }
                Role::Rgb => rgb = parse_token::<f64>(first, line)? as u32,
                Role::Skip => {}
            }
        }
        if cursor > values.len() {
            return Err(record.error("not enough values for the PCD fields"));
        }
        sink.push(position, normal, rgb);
    }
    Ok(())
}

fn decode_point(data: &[u8], offsets: &[usize], header: &PcdHeader, sink: &mut PointSink) {
    let mut position = Vector3d::zeros();
    let mut normal = Vector3d::zeros();
    let mut rgb = 0u32;
    for ((field, role), &offset) in header.fields.iter().zip(&sink.roles).zip(offsets) {
        let bytes = &data[offset..offset + field.field_type.size()];
        match role {
            Role::Position(axis) => position[*axis] = field.field_type.read(bytes),
            Role::Normal(axis) => normal[*axis] = field.field_type.read(bytes),
            Role::Rgb => rgb = LittleEndian::read_u32(bytes),
            Role::Skip => {}
        }
    }
    sink.push(position, normal, rgb);
}

/// Read exactly `len` bytes without trusting `len` for the allocation
fn read_block<R: Read + ?Sized>(reader: &mut R, len: usize, what: &str) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    reader.take(len as u64).read_to_end(&mut data)?;
    if data.len() != len {
        return Err(Error::parse(format!(
            "PCD {} truncated: {} of {} bytes",
            what,
            data.len(),
            len
        )));
    }
    Ok(data)
}

fn read_binary<R: Read + ?Sized>(reader: &mut R, header: &PcdHeader, sink: &mut PointSink) -> Result<()> {
    let point_size = header.point_size();
    let data = read_block(reader, header.data_size()?, "binary data")?;

    let mut offsets = Vec::with_capacity(header.fields.len());
    let mut offset = 0;
    for field in &header.fields {
        offsets.push(offset);
        offset += field.stride();
    }

    for point in data.chunks_exact(point_size.max(1)).take(header.points) {
        decode_point(point, &offsets, header, sink);
    }
    Ok(())
}

fn read_compressed<R: Read + ?Sized>(reader: &mut R, header: &PcdHeader, sink: &mut PointSink) -> Result<()> {
    let compressed_size = reader.read_u32::<LittleEndian>()? as usize;
    let uncompressed_size = reader.read_u32::<LittleEndian>()? as usize;
    let expected = header.data_size()?;
    if uncompressed_size != expected {
        return Err(Error::parse(format!(
            "PCD compressed block expands to {} bytes, header needs {}",
            uncompressed_size, expected
        )));
    }
    let compressed = read_block(reader, compressed_size, "compressed data")?;
    let data = lzf::decompress(&compressed, uncompressed_size)?;

    // Field-major layout: all points of field 0, then all points of field 1...
    let mut starts = Vec::with_capacity(header.fields.len());
    let mut start = 0;
    for field in &header.fields {
        starts.push(start);
        start += field.stride() * header.points;
    }

    let mut offsets = vec![0; header.fields.len()];
    for point in 0..header.points {
        for ((offset, &start), field) in offsets.iter_mut().zip(&starts).zip(&header.fields) {
            *offset = start + point * field.stride();
        }
        decode_point(&data, &offsets, header, sink);
    }
    Ok(())
}

pub(crate) fn read_point_cloud(reader: &mut dyn BufRead) -> Result<PointCloud> {
    let header = read_header(reader)?;
    log::debug!(
        "PCD v{}: {} points, {} fields, {:?}",
        header.version,
        header.points,
        header.fields.len(),
        header.data_format
    );

    let mut sink = PointSink::new(&header);
    match header.data_format {
        PcdDataFormat::Ascii => read_ascii(reader, &header, &mut sink)?,
        PcdDataFormat::Binary => read_binary(reader, &header, &mut sink)?,
        PcdDataFormat::BinaryCompressed => read_compressed(reader, &header, &mut sink)?,
    }
    Ok(sink.cloud)
}

/// Header that [`write_point_cloud`] emits for `cloud`
fn header_for(cloud: &PointCloud, data_format: PcdDataFormat) -> PcdHeader {
    let float = |name: &str| PcdField {
        name: name.to_string(),
        field_type: PcdFieldType::F32,
        count: 1,
    };
    let mut fields = vec![float("x"), float("y"), float("z")];
    if cloud.has_normals() {
        fields.extend([float("normal_x"), float("normal_y"), float("normal_z")]);
    }
    if cloud.has_colors() {
        fields.push(PcdField {
            name: "rgb".to_string(),
            field_type: PcdFieldType::U32,
            count: 1,
        });
    }
    PcdHeader {
        version: "0.7".to_string(),
        fields,
        width: cloud.len(),
        height: 1,
        viewpoint: [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
        points: cloud.len(),
        data_format,
    }
}

fn write_header(writer: &mut dyn Write, header: &PcdHeader) -> Result<()> {
    let column = |f: &dyn Fn(&PcdField) -> String| {
        header.fields.iter().map(f).collect::<Vec<_>>().join(" ")
    };
    writeln!(writer, "# .PCD v{} - Point Cloud Data file format", header.version)?;
    writeln!(writer, "VERSION {}", header.version)?;
    writeln!(writer, "FIELDS {}", column(&|f| f.name.clone()))?;
    writeln!(writer, "SIZE {}", column(&|f| f.field_type.size().to_string()))?;
    writeln!(
        writer,
        "TYPE {}",
        column(&|f| if f.field_type.is_float() { "F" } else { "U" }.to_string())
    )?;
    writeln!(writer, "COUNT {}", column(&|f| f.count.to_string()))?;
    writeln!(writer, "WIDTH {}", header.width)?;
    writeln!(writer, "HEIGHT {}", header.height)?;
    let viewpoint: Vec<String> = header.viewpoint.iter().map(|v| v.to_string()).collect();
    writeln!(writer, "VIEWPOINT {}", viewpoint.join(" "))?;
    writeln!(writer, "POINTS {}", header.points)?;
    writeln!(writer, "DATA {}", header.data_format.keyword())?;
    Ok(())
}

/// Per-point values in header field order: f32 components then the packed color
fn point_record(cloud: &PointCloud, i: usize) -> (Vec<f32>, Option<u32>) {
    let mut floats: Vec<f32> = cloud.points[i].iter().map(|&c| c as f32).collect();
    if cloud.has_normals() {
        floats.extend(cloud.normals[i].iter().map(|&c| c as f32));
    }
    let rgb = cloud.has_colors().then(|| pack_rgb(&cloud.colors[i]));
    (floats, rgb)
}

pub(crate) fn write_point_cloud(
    cloud: &PointCloud,
    options: &EncodeOptions,
    writer: &mut dyn Write,
) -> Result<()> {
    let header = header_for(cloud, PcdDataFormat::for_options(options));
    write_header(writer, &header)?;

    match header.data_format {
        PcdDataFormat::Ascii => {
            for i in 0..cloud.len() {
                let (floats, rgb) = point_record(cloud, i);
                let mut fields: Vec<String> = floats.iter().map(|v| v.to_string()).collect();
                fields.extend(rgb.map(|c| c.to_string()));
                writeln!(writer, "{}", fields.join(" "))?;
            }
        }
        PcdDataFormat::Binary => {
            let mut data = Vec::with_capacity(cloud.len() * header.point_size());
            for i in 0..cloud.len() {
                let (floats, rgb) = point_record(cloud, i);
                for v in floats {
                    data.write_f32::<LittleEndian>(v)?;
                }
                if let Some(rgb) = rgb {
                    data.write_u32::<LittleEndian>(rgb)?;
                }
            }
            writer.write_all(&data)?;
        }
        PcdDataFormat::BinaryCompressed => {
            let mut columns: Vec<Vec<u8>> = vec![Vec::with_capacity(cloud.len() * 4); header.fields.len()];
            for i in 0..cloud.len() {
                let (floats, rgb) = point_record(cloud, i);
                for (column, v) in columns.iter_mut().zip(&floats) {
                    column.write_f32::<LittleEndian>(*v)?;
                }
                if let Some(rgb) = rgb {
                    columns[floats.len()].write_u32::<LittleEndian>(rgb)?;
                }
            }
            let data = columns.concat();
            let compressed = lzf::compress(&data);
            writer.write_u32::<LittleEndian>(compressed.len() as u32)?;
            writer.write_u32::<LittleEndian>(data.len() as u32)?;
            writer.write_all(&compressed)?;
        }
    }
    Ok(())
}

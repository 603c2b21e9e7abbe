//! Plain-text point formats: XYZ, XYZN, XYZRGB and PTS
//!
//! One point per line. XYZ-family floats are written in their shortest
//! round-trip form so a write/read cycle is lossless; PTS stores colors as
//! 0-255 integers and may carry an intensity column that is discarded.

use crate::text::{fmt_f64, parse_floats, parse_token, Records};
use meshport_core::{color_to_rgb8, Color3d, Error, Point3d, PointCloud, Result, Vector3d};
use std::io::{BufRead, Write};

/// Columns following `x y z` in the XYZ family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum XyzLayout {
    Xyz,
    Xyzn,
    Xyzrgb,
}

impl XyzLayout {
    fn columns(self) -> &'static str {
        match self {
            XyzLayout::Xyz => "x y z",
            XyzLayout::Xyzn => "x y z nx ny nz",
            XyzLayout::Xyzrgb => "x y z r g b",
        }
    }
}

pub(crate) fn read_xyz(reader: &mut dyn BufRead, layout: XyzLayout) -> Result<PointCloud> {
    let mut records = Records::new(reader);
    let mut cloud = PointCloud::new();

    while let Some(record) = records.next_line()? {
        let values = record.tokens();
        match layout {
            XyzLayout::Xyz => {
                let [x, y, z] = parse_floats(&values, record.number)?;
                cloud.points.push(Point3d::new(x, y, z));
            }
            XyzLayout::Xyzn => {
                let [x, y, z, nx, ny, nz] = parse_floats(&values, record.number)?;
                cloud.points.push(Point3d::new(x, y, z));
                cloud.normals.push(Vector3d::new(nx, ny, nz));
            }
            XyzLayout::Xyzrgb => {
                let [x, y, z, r, g, b] = parse_floats(&values, record.number)?;
                cloud.points.push(Point3d::new(x, y, z));
                cloud.colors.push(Color3d::new(r, g, b));
            }
        }
    }
    Ok(cloud)
}

pub(crate) fn write_xyz(cloud: &PointCloud, layout: XyzLayout, writer: &mut dyn Write) -> Result<()> {
    let missing = match layout {
        XyzLayout::Xyz => false,
        XyzLayout::Xyzn => !cloud.has_normals(),
        XyzLayout::Xyzrgb => !cloud.has_colors(),
    };
    if missing && !cloud.is_empty() {
        return Err(Error::Unsupported(format!(
            "point cloud lacks the attributes needed for '{}' columns",
            layout.columns()
        )));
    }

    for (i, p) in cloud.points.iter().enumerate() {
        let extra = match layout {
            XyzLayout::Xyz => None,
            XyzLayout::Xyzn => Some(&cloud.normals[i]),
            XyzLayout::Xyzrgb => Some(&cloud.colors[i]),
        };
        write!(writer, "{} {} {}", fmt_f64(p.x), fmt_f64(p.y), fmt_f64(p.z))?;
        if let Some(v) = extra {
            write!(writer, " {} {} {}", fmt_f64(v.x), fmt_f64(v.y), fmt_f64(v.z))?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// PTS column layouts, told apart by the number of values on a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PtsLayout {
    Xyz,
    XyzI,
    XyzRgb,
    XyzIRgb,
}

impl PtsLayout {
    fn from_count(count: usize) -> Option<Self> {
        match count {
            3 => Some(PtsLayout::Xyz),
            4 | 5 => Some(PtsLayout::XyzI),
            6 => Some(PtsLayout::XyzRgb),
            n if n >= 7 => Some(PtsLayout::XyzIRgb),
            _ => None,
        }
    }

    fn width(self) -> usize {
        match self {
            PtsLayout::Xyz => 3,
            PtsLayout::XyzI => 4,
            PtsLayout::XyzRgb => 6,
            PtsLayout::XyzIRgb => 7,
        }
    }

    fn color_column(self) -> Option<usize> {
        match self {
            PtsLayout::XyzRgb => Some(3),
            PtsLayout::XyzIRgb => Some(4),
            _ => None,
        }
    }
}

fn channel(token: &str, line: usize) -> Result<f64> {
    let value: f64 = parse_token(token, line)?;
    Ok((value / 255.0).clamp(0.0, 1.0))
}

pub(crate) fn read_pts(reader: &mut dyn BufRead) -> Result<PointCloud> {
    let mut records = Records::new(reader);
    let mut cloud = PointCloud::new();
    let mut columns = None;
    let mut first = true;

    while let Some(record) = records.next_line()? {
        let values = record.tokens();
        // An optional leading line holds only the point count.
        if std::mem::take(&mut first) && values.len() == 1 {
            let count: usize = parse_token(values[0], record.number)?;
            cloud.points.reserve(count.min(1 << 20));
            continue;
        }

        let layout = match columns {
            Some(layout) => layout,
            None => {
                let layout = PtsLayout::from_count(values.len()).ok_or_else(|| {
                    record.error(format!("{} values is not a PTS point", values.len()))
                })?;
                columns = Some(layout);
                layout
            }
        };
        if values.len() < layout.width() {
            return Err(record.error(format!(
                "expected {} values, found {}",
                layout.width(),
                values.len()
            )));
        }

        let [x, y, z] = parse_floats(&values, record.number)?;
        cloud.points.push(Point3d::new(x, y, z));
        if let Some(c) = layout.color_column() {
            cloud.colors.push(Color3d::new(
                channel(values[c], record.number)?,
                channel(values[c + 1], record.number)?,
                channel(values[c + 2], record.number)?,
            ));
        }
    }
    Ok(cloud)
}

pub(crate) fn write_pts(cloud: &PointCloud, writer: &mut dyn Write) -> Result<()> {
    writeln!(writer, "{}", cloud.len())?;
    for (i, p) in cloud.points.iter().enumerate() {
        write!(writer, "{} {} {}", fmt_f64(p.x), fmt_f64(p.y), fmt_f64(p.z))?;
        if cloud.has_colors() {
            let [r, g, b] = color_to_rgb8(&cloud.colors[i]);
            write!(writer, " {} {} {}", r, g, b)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

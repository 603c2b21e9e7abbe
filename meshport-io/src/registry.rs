//! Static format registry
//!
//! Every (kind, format) pair that meshport can read and write is listed once
//! in [`FORMAT_TABLE`]. The table is plain `static` data: there is no runtime
//! registration, so lookups are lock-free and safe from any thread.

use meshport_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of entity a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    PointCloud,
    TriangleMesh,
    LineSet,
    VoxelGrid,
    Image,
    PinholeCameraIntrinsic,
    PinholeCameraParameters,
    PinholeCameraTrajectory,
    Feature,
    PoseGraph,
}

impl Kind {
    pub const ALL: [Kind; 10] = [
        Kind::PointCloud,
        Kind::TriangleMesh,
        Kind::LineSet,
        Kind::VoxelGrid,
        Kind::Image,
        Kind::PinholeCameraIntrinsic,
        Kind::PinholeCameraParameters,
        Kind::PinholeCameraTrajectory,
        Kind::Feature,
        Kind::PoseGraph,
    ];

    /// Snake-case name, as used in `read_<kind>` / `write_<kind>`
    pub fn name(self) -> &'static str {
        match self {
            Kind::PointCloud => "point_cloud",
            Kind::TriangleMesh => "triangle_mesh",
            Kind::LineSet => "line_set",
            Kind::VoxelGrid => "voxel_grid",
            Kind::Image => "image",
            Kind::PinholeCameraIntrinsic => "pinhole_camera_intrinsic",
            Kind::PinholeCameraParameters => "pinhole_camera_parameters",
            Kind::PinholeCameraTrajectory => "pinhole_camera_trajectory",
            Kind::Feature => "feature",
            Kind::PoseGraph => "pose_graph",
        }
    }

    pub fn from_name(name: &str) -> Option<Kind> {
        Kind::ALL.into_iter().find(|k| k.name().eq_ignore_ascii_case(name))
    }

    /// Format used when sniffing finds no known extension
    pub fn default_format(self) -> Format {
        match self {
            Kind::PointCloud | Kind::TriangleMesh | Kind::LineSet | Kind::VoxelGrid => Format::Ply,
            Kind::Image => Format::Png,
            Kind::Feature => Format::Bin,
            Kind::PinholeCameraIntrinsic
            | Kind::PinholeCameraParameters
            | Kind::PinholeCameraTrajectory
            | Kind::PoseGraph => Format::Json,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Closed set of file encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Ply,
    Pcd,
    Xyz,
    Xyzn,
    Xyzrgb,
    Pts,
    Obj,
    Stl,
    Off,
    Png,
    Jpg,
    Json,
    Log,
    Tum,
    Bin,
}

impl Format {
    /// Canonical lowercase tag
    pub fn tag(self) -> &'static str {
        match self {
            Format::Ply => "ply",
            Format::Pcd => "pcd",
            Format::Xyz => "xyz",
            Format::Xyzn => "xyzn",
            Format::Xyzrgb => "xyzrgb",
            Format::Pts => "pts",
            Format::Obj => "obj",
            Format::Stl => "stl",
            Format::Off => "off",
            Format::Png => "png",
            Format::Jpg => "jpg",
            Format::Json => "json",
            Format::Log => "log",
            Format::Tum => "tum",
            Format::Bin => "bin",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A write option a codec may or may not act on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteFlag {
    Ascii,
    Compressed,
    VertexNormals,
    VertexColors,
    Quality,
}

impl WriteFlag {
    pub fn name(self) -> &'static str {
        match self {
            WriteFlag::Ascii => "write_ascii",
            WriteFlag::Compressed => "compressed",
            WriteFlag::VertexNormals => "write_vertex_normals",
            WriteFlag::VertexColors => "write_vertex_colors",
            WriteFlag::Quality => "quality",
        }
    }
}

/// One row of the capability table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatEntry {
    pub kind: Kind,
    pub format: Format,
    /// Extra tags and extensions accepted for this entry
    pub aliases: &'static [&'static str],
    /// Write flags this codec acts on; any other flag is silently ignored
    pub honours: &'static [WriteFlag],
    /// What a round trip through this format preserves
    pub precision: &'static str,
}

impl FormatEntry {
    pub fn tag(&self) -> &'static str {
        self.format.tag()
    }

    /// Case-insensitive match against the canonical tag and the aliases
    pub fn matches(&self, tag: &str) -> bool {
        self.tag().eq_ignore_ascii_case(tag) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(tag))
    }

    pub fn honours(&self, flag: WriteFlag) -> bool {
        self.honours.contains(&flag)
    }
}

const NO_FLAGS: &[WriteFlag] = &[];

pub static FORMAT_TABLE: &[FormatEntry] = &[
    FormatEntry {
        kind: Kind::PointCloud,
        format: Format::Ply,
        aliases: &[],
        honours: &[WriteFlag::Ascii],
        precision: "f64 geometry and normals, 8-bit colors",
    },
    FormatEntry {
        kind: Kind::PointCloud,
        format: Format::Pcd,
        aliases: &[],
        honours: &[WriteFlag::Ascii, WriteFlag::Compressed],
        precision: "f32 geometry and normals, 8-bit colors",
    },
    FormatEntry {
        kind: Kind::PointCloud,
        format: Format::Xyz,
        aliases: &[],
        honours: NO_FLAGS,
        precision: "lossless geometry, no normals or colors",
    },
    FormatEntry {
        kind: Kind::PointCloud,
        format: Format::Xyzn,
        aliases: &[],
        honours: NO_FLAGS,
        precision: "lossless geometry and normals, no colors",
    },
    FormatEntry {
        kind: Kind::PointCloud,
        format: Format::Xyzrgb,
        aliases: &[],
        honours: NO_FLAGS,
        precision: "lossless geometry and colors, no normals",
    },
    FormatEntry {
        kind: Kind::PointCloud,
        format: Format::Pts,
        aliases: &[],
        honours: NO_FLAGS,
        precision: "lossless geometry, 8-bit colors, no normals",
    },
    FormatEntry {
        kind: Kind::TriangleMesh,
        format: Format::Ply,
        aliases: &[],
        honours: &[WriteFlag::Ascii, WriteFlag::VertexNormals, WriteFlag::VertexColors],
        precision: "f64 geometry and normals, 8-bit colors",
    },
    FormatEntry {
        kind: Kind::TriangleMesh,
        format: Format::Obj,
        aliases: &[],
        honours: &[WriteFlag::VertexNormals, WriteFlag::VertexColors],
        precision: "lossless geometry, normals and colors",
    },
    FormatEntry {
        kind: Kind::TriangleMesh,
        format: Format::Stl,
        aliases: &[],
        honours: &[WriteFlag::Ascii],
        precision: "f32 geometry, unshared vertices, no normals or colors",
    },
    FormatEntry {
        kind: Kind::TriangleMesh,
        format: Format::Off,
        aliases: &[],
        honours: &[WriteFlag::VertexNormals, WriteFlag::VertexColors],
        precision: "lossless geometry and normals, 8-bit colors",
    },
    FormatEntry {
        kind: Kind::LineSet,
        format: Format::Ply,
        aliases: &[],
        honours: &[WriteFlag::Ascii],
        precision: "f64 geometry, 8-bit line colors",
    },
    FormatEntry {
        kind: Kind::VoxelGrid,
        format: Format::Ply,
        aliases: &[],
        honours: &[WriteFlag::Ascii],
        precision: "f64 origin and size, 8-bit colors",
    },
    FormatEntry {
        kind: Kind::Image,
        format: Format::Png,
        aliases: &[],
        honours: NO_FLAGS,
        precision: "lossless, 8/16-bit, 1-4 channels",
    },
    FormatEntry {
        kind: Kind::Image,
        format: Format::Jpg,
        aliases: &["jpeg"],
        honours: &[WriteFlag::Quality],
        precision: "lossy, 8-bit, 1 or 3 channels",
    },
    FormatEntry {
        kind: Kind::PinholeCameraIntrinsic,
        format: Format::Json,
        aliases: &[],
        honours: NO_FLAGS,
        precision: "lossless",
    },
    FormatEntry {
        kind: Kind::PinholeCameraParameters,
        format: Format::Json,
        aliases: &[],
        honours: NO_FLAGS,
        precision: "lossless",
    },
    FormatEntry {
        kind: Kind::PinholeCameraTrajectory,
        format: Format::Json,
        aliases: &[],
        honours: NO_FLAGS,
        precision: "lossless",
    },
    FormatEntry {
        kind: Kind::PinholeCameraTrajectory,
        format: Format::Log,
        aliases: &[],
        honours: NO_FLAGS,
        precision: "poses at 8 decimals, intrinsics not stored",
    },
    FormatEntry {
        kind: Kind::PinholeCameraTrajectory,
        format: Format::Tum,
        aliases: &["txt"],
        honours: NO_FLAGS,
        precision: "poses as translation + quaternion, intrinsics not stored",
    },
    FormatEntry {
        kind: Kind::Feature,
        format: Format::Bin,
        aliases: &[],
        honours: NO_FLAGS,
        precision: "lossless",
    },
    FormatEntry {
        kind: Kind::PoseGraph,
        format: Format::Json,
        aliases: &[],
        honours: NO_FLAGS,
        precision: "lossless",
    },
];

/// Find the codec entry for `kind` and an explicit (non-`auto`) tag
pub fn lookup(kind: Kind, tag: &str) -> Result<&'static FormatEntry> {
    formats_for(kind)
        .find(|entry| entry.matches(tag))
        .ok_or_else(|| Error::UnsupportedFormat(format!("no {} codec for format '{}'", kind, tag)))
}

/// All entries registered for `kind`, in table order
pub fn formats_for(kind: Kind) -> impl Iterator<Item = &'static FormatEntry> {
    FORMAT_TABLE.iter().filter(move |entry| entry.kind == kind)
}

/// Entry of the format used for `kind` when nothing better is known
pub fn default_entry(kind: Kind) -> Option<&'static FormatEntry> {
    let format = kind.default_format();
    formats_for(kind).find(|entry| entry.format == format)
}

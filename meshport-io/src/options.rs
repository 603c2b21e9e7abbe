//! Read and write options, and their normalization for codecs
//!
//! Every facade operation takes one of the option structs below. Before
//! encoding, the facade turns them into an [`EncodeOptions`], the single
//! flag set codecs look at. Flags a codec cannot act on are ignored, never
//! rejected; [`EncodeOptions::ignored_by`] reports which ones were dropped.

use crate::registry::{FormatEntry, WriteFlag};
use crate::sniff::AUTO;
use serde::{Deserialize, Serialize};

pub const DEFAULT_QUALITY: i32 = 90;

fn auto() -> String {
    AUTO.to_string()
}

/// Options for reads of every kind except point clouds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    pub format: String,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self { format: auto() }
    }
}

impl ReadOptions {
    pub fn with_format<S: Into<String>>(format: S) -> Self {
        Self { format: format.into() }
    }
}

/// Options for point cloud reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadPointCloudOptions {
    pub format: String,
    /// Drop points with a NaN coordinate
    pub remove_nan_points: bool,
    /// Drop points with an infinite coordinate
    pub remove_infinite_points: bool,
}

impl Default for ReadPointCloudOptions {
    fn default() -> Self {
        Self {
            format: auto(),
            remove_nan_points: true,
            remove_infinite_points: true,
        }
    }
}

impl ReadPointCloudOptions {
    /// Keep every decoded point, finite or not
    pub fn unfiltered() -> Self {
        Self {
            remove_nan_points: false,
            remove_infinite_points: false,
            ..Self::default()
        }
    }

    pub fn with_format<S: Into<String>>(mut self, format: S) -> Self {
        self.format = format.into();
        self
    }
}

/// Options for writes of camera data, features and pose graphs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    pub format: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { format: auto() }
    }
}

impl WriteOptions {
    pub fn with_format<S: Into<String>>(format: S) -> Self {
        Self { format: format.into() }
    }
}

/// Options shared by point cloud, line set and voxel grid writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteGeometryOptions {
    pub format: String,
    /// Text encoding instead of binary, where the format has both
    pub write_ascii: bool,
    /// Compressed variant, where the format has one
    pub compressed: bool,
}

pub type WritePointCloudOptions = WriteGeometryOptions;
pub type WriteLineSetOptions = WriteGeometryOptions;
pub type WriteVoxelGridOptions = WriteGeometryOptions;

impl Default for WriteGeometryOptions {
    fn default() -> Self {
        Self {
            format: auto(),
            write_ascii: false,
            compressed: false,
        }
    }
}

impl WriteGeometryOptions {
    pub fn ascii() -> Self {
        Self {
            write_ascii: true,
            ..Self::default()
        }
    }

    pub fn compressed() -> Self {
        Self {
            compressed: true,
            ..Self::default()
        }
    }

    pub fn with_format<S: Into<String>>(mut self, format: S) -> Self {
        self.format = format.into();
        self
    }
}

/// Options for triangle mesh writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteTriangleMeshOptions {
    pub format: String,
    pub write_ascii: bool,
    pub compressed: bool,
    /// When false the normal block is omitted even if the mesh has normals
    pub write_vertex_normals: bool,
    /// When false the color block is omitted even if the mesh has colors
    pub write_vertex_colors: bool,
}

impl Default for WriteTriangleMeshOptions {
    fn default() -> Self {
        Self {
            format: auto(),
            write_ascii: false,
            compressed: false,
            write_vertex_normals: true,
            write_vertex_colors: true,
        }
    }
}

impl WriteTriangleMeshOptions {
    pub fn ascii() -> Self {
        Self {
            write_ascii: true,
            ..Self::default()
        }
    }

    pub fn with_format<S: Into<String>>(mut self, format: S) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_vertex_normals(mut self, write: bool) -> Self {
        self.write_vertex_normals = write;
        self
    }

    pub fn with_vertex_colors(mut self, write: bool) -> Self {
        self.write_vertex_colors = write;
        self
    }
}

/// Options for image writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteImageOptions {
    pub format: String,
    /// Encoder quality for lossy formats, 1..=100
    pub quality: i32,
}

impl Default for WriteImageOptions {
    fn default() -> Self {
        Self {
            format: auto(),
            quality: DEFAULT_QUALITY,
        }
    }
}

impl WriteImageOptions {
    pub fn with_quality(mut self, quality: i32) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_format<S: Into<String>>(mut self, format: S) -> Self {
        self.format = format.into();
        self
    }
}

/// The flag set codecs encode with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub ascii: bool,
    pub compressed: bool,
    pub vertex_normals: bool,
    pub vertex_colors: bool,
    pub quality: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            ascii: false,
            compressed: false,
            vertex_normals: true,
            vertex_colors: true,
            quality: DEFAULT_QUALITY as u8,
        }
    }
}

impl EncodeOptions {
    /// Flags set away from their defaults that `entry`'s codec will not act on
    pub fn ignored_by(&self, entry: &FormatEntry) -> Vec<WriteFlag> {
        let defaults = Self::default();
        let requested = [
            (WriteFlag::Ascii, self.ascii != defaults.ascii),
            (WriteFlag::Compressed, self.compressed != defaults.compressed),
            (WriteFlag::VertexNormals, self.vertex_normals != defaults.vertex_normals),
            (WriteFlag::VertexColors, self.vertex_colors != defaults.vertex_colors),
            (WriteFlag::Quality, self.quality != defaults.quality),
        ];
        requested
            .into_iter()
            .filter(|(flag, set)| *set && !entry.honours(*flag))
            .map(|(flag, _)| flag)
            .collect()
    }
}

fn clamp_quality(quality: i32) -> u8 {
    quality.clamp(1, 100) as u8
}

impl From<&WriteOptions> for EncodeOptions {
    fn from(_: &WriteOptions) -> Self {
        Self::default()
    }
}

impl From<&WriteGeometryOptions> for EncodeOptions {
    fn from(options: &WriteGeometryOptions) -> Self {
        Self {
            ascii: options.write_ascii,
            compressed: options.compressed,
            ..Self::default()
        }
    }
}

impl From<&WriteTriangleMeshOptions> for EncodeOptions {
    fn from(options: &WriteTriangleMeshOptions) -> Self {
        Self {
            ascii: options.write_ascii,
            compressed: options.compressed,
            vertex_normals: options.write_vertex_normals,
            vertex_colors: options.write_vertex_colors,
            ..Self::default()
        }
    }
}

impl From<&WriteImageOptions> for EncodeOptions {
    fn from(options: &WriteImageOptions) -> Self {
        Self {
            quality: clamp_quality(options.quality),
            ..Self::default()
        }
    }
}

/// Format string carried by an option struct
pub(crate) trait FormatOption {
    fn format(&self) -> &str;
}

macro_rules! impl_format_option {
    ($($ty:ty),*) => {
        $(impl FormatOption for $ty {
            fn format(&self) -> &str {
                &self.format
            }
        })*
    };
}

impl_format_option!(
    ReadOptions,
    ReadPointCloudOptions,
    WriteOptions,
    WriteGeometryOptions,
    WriteTriangleMeshOptions,
    WriteImageOptions
);

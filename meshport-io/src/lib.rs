//! File I/O for point clouds, meshes, images and camera data
//!
//! Every entity kind in [`meshport_core`] can be read from and written to the
//! formats listed in [`registry::FORMAT_TABLE`]. The format is taken from an
//! explicit tag in the options or, with the default `"auto"`, from the file
//! extension.
//!
//! ```no_run
//! use meshport_io::{read_point_cloud, write_point_cloud, ReadPointCloudOptions, WritePointCloudOptions};
//!
//! let (cloud, ok) = read_point_cloud("scan.pcd", &ReadPointCloudOptions::default());
//! if ok {
//!     write_point_cloud("scan.ply", &cloud, &WritePointCloudOptions::ascii());
//! }
//! ```

pub mod facade;
pub mod filter;
pub mod options;
pub mod registry;
pub mod sniff;

mod camera;
mod codec;
mod error;
mod feature;
mod json;
mod lzf;
mod obj;
mod off;
mod pcd;
mod ply;
mod pose_graph;
mod raster;
mod stl;
mod text;
mod xyz;

pub use facade::*;
pub use filter::remove_non_finite;
pub use options::{
    ReadOptions, ReadPointCloudOptions, WriteGeometryOptions, WriteImageOptions,
    WriteLineSetOptions, WriteOptions, WritePointCloudOptions, WriteTriangleMeshOptions,
    WriteVoxelGridOptions, DEFAULT_QUALITY,
};
pub use registry::{formats_for, lookup, Format, FormatEntry, Kind, WriteFlag, FORMAT_TABLE};
pub use sniff::{sniff, AUTO};

pub use meshport_core::{Error, Result};

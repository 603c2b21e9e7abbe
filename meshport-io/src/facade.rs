//! Path-based read and write entry points
//!
//! Each kind gets four functions: `try_read_*` / `try_write_*` return the
//! underlying [`Error`], while `read_*` / `write_*` log it and report a plain
//! success flag. A failed read yields the kind's default (empty) value.
//!
//! Writes go to a temporary file next to the destination which is renamed
//! over it once encoding succeeded, so a failed write never leaves a partial
//! file behind and never touches an existing destination.

use crate::codec::Codec;
use crate::error::eof_as_parse;
use crate::filter::remove_non_finite;
use crate::options::{
    EncodeOptions, FormatOption, ReadOptions, ReadPointCloudOptions, WriteImageOptions,
    WriteLineSetOptions, WriteOptions, WritePointCloudOptions, WriteTriangleMeshOptions,
    WriteVoxelGridOptions,
};
use crate::registry::lookup;
use crate::sniff::resolve_tag;
use itertools::Itertools;
use meshport_core::{
    Error, Feature, Image, LineSet, PinholeCameraIntrinsic, PinholeCameraParameters,
    PinholeCameraTrajectory, PointCloud, PoseGraph, Result, TriangleMesh, VoxelGrid,
};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

fn read_entity<T: Codec>(path: &Path, format: &str) -> Result<T> {
    let tag = resolve_tag(T::KIND, path, format);
    let entry = lookup(T::KIND, tag)?;
    log::debug!("reading {} from {} as {}", T::KIND, path.display(), entry.tag());

    let mut reader = BufReader::new(File::open(path)?);
    let entity = T::decode(entry.format, &mut reader).map_err(eof_as_parse)?;
    entity.validate()?;
    Ok(entity)
}

/// Temporary file next to `path` whose mode matches what a plain create or an
/// in-place overwrite of `path` would have produced
fn staging_file(path: &Path) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut builder = tempfile::Builder::new();
    builder.prefix(".meshport");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Narrowed by the process umask, like `File::create`.
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let staged = builder.tempfile_in(dir)?;

    match fs::metadata(path) {
        Ok(existing) => staged.as_file().set_permissions(existing.permissions())?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }
    Ok(staged)
}

fn write_entity<T: Codec>(path: &Path, entity: &T, format: &str, options: EncodeOptions) -> Result<()> {
    let tag = resolve_tag(T::KIND, path, format);
    let entry = lookup(T::KIND, tag)?;
    entity.validate()?;

    let ignored = options.ignored_by(entry);
    if !ignored.is_empty() {
        log::debug!(
            "{} writer ignores {}",
            entry.tag(),
            ignored.iter().map(|flag| flag.name()).join(", ")
        );
    }
    log::debug!("writing {} to {} as {}", T::KIND, path.display(), entry.tag());

    let mut staged = staging_file(path)?;
    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        entity.encode(entry.format, &options, &mut writer)?;
        writer.flush()?;
    }
    staged.persist(path).map_err(|err| Error::Io(err.error))?;
    Ok(())
}

fn settle_read<T: Codec>(path: &Path, result: Result<T>) -> (T, bool) {
    match result {
        Ok(entity) => (entity, true),
        Err(err) => {
            log::warn!("failed to read {} from {}: {}", T::KIND, path.display(), err);
            (T::default(), false)
        }
    }
}

fn settle_write<T: Codec>(path: &Path, result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            log::warn!("failed to write {} to {}: {}", T::KIND, path.display(), err);
            false
        }
    }
}

/// Read a point cloud, dropping points with NaN or infinite coordinates as
/// requested by `options`
pub fn try_read_point_cloud<P: AsRef<Path>>(path: P, options: &ReadPointCloudOptions) -> Result<PointCloud> {
    let mut cloud: PointCloud = read_entity(path.as_ref(), options.format())?;
    remove_non_finite(&mut cloud, options);
    Ok(cloud)
}

pub fn read_point_cloud<P: AsRef<Path>>(path: P, options: &ReadPointCloudOptions) -> (PointCloud, bool) {
    let path = path.as_ref();
    settle_read(path, try_read_point_cloud(path, options))
}

/// Generates the four entry points of a kind whose read needs no post-processing
macro_rules! entry_points {
    ($entity:ty, $name:literal, $read_options:ty, $write_options:ty,
     $try_read:ident, $read:ident, $try_write:ident, $write:ident) => {
        #[doc = concat!("Read ", $name, ", returning the first error encountered")]
        pub fn $try_read<P: AsRef<Path>>(path: P, options: &$read_options) -> Result<$entity> {
            read_entity(path.as_ref(), options.format())
        }

        #[doc = concat!("Read ", $name, "; on failure the default value and `false` are returned")]
        pub fn $read<P: AsRef<Path>>(path: P, options: &$read_options) -> ($entity, bool) {
            let path = path.as_ref();
            settle_read(path, $try_read(path, options))
        }

        #[doc = concat!("Write ", $name, " atomically, returning the first error encountered")]
        pub fn $try_write<P: AsRef<Path>>(path: P, entity: &$entity, options: &$write_options) -> Result<()> {
            write_entity(path.as_ref(), entity, options.format(), EncodeOptions::from(options))
        }

        #[doc = concat!("Write ", $name, "; `false` means nothing was written")]
        pub fn $write<P: AsRef<Path>>(path: P, entity: &$entity, options: &$write_options) -> bool {
            let path = path.as_ref();
            settle_write::<$entity>(path, $try_write(path, entity, options))
        }
    };
}

/// Write a point cloud atomically
pub fn try_write_point_cloud<P: AsRef<Path>>(
    path: P,
    cloud: &PointCloud,
    options: &WritePointCloudOptions,
) -> Result<()> {
    write_entity(path.as_ref(), cloud, options.format(), EncodeOptions::from(options))
}

pub fn write_point_cloud<P: AsRef<Path>>(path: P, cloud: &PointCloud, options: &WritePointCloudOptions) -> bool {
    let path = path.as_ref();
    settle_write::<PointCloud>(path, try_write_point_cloud(path, cloud, options))
}

entry_points!(
    TriangleMesh, "a triangle mesh", ReadOptions, WriteTriangleMeshOptions,
    try_read_triangle_mesh, read_triangle_mesh, try_write_triangle_mesh, write_triangle_mesh
);
entry_points!(
    LineSet, "a line set", ReadOptions, WriteLineSetOptions,
    try_read_line_set, read_line_set, try_write_line_set, write_line_set
);
entry_points!(
    VoxelGrid, "a voxel grid", ReadOptions, WriteVoxelGridOptions,
    try_read_voxel_grid, read_voxel_grid, try_write_voxel_grid, write_voxel_grid
);
entry_points!(
    Image, "an image", ReadOptions, WriteImageOptions,
    try_read_image, read_image, try_write_image, write_image
);
entry_points!(
    PinholeCameraIntrinsic, "a pinhole camera intrinsic", ReadOptions, WriteOptions,
    try_read_pinhole_camera_intrinsic, read_pinhole_camera_intrinsic,
    try_write_pinhole_camera_intrinsic, write_pinhole_camera_intrinsic
);
entry_points!(
    PinholeCameraParameters, "a set of pinhole camera parameters", ReadOptions, WriteOptions,
    try_read_pinhole_camera_parameters, read_pinhole_camera_parameters,
    try_write_pinhole_camera_parameters, write_pinhole_camera_parameters
);
entry_points!(
    PinholeCameraTrajectory, "a pinhole camera trajectory", ReadOptions, WriteOptions,
    try_read_pinhole_camera_trajectory, read_pinhole_camera_trajectory,
    try_write_pinhole_camera_trajectory, write_pinhole_camera_trajectory
);
entry_points!(
    Feature, "a feature", ReadOptions, WriteOptions,
    try_read_feature, read_feature, try_write_feature, write_feature
);
entry_points!(
    PoseGraph, "a pose graph", ReadOptions, WriteOptions,
    try_read_pose_graph, read_pose_graph, try_write_pose_graph, write_pose_graph
);


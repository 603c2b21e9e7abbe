//! Per-kind codec dispatch
//!
//! Every entity kind knows how to decode itself from, and encode itself to,
//! each format the registry lists for it. Arms for formats outside a kind's
//! table are unreachable through the facade, which always looks the format
//! up first, but they still fail cleanly.

use crate::options::EncodeOptions;
use crate::registry::{Format, Kind};
use crate::xyz::XyzLayout;
use crate::{camera, feature, obj, off, pcd, ply, pose_graph, raster, stl, xyz};
use meshport_core::{
    Error, Feature, Image, LineSet, PinholeCameraIntrinsic, PinholeCameraParameters,
    PinholeCameraTrajectory, PointCloud, PoseGraph, Result, TriangleMesh, VoxelGrid,
};
use std::io::{BufRead, Write};

/// Decoding and encoding of one entity kind
pub(crate) trait Codec: Sized + Default {
    const KIND: Kind;

    fn decode(format: Format, reader: &mut dyn BufRead) -> Result<Self>;

    fn encode(&self, format: Format, options: &EncodeOptions, writer: &mut dyn Write) -> Result<()>;

    /// Invariant check run after every decode and before every encode
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

fn no_codec(kind: Kind, format: Format) -> Error {
    Error::UnsupportedFormat(format!("no {} codec for format '{}'", kind, format))
}

impl Codec for PointCloud {
    const KIND: Kind = Kind::PointCloud;

    fn decode(format: Format, reader: &mut dyn BufRead) -> Result<Self> {
        match format {
            Format::Ply => ply::read_point_cloud(reader),
            Format::Pcd => pcd::read_point_cloud(reader),
            Format::Xyz => xyz::read_xyz(reader, XyzLayout::Xyz),
            Format::Xyzn => xyz::read_xyz(reader, XyzLayout::Xyzn),
            Format::Xyzrgb => xyz::read_xyz(reader, XyzLayout::Xyzrgb),
            Format::Pts => xyz::read_pts(reader),
            other => Err(no_codec(Self::KIND, other)),
        }
    }

    fn encode(&self, format: Format, options: &EncodeOptions, writer: &mut dyn Write) -> Result<()> {
        match format {
            Format::Ply => ply::write_point_cloud(self, options, writer),
            Format::Pcd => pcd::write_point_cloud(self, options, writer),
            Format::Xyz => xyz::write_xyz(self, XyzLayout::Xyz, writer),
            Format::Xyzn => xyz::write_xyz(self, XyzLayout::Xyzn, writer),
            Format::Xyzrgb => xyz::write_xyz(self, XyzLayout::Xyzrgb, writer),
            Format::Pts => xyz::write_pts(self, writer),
            other => Err(no_codec(Self::KIND, other)),
        }
    }

    fn validate(&self) -> Result<()> {
        PointCloud::validate(self)
    }
}

impl Codec for TriangleMesh {
    const KIND: Kind = Kind::TriangleMesh;

    fn decode(format: Format, reader: &mut dyn BufRead) -> Result<Self> {
        match format {
            Format::Ply => ply::read_triangle_mesh(reader),
            Format::Obj => obj::read_triangle_mesh(reader),
            Format::Stl => stl::read_triangle_mesh(reader),
            Format::Off => off::read_triangle_mesh(reader),
            other => Err(no_codec(Self::KIND, other)),
        }
    }

    fn encode(&self, format: Format, options: &EncodeOptions, writer: &mut dyn Write) -> Result<()> {
        match format {
            Format::Ply => ply::write_triangle_mesh(self, options, writer),
            Format::Obj => obj::write_triangle_mesh(self, options, writer),
            Format::Stl => stl::write_triangle_mesh(self, options, writer),
            Format::Off => off::write_triangle_mesh(self, options, writer),
            other => Err(no_codec(Self::KIND, other)),
        }
    }

    fn validate(&self) -> Result<()> {
        TriangleMesh::validate(self)
    }
}

impl Codec for LineSet {
    const KIND: Kind = Kind::LineSet;

    fn decode(format: Format, reader: &mut dyn BufRead) -> Result<Self> {
        match format {
            Format::Ply => ply::read_line_set(reader),
            other => Err(no_codec(Self::KIND, other)),
        }
    }

    fn encode(&self, format: Format, options: &EncodeOptions, writer: &mut dyn Write) -> Result<()> {
        match format {
            Format::Ply => ply::write_line_set(self, options, writer),
            other => Err(no_codec(Self::KIND, other)),
        }
    }

    fn validate(&self) -> Result<()> {
        LineSet::validate(self)
    }
}

impl Codec for VoxelGrid {
    const KIND: Kind = Kind::VoxelGrid;

    fn decode(format: Format, reader: &mut dyn BufRead) -> Result<Self> {
        match format {
            Format::Ply => ply::read_voxel_grid(reader),
            other => Err(no_codec(Self::KIND, other)),
        }
    }

    fn encode(&self, format: Format, options: &EncodeOptions, writer: &mut dyn Write) -> Result<()> {
        match format {
            Format::Ply => ply::write_voxel_grid(self, options, writer),
            other => Err(no_codec(Self::KIND, other)),
        }
    }

    fn validate(&self) -> Result<()> {
        VoxelGrid::validate(self)
    }
}

impl Codec for Image {
    const KIND: Kind = Kind::Image;

    fn decode(format: Format, reader: &mut dyn BufRead) -> Result<Self> {
        match format {
            Format::Png => raster::read_png(reader),
            Format::Jpg => raster::read_jpg(reader),
            other => Err(no_codec(Self::KIND, other)),
        }
    }

    fn encode(&self, format: Format, options: &EncodeOptions, writer: &mut dyn Write) -> Result<()> {
        match format {
            Format::Png => raster::write_png(self, writer),
            Format::Jpg => raster::write_jpg(self, options, writer),
            other => Err(no_codec(Self::KIND, other)),
        }
    }

    fn validate(&self) -> Result<()> {
        Image::validate(self)
    }
}

impl Codec for PinholeCameraIntrinsic {
    const KIND: Kind = Kind::PinholeCameraIntrinsic;

    fn decode(format: Format, reader: &mut dyn BufRead) -> Result<Self> {
        match format {
            Format::Json => camera::read_intrinsic_json(reader),
            other => Err(no_codec(Self::KIND, other)),
        }
    }

    fn encode(&self, format: Format, _options: &EncodeOptions, writer: &mut dyn Write) -> Result<()> {
        match format {
            Format::Json => camera::write_intrinsic_json(self, writer),
            other => Err(no_codec(Self::KIND, other)),
        }
    }
}

impl Codec for PinholeCameraParameters {
    const KIND: Kind = Kind::PinholeCameraParameters;

    fn decode(format: Format, reader: &mut dyn BufRead) -> Result<Self> {
        match format {
            Format::Json => camera::read_parameters_json(reader),
            other => Err(no_codec(Self::KIND, other)),
        }
    }

    fn encode(&self, format: Format, _options: &EncodeOptions, writer: &mut dyn Write) -> Result<()> {
        match format {
            Format::Json => camera::write_parameters_json(self, writer),
            other => Err(no_codec(Self::KIND, other)),
        }
    }
}

impl Codec for PinholeCameraTrajectory {
    const KIND: Kind = Kind::PinholeCameraTrajectory;

    fn decode(format: Format, reader: &mut dyn BufRead) -> Result<Self> {
        match format {
            Format::Json => camera::read_trajectory_json(reader),
            Format::Log => camera::read_trajectory_log(reader),
            Format::Tum => camera::read_trajectory_tum(reader),
            other => Err(no_codec(Self::KIND, other)),
        }
    }

    fn encode(&self, format: Format, _options: &EncodeOptions, writer: &mut dyn Write) -> Result<()> {
        match format {
            Format::Json => camera::write_trajectory_json(self, writer),
            Format::Log => camera::write_trajectory_log(self, writer),
            Format::Tum => camera::write_trajectory_tum(self, writer),
            other => Err(no_codec(Self::KIND, other)),
        }
    }
}

impl Codec for Feature {
    const KIND: Kind = Kind::Feature;

    fn decode(format: Format, reader: &mut dyn BufRead) -> Result<Self> {
        match format {
            Format::Bin => feature::read_feature(reader),
            other => Err(no_codec(Self::KIND, other)),
        }
    }

    fn encode(&self, format: Format, _options: &EncodeOptions, writer: &mut dyn Write) -> Result<()> {
        match format {
            Format::Bin => feature::write_feature(self, writer),
            other => Err(no_codec(Self::KIND, other)),
        }
    }
}

impl Codec for PoseGraph {
    const KIND: Kind = Kind::PoseGraph;

    fn decode(format: Format, reader: &mut dyn BufRead) -> Result<Self> {
        match format {
            Format::Json => pose_graph::read_pose_graph(reader),
            other => Err(no_codec(Self::KIND, other)),
        }
    }

    fn encode(&self, format: Format, _options: &EncodeOptions, writer: &mut dyn Write) -> Result<()> {
        match format {
            Format::Json => pose_graph::write_pose_graph(self, writer),
            other => Err(no_codec(Self::KIND, other)),
        }
    }

    fn validate(&self) -> Result<()> {
        PoseGraph::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FORMAT_TABLE;
    use std::io::Cursor;

    fn encode_default<T: Codec>(format: Format) -> Result<Vec<u8>> {
        let mut out: Vec<u8> = Vec::new();
        T::default().encode(format, &EncodeOptions::default(), &mut out)?;
        Ok(out)
    }

    fn check<T: Codec>(format: Format) -> Result<()> {
        let data = encode_default::<T>(format)?;
        T::decode(format, &mut Cursor::new(data)).map(|_| ())
    }

    #[test]
    fn test_every_registered_format_has_a_codec() {
        for entry in FORMAT_TABLE {
            let result = match entry.kind {
                Kind::PointCloud => check::<PointCloud>(entry.format),
                Kind::TriangleMesh => check::<TriangleMesh>(entry.format),
                Kind::LineSet => check::<LineSet>(entry.format),
                Kind::VoxelGrid => check::<VoxelGrid>(entry.format),
                // Empty images have no encodable layout.
                Kind::Image => Ok(()),
                Kind::PinholeCameraIntrinsic => check::<PinholeCameraIntrinsic>(entry.format),
                Kind::PinholeCameraParameters => check::<PinholeCameraParameters>(entry.format),
                Kind::PinholeCameraTrajectory => check::<PinholeCameraTrajectory>(entry.format),
                Kind::Feature => check::<Feature>(entry.format),
                Kind::PoseGraph => check::<PoseGraph>(entry.format),
            };
            assert!(result.is_ok(), "{} as {}: {:?}", entry.kind, entry.format, result);
        }
    }

    #[test]
    fn test_unregistered_pairs_are_rejected() {
        assert!(matches!(encode_default::<PointCloud>(Format::Obj), Err(Error::UnsupportedFormat(_))));
        assert!(matches!(
            Feature::decode(Format::Json, &mut Cursor::new(Vec::new())),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}

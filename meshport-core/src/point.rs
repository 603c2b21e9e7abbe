//! Point, vector and color aliases shared by every container

use nalgebra::{Matrix3, Matrix4, Matrix6, Point3, Vector3};

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// An RGB color with components in `[0, 1]`
pub type Color3d = Vector3<f64>;

/// Integer index of a voxel inside a [`crate::VoxelGrid`]
pub type GridIndex = [i32; 3];

/// 3x3 double precision matrix
pub type Matrix3d = Matrix3<f64>;

/// 4x4 double precision matrix, used for rigid transforms
pub type Matrix4d = Matrix4<f64>;

/// 6x6 double precision matrix, used for information matrices
pub type Matrix6d = Matrix6<f64>;

/// Quantize a `[0, 1]` color channel to 8 bits, clamping out-of-range input.
pub fn color_to_u8(channel: f64) -> u8 {
    if channel.is_nan() {
        return 0;
    }
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Expand an 8-bit color channel to `[0, 1]`.
pub fn color_from_u8(channel: u8) -> f64 {
    channel as f64 / 255.0
}

/// Quantize a color to three bytes.
pub fn color_to_rgb8(color: &Color3d) -> [u8; 3] {
    [color_to_u8(color.x), color_to_u8(color.y), color_to_u8(color.z)]
}

/// Expand three bytes to a color.
pub fn color_from_rgb8(rgb: [u8; 3]) -> Color3d {
    Color3d::new(color_from_u8(rgb[0]), color_from_u8(rgb[1]), color_from_u8(rgb[2]))
}

//! Core data structures for meshport
//!
//! This crate provides the in-memory containers that `meshport-io` reads and
//! writes: point clouds, triangle meshes, line sets, voxel grids, images,
//! pinhole camera models, feature descriptors and pose graphs. Each container
//! is a plain owned value with a `validate` method that checks its invariants.

pub mod point;
pub mod point_cloud;
pub mod mesh;
pub mod line_set;
pub mod voxel_grid;
pub mod image;
pub mod camera;
pub mod feature;
pub mod pose_graph;
pub mod transform;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use mesh::*;
pub use line_set::*;
pub use voxel_grid::*;
pub use image::*;
pub use camera::*;
pub use feature::*;
pub use pose_graph::*;
pub use transform::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{DMatrix, Matrix3, Matrix4, Matrix6, Point3, UnitQuaternion, Vector3};

//! Rigid transform helper used by camera pose formats

use crate::point::{Matrix4d, Vector3d};
use nalgebra::{Isometry3, Rotation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

/// A homogeneous 4x4 transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub matrix: Matrix4d,
}

impl Transform3D {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4d::identity(),
        }
    }

    /// Create a transformation from translation and rotation
    pub fn from_translation_rotation(translation: Vector3d, rotation: UnitQuaternion<f64>) -> Self {
        let isometry = Isometry3::from_parts(translation.into(), rotation);
        Self {
            matrix: isometry.to_homogeneous(),
        }
    }

    /// Translation part (last column)
    pub fn translation(&self) -> Vector3d {
        self.matrix.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Rotation part as a unit quaternion; the upper 3x3 block is
    /// re-orthonormalized first so slightly drifted matrices still convert
    pub fn rotation(&self) -> UnitQuaternion<f64> {
        let block = self.matrix.fixed_view::<3, 3>(0, 0).into_owned();
        UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix(&block))
    }

    /// Get the inverse transformation
    pub fn inverse(self) -> Option<Self> {
        self.matrix.try_inverse().map(|inv_matrix| Self { matrix: inv_matrix })
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Matrix4d> for Transform3D {
    fn from(matrix: Matrix4d) -> Self {
        Self { matrix }
    }
}

//! Pinhole camera models

use crate::point::{Matrix3d, Matrix4d};
use serde::{Deserialize, Serialize};

/// Pinhole intrinsics: image size plus the 3x3 calibration matrix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PinholeCameraIntrinsic {
    pub width: u32,
    pub height: u32,
    pub intrinsic_matrix: Matrix3d,
}

impl PinholeCameraIntrinsic {
    pub fn new(width: u32, height: u32, fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self {
            width,
            height,
            intrinsic_matrix: Matrix3d::new(fx, 0.0, cx, 0.0, fy, cy, 0.0, 0.0, 1.0),
        }
    }

    /// The 640x480 PrimeSense calibration, used when a file carries poses only
    pub fn prime_sense_default() -> Self {
        Self::new(640, 480, 525.0, 525.0, 319.5, 239.5)
    }

    pub fn fx(&self) -> f64 {
        self.intrinsic_matrix[(0, 0)]
    }

    pub fn fy(&self) -> f64 {
        self.intrinsic_matrix[(1, 1)]
    }

    pub fn cx(&self) -> f64 {
        self.intrinsic_matrix[(0, 2)]
    }

    pub fn cy(&self) -> f64 {
        self.intrinsic_matrix[(1, 2)]
    }

    pub fn skew(&self) -> f64 {
        self.intrinsic_matrix[(0, 1)]
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl Default for PinholeCameraIntrinsic {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            intrinsic_matrix: Matrix3d::zeros(),
        }
    }
}

/// Intrinsics plus the world-to-camera extrinsic transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PinholeCameraParameters {
    pub intrinsic: PinholeCameraIntrinsic,
    pub extrinsic: Matrix4d,
}

impl PinholeCameraParameters {
    pub fn new(intrinsic: PinholeCameraIntrinsic, extrinsic: Matrix4d) -> Self {
        Self { intrinsic, extrinsic }
    }
}

impl Default for PinholeCameraParameters {
    fn default() -> Self {
        Self {
            intrinsic: PinholeCameraIntrinsic::default(),
            extrinsic: Matrix4d::identity(),
        }
    }
}

/// An ordered sequence of per-frame camera parameters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PinholeCameraTrajectory {
    pub parameters: Vec<PinholeCameraParameters>,
}

impl PinholeCameraTrajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intrinsic_accessors() {
        let intrinsic = PinholeCameraIntrinsic::prime_sense_default();
        assert_eq!(intrinsic.fx(), 525.0);
        assert_eq!(intrinsic.fy(), 525.0);
        assert_eq!(intrinsic.cx(), 319.5);
        assert_eq!(intrinsic.cy(), 239.5);
        assert_eq!(intrinsic.skew(), 0.0);
        assert!(intrinsic.is_valid());
        assert!(!PinholeCameraIntrinsic::default().is_valid());
    }
}

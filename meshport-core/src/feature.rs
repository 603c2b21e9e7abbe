//! Per-keypoint feature descriptors

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Descriptor matrix with one row per keypoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub data: DMatrix<f64>,
}

impl Feature {
    /// Zero-filled descriptors for `keypoints` keypoints of dimension `dimension`
    pub fn zeros(keypoints: usize, dimension: usize) -> Self {
        Self {
            data: DMatrix::zeros(keypoints, dimension),
        }
    }

    /// Build from descriptors laid out keypoint after keypoint
    pub fn from_row_slice(keypoints: usize, dimension: usize, values: &[f64]) -> Self {
        Self {
            data: DMatrix::from_row_slice(keypoints, dimension, values),
        }
    }

    pub fn num_keypoints(&self) -> usize {
        self.data.nrows()
    }

    pub fn dimension(&self) -> usize {
        self.data.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for Feature {
    fn default() -> Self {
        Self::zeros(0, 0)
    }
}

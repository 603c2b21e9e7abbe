//! Sparse voxel grid container

use crate::error::{Error, Result};
use crate::point::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single occupied voxel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Voxel {
    pub grid_index: GridIndex,
    pub color: Option<Color3d>,
}

impl Voxel {
    pub fn new(grid_index: GridIndex) -> Self {
        Self {
            grid_index,
            color: None,
        }
    }

    pub fn with_color(grid_index: GridIndex, color: Color3d) -> Self {
        Self {
            grid_index,
            color: Some(color),
        }
    }
}

/// A sparse set of occupied voxels on a regular grid.
///
/// Voxels are keyed by grid index, so iteration order is deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VoxelGrid {
    pub voxel_size: f64,
    pub origin: Point3d,
    pub voxels: BTreeMap<GridIndex, Voxel>,
}

impl VoxelGrid {
    pub fn new(voxel_size: f64, origin: Point3d) -> Self {
        Self {
            voxel_size,
            origin,
            voxels: BTreeMap::new(),
        }
    }

    /// Insert a voxel, replacing any voxel already stored at its index
    pub fn insert(&mut self, voxel: Voxel) {
        self.voxels.insert(voxel.grid_index, voxel);
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// True when at least one voxel carries a color
    pub fn has_colors(&self) -> bool {
        self.voxels.values().any(|v| v.color.is_some())
    }

    /// A default-constructed empty grid has no size yet and is accepted;
    /// anything holding voxels needs a positive finite size.
    pub fn validate(&self) -> Result<()> {
        let unset = self.voxels.is_empty() && self.voxel_size == 0.0;
        if !unset && !(self.voxel_size.is_finite() && self.voxel_size > 0.0) {
            return Err(Error::ShapeMismatch(format!(
                "voxel size must be positive, got {}",
                self.voxel_size
            )));
        }
        if let Some((key, voxel)) = self.voxels.iter().find(|(key, v)| **key != v.grid_index) {
            return Err(Error::ShapeMismatch(format!(
                "voxel stored under {:?} has grid index {:?}",
                key, voxel.grid_index
            )));
        }
        Ok(())
    }
}

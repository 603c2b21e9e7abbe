//! Point cloud container

use crate::error::{Error, Result};
use crate::point::*;
use serde::{Deserialize, Serialize};

/// A point cloud with optional per-point normals and colors.
///
/// `normals` and `colors` are parallel to `points`: each is either empty or
/// exactly as long as `points`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointCloud {
    pub points: Vec<Point3d>,
    pub normals: Vec<Vector3d>,
    pub colors: Vec<Color3d>,
}

impl PointCloud {
    /// Create a new empty point cloud
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a point cloud from a vector of points
    pub fn from_points(points: Vec<Point3d>) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    /// Attach per-point normals
    pub fn with_normals(mut self, normals: Vec<Vector3d>) -> Self {
        self.normals = normals;
        self
    }

    /// Attach per-point colors
    pub fn with_colors(mut self, colors: Vec<Color3d>) -> Self {
        self.colors = colors;
        self
    }

    /// Get the number of points in the cloud
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn has_normals(&self) -> bool {
        !self.points.is_empty() && self.normals.len() == self.points.len()
    }

    pub fn has_colors(&self) -> bool {
        !self.points.is_empty() && self.colors.len() == self.points.len()
    }

    /// Keep only the points for which `keep` returns true, together with
    /// their normals and colors. Returns the number of removed points.
    pub fn retain_points<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Point3d) -> bool,
    {
        let mask: Vec<bool> = self.points.iter().map(|p| keep(p)).collect();
        let removed = mask.iter().filter(|kept| !**kept).count();
        if removed == 0 {
            return 0;
        }

        let has_normals = self.has_normals();
        let has_colors = self.has_colors();
        retain_by_mask(&mut self.points, &mask);
        if has_normals {
            retain_by_mask(&mut self.normals, &mask);
        }
        if has_colors {
            retain_by_mask(&mut self.colors, &mask);
        }
        removed
    }

    /// Check the parallel-attribute invariant
    pub fn validate(&self) -> Result<()> {
        check_parallel("point cloud normals", self.normals.len(), self.points.len())?;
        check_parallel("point cloud colors", self.colors.len(), self.points.len())
    }
}

fn retain_by_mask<T>(values: &mut Vec<T>, mask: &[bool]) {
    let mut flags = mask.iter();
    values.retain(|_| *flags.next().unwrap_or(&false));
}

/// An attribute sequence must be empty or match its owner's length.
pub(crate) fn check_parallel(what: &str, len: usize, expected: usize) -> Result<()> {
    if len != 0 && len != expected {
        return Err(Error::ShapeMismatch(format!(
            "{} has {} entries, expected 0 or {}",
            what, len, expected
        )));
    }
    Ok(())
}

//! Line set container

use crate::error::{Error, Result};
use crate::point::*;
use crate::point_cloud::check_parallel;
use serde::{Deserialize, Serialize};

/// A set of line segments between indexed points, with optional per-line colors
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineSet {
    pub points: Vec<Point3d>,
    pub lines: Vec<[usize; 2]>,
    pub colors: Vec<Color3d>,
}

impl LineSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points_and_lines(points: Vec<Point3d>, lines: Vec<[usize; 2]>) -> Self {
        Self {
            points,
            lines,
            colors: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn has_colors(&self) -> bool {
        !self.lines.is_empty() && self.colors.len() == self.lines.len()
    }

    pub fn validate(&self) -> Result<()> {
        let count = self.points.len();
        if let Some((i, line)) = self
            .lines
            .iter()
            .enumerate()
            .find(|(_, line)| line.iter().any(|&v| v >= count))
        {
            return Err(Error::ShapeMismatch(format!(
                "line {} {:?} references a point outside 0..{}",
                i, line, count
            )));
        }
        check_parallel("line colors", self.colors.len(), self.lines.len())
    }
}

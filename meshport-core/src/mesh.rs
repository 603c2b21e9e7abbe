//! Mesh data structures and functionality

use crate::error::{Error, Result};
use crate::point::*;
use crate::point_cloud::check_parallel;
use serde::{Deserialize, Serialize};

/// A triangle mesh with vertices, faces and optional per-vertex attributes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3d>,
    pub faces: Vec<[usize; 3]>,
    pub normals: Vec<Vector3d>,
    pub colors: Vec<Color3d>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3d>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            faces,
            normals: Vec::new(),
            colors: Vec::new(),
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn has_normals(&self) -> bool {
        !self.vertices.is_empty() && self.normals.len() == self.vertices.len()
    }

    pub fn has_colors(&self) -> bool {
        !self.vertices.is_empty() && self.colors.len() == self.vertices.len()
    }

    /// Set vertex normals; ignored unless there is one per vertex
    pub fn set_normals(&mut self, normals: Vec<Vector3d>) {
        if normals.len() == self.vertices.len() {
            self.normals = normals;
        }
    }

    /// Set vertex colors; ignored unless there is one per vertex
    pub fn set_colors(&mut self, colors: Vec<Color3d>) {
        if colors.len() == self.vertices.len() {
            self.colors = colors;
        }
    }

    /// Check that every face references an existing vertex and that the
    /// per-vertex attributes are aligned
    pub fn validate(&self) -> Result<()> {
        let count = self.vertices.len();
        if let Some((i, face)) = self
            .faces
            .iter()
            .enumerate()
            .find(|(_, face)| face.iter().any(|&v| v >= count))
        {
            return Err(Error::ShapeMismatch(format!(
                "face {} {:?} references a vertex outside 0..{}",
                i, face, count
            )));
        }
        check_parallel("mesh vertex normals", self.normals.len(), count)?;
        check_parallel("mesh vertex colors", self.colors.len(), count)
    }
}

//! Pose graph container

use crate::error::{Error, Result};
use crate::point::{Matrix4d, Matrix6d};
use serde::{Deserialize, Serialize};

/// A node holding an absolute pose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseGraphNode {
    pub pose: Matrix4d,
}

impl PoseGraphNode {
    pub fn new(pose: Matrix4d) -> Self {
        Self { pose }
    }
}

impl Default for PoseGraphNode {
    fn default() -> Self {
        Self::new(Matrix4d::identity())
    }
}

/// A relative-transform constraint between two nodes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseGraphEdge {
    pub source_node_id: usize,
    pub target_node_id: usize,
    pub transformation: Matrix4d,
    pub information: Matrix6d,
    pub uncertain: bool,
    pub confidence: f64,
}

impl PoseGraphEdge {
    pub fn new(
        source_node_id: usize,
        target_node_id: usize,
        transformation: Matrix4d,
        information: Matrix6d,
        uncertain: bool,
        confidence: f64,
    ) -> Self {
        Self {
            source_node_id,
            target_node_id,
            transformation,
            information,
            uncertain,
            confidence,
        }
    }
}

impl Default for PoseGraphEdge {
    fn default() -> Self {
        Self::new(0, 0, Matrix4d::identity(), Matrix6d::identity(), false, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseGraph {
    pub nodes: Vec<PoseGraphNode>,
    pub edges: Vec<PoseGraphEdge>,
}

impl PoseGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Every edge must connect two existing nodes
    pub fn validate(&self) -> Result<()> {
        let count = self.nodes.len();
        if let Some((i, edge)) = self
            .edges
            .iter()
            .enumerate()
            .find(|(_, e)| e.source_node_id >= count || e.target_node_id >= count)
        {
            return Err(Error::ShapeMismatch(format!(
                "edge {} connects {} -> {} but the graph has {} nodes",
                i, edge.source_node_id, edge.target_node_id, count
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_must_reference_nodes() {
        let mut graph = PoseGraph::new();
        graph.nodes.push(PoseGraphNode::default());
        graph.nodes.push(PoseGraphNode::default());
        graph.edges.push(PoseGraphEdge { source_node_id: 0, target_node_id: 1, ..Default::default() });
        assert!(graph.validate().is_ok());

        graph.edges.push(PoseGraphEdge { source_node_id: 1, target_node_id: 2, ..Default::default() });
        assert!(graph.validate().is_err());
    }
}

//! Pose graphs as versioned JSON

use crate::json::{matrix_from_vec, matrix_to_vec, read_envelope, write_envelope, Envelope};
use meshport_core::{Error, PoseGraph, PoseGraphEdge, PoseGraphNode, Result};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

const GRAPH_CLASS: &str = "PoseGraph";
const NODE_CLASS: &str = "PoseGraphNode";
const EDGE_CLASS: &str = "PoseGraphEdge";

#[derive(Debug, Serialize, Deserialize)]
struct NodeBody {
    pose: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EdgeBody {
    source_node_id: usize,
    target_node_id: usize,
    transformation: Vec<f64>,
    information: Vec<f64>,
    uncertain: bool,
    confidence: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct GraphBody {
    nodes: Vec<Envelope<NodeBody>>,
    edges: Vec<Envelope<EdgeBody>>,
}

impl TryFrom<EdgeBody> for PoseGraphEdge {
    type Error = Error;

    fn try_from(body: EdgeBody) -> Result<Self> {
        Ok(PoseGraphEdge::new(
            body.source_node_id,
            body.target_node_id,
            matrix_from_vec(&body.transformation, "transformation")?,
            matrix_from_vec(&body.information, "information")?,
            body.uncertain,
            body.confidence,
        ))
    }
}

pub(crate) fn read_pose_graph(reader: &mut dyn BufRead) -> Result<PoseGraph> {
    let body: GraphBody = read_envelope(reader, GRAPH_CLASS)?;
    let nodes = body
        .nodes
        .into_iter()
        .map(|node| {
            let node = node.open(NODE_CLASS)?;
            Ok(PoseGraphNode::new(matrix_from_vec(&node.pose, "pose")?))
        })
        .collect::<Result<Vec<_>>>()?;
    let edges = body
        .edges
        .into_iter()
        .map(|edge| edge.open(EDGE_CLASS)?.try_into())
        .collect::<Result<Vec<_>>>()?;
    Ok(PoseGraph { nodes, edges })
}

pub(crate) fn write_pose_graph(graph: &PoseGraph, writer: &mut dyn Write) -> Result<()> {
    let body = GraphBody {
        nodes: graph
            .nodes
            .iter()
            .map(|node| {
                Envelope::new(
                    NODE_CLASS,
                    NodeBody {
                        pose: matrix_to_vec(&node.pose),
                    },
                )
            })
            .collect(),
        edges: graph
            .edges
            .iter()
            .map(|edge| {
                Envelope::new(
                    EDGE_CLASS,
                    EdgeBody {
                        source_node_id: edge.source_node_id,
                        target_node_id: edge.target_node_id,
                        transformation: matrix_to_vec(&edge.transformation),
                        information: matrix_to_vec(&edge.information),
                        uncertain: edge.uncertain,
                        confidence: edge.confidence,
                    },
                )
            })
            .collect(),
    };
    write_envelope(writer, GRAPH_CLASS, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshport_core::{Matrix4d, Matrix6d};
    use std::io::Cursor;

    fn graph() -> PoseGraph {
        let mut pose = Matrix4d::identity();
        pose[(0, 3)] = 1.25;
        let mut information = Matrix6d::identity() * 3.0;
        information[(5, 0)] = 0.5;
        PoseGraph {
            nodes: vec![PoseGraphNode::default(), PoseGraphNode::new(pose)],
            edges: vec![PoseGraphEdge::new(0, 1, pose, information, true, 0.75)],
        }
    }

    #[test]
    fn test_round_trip_is_exact() {
        let original = graph();
        let mut out: Vec<u8> = Vec::new();
        write_pose_graph(&original, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["nodes"][1]["class_name"], NODE_CLASS);
        assert_eq!(value["edges"][0]["information"].as_array().unwrap().len(), 36);

        assert_eq!(read_pose_graph(&mut Cursor::new(out)).unwrap(), original);
    }

    #[test]
    fn test_short_information_matrix() {
        let mut out: Vec<u8> = Vec::new();
        write_pose_graph(&graph(), &mut out).unwrap();
        let mut value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        value["edges"][0]["information"] = serde_json::json!([1.0, 2.0]);
        let text = serde_json::to_vec(&value).unwrap();
        assert!(matches!(read_pose_graph(&mut Cursor::new(text)), Err(Error::Parse(_))));
    }
}

//! Node-graph document model.
//!
//! # Invariants
//! - Every edge references two existing, distinct nodes.
//! - At most one edge exists per ordered `(source, target)` pair.

use crate::model::Position;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

pub type NodeId = Uuid;
pub type EdgeId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub label: String,
    #[serde(default)]
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
}

/// Whole graph persisted as one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl GraphDocument {
    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn has_edge(&self, source: NodeId, target: NodeId) -> bool {
        self.edges
            .iter()
            .any(|edge| edge.source == source && edge.target == target)
    }

    /// Edges touching `node`, in either direction.
    pub fn incident_edges(&self, node: NodeId) -> impl Iterator<Item = &GraphEdge> {
        self.edges
            .iter()
            .filter(move |edge| edge.source == node || edge.target == node)
    }

    /// Drops dangling, self-looping and duplicate edges.
    ///
    /// Returns how many edges were removed.
    pub fn prune_invalid_edges(&mut self) -> usize {
        let before = self.edges.len();
        let node_ids: HashSet<NodeId> =
            self.nodes.iter().map(|node| node.id).collect();
        let mut seen = HashSet::new();
        self.edges.retain(|edge| {
            edge.source != edge.target
                && node_ids.contains(&edge.source)
                && node_ids.contains(&edge.target)
                && seen.insert((edge.source, edge.target))
        });
        before - self.edges.len()
    }
}

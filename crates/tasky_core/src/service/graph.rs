//! Node-graph editor controller.
//!
//! # Responsibility
//! - Maintain nodes and directed edges of the active project's graph.
//! - Auto-save on an interval rather than on every drag step.
//!
//! # Invariants
//! - Removing a node removes every incident edge.
//! - `connect` never creates self loops, dangling or duplicate edges.
//! - Stored documents are pruned of invalid edges on load.

use crate::model::graph::{EdgeId, GraphDocument, GraphEdge, GraphNode, NodeId};
use crate::model::project::Project;
use crate::model::Position;
use crate::repo::document_repo::LoadSource;
use crate::service::save_policy::SavePolicy;
use crate::service::scoped_document::{ProjectScoped, ScopedDocument};
use crate::storage_key::BaseKey;
use crate::store::KvStore;
use log::{info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};
use uuid::Uuid;

pub const GRAPH_BASE_KEY: &str = "graph";
pub const DEFAULT_GRAPH_AUTOSAVE: Duration = Duration::from_secs(10);
const MODULE: &str = "graph";

pub type GraphResult<T> = Result<T, GraphError>;

/// Errors from graph edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    NodeNotFound(NodeId),
    EdgeNotFound(EdgeId),
    SelfLoop(NodeId),
    DuplicateEdge { source: NodeId, target: NodeId },
}

impl Display for GraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "graph node not found: {id}"),
            Self::EdgeNotFound(id) => write!(f, "graph edge not found: {id}"),
            Self::SelfLoop(id) => write!(f, "edge would loop node {id} onto itself"),
            Self::DuplicateEdge { source, target } => {
                write!(f, "edge already exists: {source} -> {target}")
            }
        }
    }
}

impl Error for GraphError {}

/// Graph document of the active project.
pub struct GraphController<'s, S: KvStore + ?Sized> {
    graph: ScopedDocument<'s, S, GraphDocument>,
}

impl<'s, S: KvStore + ?Sized> GraphController<'s, S> {
    pub fn open(
        store: &'s S,
        base_key: BaseKey,
        active: Option<&Project>,
        autosave: Duration,
    ) -> Self {
        let mut controller = Self {
            graph: ScopedDocument::open(
                store,
                base_key,
                active,
                SavePolicy::Interval(autosave),
                MODULE,
            ),
        };
        controller.prune_loaded();
        controller
    }

    pub fn document(&self) -> &GraphDocument {
        self.graph.document()
    }

    pub fn add_node(&mut self, label: impl Into<String>, position: Position) -> GraphNode {
        let node = GraphNode {
            id: Uuid::new_v4(),
            label: label.into(),
            position,
        };
        let created = node.clone();
        self.graph.mutate(|graph| graph.nodes.push(node));
        created
    }

    pub fn rename_node(&mut self, id: NodeId, label: impl Into<String>) -> GraphResult<()> {
        let label = label.into();
        self.graph.try_mutate(|graph| {
            let node = find_node_mut(graph, id)?;
            node.label = label;
            Ok(())
        })
    }

    pub fn move_node(&mut self, id: NodeId, position: Position) -> GraphResult<()> {
        self.graph.try_mutate(|graph| {
            let node = find_node_mut(graph, id)?;
            node.position = position;
            Ok(())
        })
    }

    /// Removes the node and its incident edges; returns removed edge count.
    pub fn remove_node(&mut self, id: NodeId) -> GraphResult<usize> {
        self.graph.try_mutate(|graph| {
            let index = graph
                .nodes
                .iter()
                .position(|node| node.id == id)
                .ok_or(GraphError::NodeNotFound(id))?;
            graph.nodes.remove(index);
            let incident: HashSet<EdgeId> = graph.incident_edges(id).map(|edge| edge.id).collect();
            graph.edges.retain(|edge| !incident.contains(&edge.id));
            Ok(incident.len())
        })
    }

    /// Adds a directed edge `source -> target`.
    pub fn connect(&mut self, source: NodeId, target: NodeId) -> GraphResult<GraphEdge> {
        self.graph.try_mutate(|graph| {
            if source == target {
                return Err(GraphError::SelfLoop(source));
            }
            for id in [source, target] {
                if graph.node(id).is_none() {
                    return Err(GraphError::NodeNotFound(id));
                }
            }
            if graph.has_edge(source, target) {
                return Err(GraphError::DuplicateEdge { source, target });
            }
            let edge = GraphEdge {
                id: Uuid::new_v4(),
                source,
                target,
            };
            graph.edges.push(edge.clone());
            Ok(edge)
        })
    }

    pub fn disconnect(&mut self, edge_id: EdgeId) -> GraphResult<GraphEdge> {
        self.graph.try_mutate(|graph| {
            let index = graph
                .edges
                .iter()
                .position(|edge| edge.id == edge_id)
                .ok_or(GraphError::EdgeNotFound(edge_id))?;
            Ok(graph.edges.remove(index))
        })
    }

    pub fn key(&self) -> &str {
        self.graph.key()
    }

    pub fn last_load(&self) -> LoadSource {
        self.graph.last_load()
    }

    pub fn has_pending_save(&self) -> bool {
        self.graph.is_dirty()
    }

    pub fn reload(&mut self) {
        self.graph.reload();
        self.prune_loaded();
    }

    fn prune_loaded(&mut self) {
        let mut probe = self.graph.document().clone();
        if probe.prune_invalid_edges() == 0 {
            return;
        }
        let removed = self.graph.mutate(GraphDocument::prune_invalid_edges);
        warn!(
            "event=graph_prune module={MODULE} status=ok key={} removed_edges={removed}",
            self.graph.key()
        );
    }
}

impl<S: KvStore + ?Sized> ProjectScoped for GraphController<'_, S> {
    fn rescope(&mut self, active: Option<&Project>) {
        self.graph.rescope(active);
        self.prune_loaded();
        info!(
            "event=graph_rescope module={MODULE} status=ok nodes={} edges={}",
            self.graph.document().nodes.len(),
            self.graph.document().edges.len()
        );
    }

    fn tick(&mut self, now: Instant) {
        self.graph.tick(now);
    }

    fn flush(&mut self) {
        self.graph.flush();
    }
}

fn find_node_mut(graph: &mut GraphDocument, id: NodeId) -> GraphResult<&mut GraphNode> {
    graph
        .nodes
        .iter_mut()
        .find(|node| node.id == id)
        .ok_or(GraphError::NodeNotFound(id))
}

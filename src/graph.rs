use indexmap::IndexMap;
use serde::Serialize;

use crate::node::{PodGroup, TreeNode};

pub const NODE_WIDTH: f64 = 282.0;
pub const NODE_HEIGHT: f64 = 52.0;
pub const TRAFFIC_NODE_WIDTH: f64 = 30.0;
/// Extra height per pod-group summary row beyond the base node height.
pub const POD_ROW_HEIGHT: f64 = 30.0;

pub const FILTERED_INDICATOR_NODE: &str = "__filtered_indicator__";
pub const EXTERNAL_TRAFFIC_NODE: &str = "__external_traffic__";
pub const INTERNAL_TRAFFIC_NODE: &str = "__internal_traffic__";

/// Sibling resources of one kind collapsed under a shared parent.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupedNode {
    pub parent_id: String,
    pub kind: String,
    /// Keys of the nodes this pseudo-node replaces, in sibling order.
    pub member_keys: Vec<String>,
    pub count: usize,
}

/// A workload whose pod children were folded into a summary.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodGroupNode {
    pub node: TreeNode,
    pub group: PodGroup,
}

/// Every shape a graph node can take, discriminated explicitly rather than
/// by optional-field sniffing.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeKind {
    Resource(TreeNode),
    Grouped(GroupedNode),
    PodGroup(PodGroupNode),
    TrafficAnchor { external: bool },
    LoadBalancer { label: String, color: String },
    FilteredIndicator { count: usize },
}

impl NodeKind {
    /// The working tree node behind this graph node, when there is one.
    pub fn tree_node(&self) -> Option<&TreeNode> {
        match self {
            NodeKind::Resource(node) => Some(node),
            NodeKind::PodGroup(pg) => Some(&pg.node),
            _ => None,
        }
    }

    /// Short display label used by exporters.
    pub fn label(&self) -> String {
        match self {
            NodeKind::Resource(node) => node.name.clone(),
            NodeKind::Grouped(group) => format!("{} {}", group.count, group.kind),
            NodeKind::PodGroup(pg) => {
                format!("{} ({} pods)", pg.node.name, pg.group.pods.len())
            }
            NodeKind::TrafficAnchor { external: true } => "external traffic".to_string(),
            NodeKind::TrafficAnchor { external: false } => "internal traffic".to_string(),
            NodeKind::LoadBalancer { label, .. } => label.clone(),
            NodeKind::FilteredIndicator { count } => format!("{} filtered", count),
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub payload: NodeKind,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    /// One strand color per traffic source sharing this edge; empty for
    /// plain ownership edges.
    pub colors: Vec<String>,
}

/// The per-build graph under construction: an arena of nodes keyed by their
/// stable string id plus a flat edge list. A fresh instance is built on
/// every pass; nothing is carried across builds.
#[derive(Clone, Debug, Default)]
pub struct ResourceGraph {
    nodes: IndexMap<String, GraphNode>,
    edges: Vec<GraphEdge>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a node. Position is assigned later by layout.
    pub fn set_node(&mut self, id: &str, width: f64, height: f64, payload: NodeKind) {
        self.nodes.insert(
            id.to_string(),
            GraphNode {
                id: id.to_string(),
                x: 0.0,
                y: 0.0,
                width,
                height,
                payload,
            },
        );
    }

    /// Adds an edge, de-duplicating on (source, target). Colors from a
    /// repeated registration are appended if not already present.
    pub fn set_edge(&mut self, source: &str, target: &str, colors: Vec<String>) {
        if let Some(edge) = self
            .edges
            .iter_mut()
            .find(|e| e.source == source && e.target == target)
        {
            for color in colors {
                if !edge.colors.contains(&color) {
                    edge.colors.push(color);
                }
            }
            return;
        }
        self.edges.push(GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
            colors,
        });
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_ids(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut GraphNode> {
        self.nodes.values_mut()
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn predecessors(&self, id: &str) -> Vec<String> {
        self.edges
            .iter()
            .filter(|e| e.target == id)
            .map(|e| e.source.clone())
            .collect()
    }

    pub fn successors(&self, id: &str) -> Vec<String> {
        self.edges
            .iter()
            .filter(|e| e.source == id)
            .map(|e| e.target.clone())
            .collect()
    }

    /// Removes a node and every edge touching it.
    pub fn remove_node(&mut self, id: &str) {
        self.nodes.shift_remove(id);
        self.edges.retain(|e| e.source != id && e.target != id);
    }

    /// Removes a node while rewiring every (predecessor, successor) pair
    /// into a direct edge, preserving reachability through the removed node.
    pub fn contract_node(&mut self, id: &str) {
        let predecessors = self.predecessors(id);
        let successors = self.successors(id);
        self.remove_node(id);
        for parent in &predecessors {
            for child in &successors {
                if parent != child {
                    self.set_edge(parent, child, Vec::new());
                }
            }
        }
    }

    pub fn stats(&self) -> String {
        format!("Nodes: {}, Edges: {}", self.nodes.len(), self.edges.len())
    }
}

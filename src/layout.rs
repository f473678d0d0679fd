use serde::Serialize;
use std::collections::HashMap;

use crate::graph::{ResourceGraph, INTERNAL_TRAFFIC_NODE};

/// Hierarchical placement primitive. The build pipeline only depends on
/// this seam; tests and embedders can substitute their own engine.
pub trait LayoutEngine {
    /// Assigns absolute x/y coordinates to every node in the graph.
    fn layout(&self, graph: &mut ResourceGraph);
}

/// Built-in layered placement: nodes are ranked left-to-right by longest
/// path from their sources, then stacked top-down within each rank in
/// insertion order.
pub struct LayeredLayout {
    pub node_sep: f64,
    pub rank_sep: f64,
    pub margin_x: f64,
    pub margin_y: f64,
}

impl Default for LayeredLayout {
    fn default() -> Self {
        Self {
            node_sep: 15.0,
            rank_sep: 60.0,
            margin_x: 10.0,
            margin_y: 10.0,
        }
    }
}

impl LayeredLayout {
    fn ranks(&self, graph: &ResourceGraph) -> HashMap<String, usize> {
        fn rank_of(
            id: &str,
            graph: &ResourceGraph,
            memo: &mut HashMap<String, usize>,
            on_stack: &mut Vec<String>,
        ) -> usize {
            if let Some(rank) = memo.get(id) {
                return *rank;
            }
            // A malformed input could still cycle; break the cycle instead
            // of recursing forever.
            if on_stack.iter().any(|s| s == id) {
                return 0;
            }
            on_stack.push(id.to_string());
            let rank = graph
                .predecessors(id)
                .iter()
                .map(|parent| rank_of(parent, graph, memo, on_stack) + 1)
                .max()
                .unwrap_or(0);
            on_stack.pop();
            memo.insert(id.to_string(), rank);
            rank
        }

        let mut memo = HashMap::new();
        let mut on_stack = Vec::new();
        for id in graph.node_ids() {
            rank_of(&id, graph, &mut memo, &mut on_stack);
        }
        memo
    }
}

impl LayoutEngine for LayeredLayout {
    fn layout(&self, graph: &mut ResourceGraph) {
        let ranks = self.ranks(graph);
        let max_rank = ranks.values().copied().max().unwrap_or(0);

        // Column x offsets accumulate the widest node of each rank.
        let mut column_x = vec![self.margin_x; max_rank + 2];
        for rank in 0..=max_rank {
            let widest = graph
                .nodes()
                .filter(|n| ranks.get(&n.id) == Some(&rank))
                .map(|n| n.width)
                .fold(0.0, f64::max);
            column_x[rank + 1] = column_x[rank] + widest + self.rank_sep;
        }

        let mut next_y = vec![self.margin_y; max_rank + 1];
        let order = graph.node_ids();
        for id in order {
            let rank = ranks.get(&id).copied().unwrap_or(0);
            if let Some(node) = graph.node_mut(&id) {
                node.x = column_x[rank];
                node.y = next_y[rank];
                next_y[rank] += node.height + self.node_sep;
            }
        }
    }
}

#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

/// Overall canvas extent: the max right/bottom edge over all placed nodes.
pub fn graph_size(graph: &ResourceGraph) -> CanvasSize {
    let mut size = CanvasSize::default();
    for node in graph.nodes() {
        size.width = size.width.max(node.x + node.width);
        size.height = size.height.max(node.y + node.height);
    }
    size
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct Line {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// Renderable geometry for one edge: a short polyline from the source's
/// right edge to the target's left edge, plus the traffic color strands.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct EdgeGeometry {
    pub from: String,
    pub to: String,
    pub colors: Vec<String>,
    pub lines: Vec<Line>,
}

/// Derives line segments for every drawable edge after layout. Edges
/// touching the internal-traffic anchor are skipped (it seeds layout but is
/// never drawn). Parallel edges into one target fan in at evenly spaced
/// vertical offsets instead of overlapping.
pub fn edge_geometry(graph: &ResourceGraph) -> Vec<EdgeGeometry> {
    let mut incoming_total: HashMap<&str, usize> = HashMap::new();
    let mut incoming_seen: HashMap<&str, usize> = HashMap::new();
    for edge in graph.edges() {
        if edge.source == INTERNAL_TRAFFIC_NODE || edge.target == INTERNAL_TRAFFIC_NODE {
            continue;
        }
        *incoming_total.entry(edge.target.as_str()).or_default() += 1;
    }

    let mut result = Vec::new();
    for edge in graph.edges() {
        if edge.source == INTERNAL_TRAFFIC_NODE || edge.target == INTERNAL_TRAFFIC_NODE {
            continue;
        }
        let (source, target) = match (graph.node(&edge.source), graph.node(&edge.target)) {
            (Some(s), Some(t)) => (s, t),
            _ => continue,
        };

        let total = incoming_total[edge.target.as_str()];
        let seen = incoming_seen.entry(edge.target.as_str()).or_default();
        *seen += 1;
        let fan_index = *seen;

        let x1 = source.x + source.width;
        let y1 = source.y + source.height / 2.0;
        let x2 = target.x;
        let y2 = target.y + target.height * (fan_index as f64) / (total as f64 + 1.0);

        let lines = if (y1 - y2).abs() < f64::EPSILON {
            vec![Line { x1, y1, x2, y2 }]
        } else {
            let bend_x = (x1 + x2) / 2.0;
            vec![
                Line {
                    x1,
                    y1,
                    x2: bend_x,
                    y2: y1,
                },
                Line {
                    x1: bend_x,
                    y1,
                    x2: bend_x,
                    y2,
                },
                Line {
                    x1: bend_x,
                    y1: y2,
                    x2,
                    y2,
                },
            ]
        };
        result.push(EdgeGeometry {
            from: edge.source.clone(),
            to: edge.target.clone(),
            colors: edge.colors.clone(),
            lines,
        });
    }
    result
}

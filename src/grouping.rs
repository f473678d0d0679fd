use indexmap::IndexMap;
use tracing::debug;

use crate::build::NodeExpansion;
use crate::graph::{GroupedNode, NodeKind, ResourceGraph, NODE_HEIGHT, NODE_WIDTH};
use crate::node::POD_KIND;

/// Deterministic id for the pseudo-node that replaces a bucket of leaf
/// siblings; a pure function of parent id + kind so repeated builds keep
/// node identity stable for animation and selection.
pub fn grouped_node_id(parent_id: &str, kind: &str) -> String {
    format!("{}/group/{}", parent_id, kind)
}

/// Collapses, for every parent, buckets of more than one childless sibling
/// of the same kind into a single grouped pseudo-node. Only plain resource
/// leaves participate; pod-group parents and synthetic nodes are left
/// alone. Buckets whose pseudo-node id the user has expanded stay
/// uncollapsed.
pub fn group_leaf_siblings(graph: &mut ResourceGraph, expansion: &dyn NodeExpansion) {
    for parent_id in graph.node_ids() {
        let children = graph.successors(&parent_id);
        if children.len() < 2 {
            continue;
        }

        // Bucket childless resource children by kind, preserving sibling
        // order.
        let mut buckets: IndexMap<String, Vec<String>> = IndexMap::new();
        for child_id in &children {
            if !graph.successors(child_id).is_empty() {
                continue;
            }
            let kind = match graph.node(child_id).map(|n| &n.payload) {
                Some(NodeKind::Resource(node)) => node.kind.clone(),
                _ => continue,
            };
            // Pods have their own aggregation path; an individually shown
            // pod stays individual.
            if kind == POD_KIND {
                continue;
            }
            buckets.entry(kind).or_default().push(child_id.clone());
        }

        for (kind, member_keys) in buckets {
            if member_keys.len() < 2 {
                continue;
            }
            let group_id = grouped_node_id(&parent_id, &kind);
            if expansion.is_expanded(&group_id) {
                continue;
            }
            debug!(
                "Grouping {} childless {} siblings under {}",
                member_keys.len(),
                kind,
                parent_id
            );
            for member in &member_keys {
                graph.remove_node(member);
            }
            let count = member_keys.len();
            graph.set_node(
                &group_id,
                NODE_WIDTH,
                NODE_HEIGHT,
                NodeKind::Grouped(GroupedNode {
                    parent_id: parent_id.clone(),
                    kind,
                    member_keys,
                    count,
                }),
            );
            graph.set_edge(&parent_id, &group_id, Vec::new());
        }
    }
}

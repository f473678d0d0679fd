use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::debug;

use crate::identity::{node_key, tree_node_key};
use crate::model::{ApplicationTree, ResourceStatus};
use crate::node::TreeNode;

/// Joins the live tree with the application's reported status list and
/// produces the working node index for one build pass, keyed by stable node
/// id. Inputs are only read; every entry is a fresh working copy.
///
/// The orphaned pass is additive: an orphaned node never replaces a managed
/// node that already claimed the same key.
pub fn enrich_nodes(
    tree: &ApplicationTree,
    statuses: &[ResourceStatus],
    show_orphaned: bool,
) -> IndexMap<String, TreeNode> {
    let status_by_key: HashMap<String, &ResourceStatus> = statuses
        .iter()
        .map(|status| (node_key(status), status))
        .collect();

    let enrich = |node: &crate::model::ResourceNode, orphaned: bool| -> TreeNode {
        let mut tree_node = TreeNode::from_resource(node, orphaned);
        if let Some(status) = status_by_key.get(&node_key(node)) {
            tree_node.health = status.health.clone();
            tree_node.status = status.status;
            tree_node.hook = status.hook;
            tree_node.requires_pruning = status.requires_pruning;
        }
        tree_node
    };

    let mut by_key: IndexMap<String, TreeNode> = IndexMap::new();
    for node in &tree.nodes {
        by_key.insert(tree_node_key(node), enrich(node, false));
    }
    if show_orphaned {
        for node in &tree.orphaned_nodes {
            by_key
                .entry(tree_node_key(node))
                .or_insert_with(|| enrich(node, true));
        }
    }

    debug!(
        "Enriched {} nodes ({} managed, {} orphaned candidates)",
        by_key.len(),
        tree.nodes.len(),
        tree.orphaned_nodes.len()
    );
    by_key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HealthStatus, HealthStatusCode, ResourceNode, SyncStatusCode};

    fn resource(kind: &str, name: &str, uid: &str) -> ResourceNode {
        ResourceNode {
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: "default".to_string(),
            uid: uid.to_string(),
            ..Default::default()
        }
    }

    fn status_for(node: &ResourceNode, sync: SyncStatusCode, health: HealthStatusCode) -> ResourceStatus {
        ResourceStatus {
            group: node.group.clone(),
            kind: node.kind.clone(),
            namespace: node.namespace.clone(),
            name: node.name.clone(),
            status: Some(sync),
            health: Some(HealthStatus {
                status: health,
                message: String::new(),
            }),
            hook: false,
            requires_pruning: true,
            ..Default::default()
        }
    }

    #[test]
    fn status_fields_are_copied_onto_matching_nodes() {
        let deploy = resource("Deployment", "web", "");
        let tree = ApplicationTree {
            nodes: vec![deploy.clone()],
            orphaned_nodes: vec![],
        };
        let statuses = vec![status_for(&deploy, SyncStatusCode::Synced, HealthStatusCode::Healthy)];
        let enriched = enrich_nodes(&tree, &statuses, false);
        let node = enriched.values().next().unwrap();
        assert_eq!(node.status, Some(SyncStatusCode::Synced));
        assert_eq!(node.health_code(), HealthStatusCode::Healthy);
        assert!(node.requires_pruning);
    }

    #[test]
    fn node_without_status_keeps_fields_unset() {
        let tree = ApplicationTree {
            nodes: vec![resource("ConfigMap", "cm", "")],
            orphaned_nodes: vec![],
        };
        let enriched = enrich_nodes(&tree, &[], false);
        let node = enriched.values().next().unwrap();
        assert!(node.status.is_none());
        assert!(node.health.is_none());
        assert_eq!(node.health_code(), HealthStatusCode::Unknown);
    }

    #[test]
    fn enrichment_does_not_mutate_inputs() {
        let deploy = resource("Deployment", "web", "u-1");
        let tree = ApplicationTree {
            nodes: vec![deploy.clone()],
            orphaned_nodes: vec![resource("ConfigMap", "leftover", "u-2")],
        };
        let statuses = vec![status_for(&deploy, SyncStatusCode::OutOfSync, HealthStatusCode::Degraded)];
        let tree_before = tree.clone();
        let statuses_before = statuses.clone();
        let _ = enrich_nodes(&tree, &statuses, true);
        assert_eq!(tree, tree_before);
        assert_eq!(statuses, statuses_before);
    }

    #[test]
    fn orphaned_nodes_are_tagged_and_skipped_when_disabled() {
        let tree = ApplicationTree {
            nodes: vec![resource("Deployment", "web", "")],
            orphaned_nodes: vec![resource("ConfigMap", "leftover", "")],
        };
        let without = enrich_nodes(&tree, &[], false);
        assert_eq!(without.len(), 1);
        let with = enrich_nodes(&tree, &[], true);
        assert_eq!(with.len(), 2);
        let orphan = with.values().find(|n| n.kind == "ConfigMap").unwrap();
        assert!(orphan.orphaned);
    }

    #[test]
    fn managed_node_wins_over_orphaned_twin() {
        let managed = resource("Deployment", "web", "shared-uid");
        let orphaned_twin = resource("Deployment", "web", "shared-uid");
        let tree = ApplicationTree {
            nodes: vec![managed],
            orphaned_nodes: vec![orphaned_twin],
        };
        let enriched = enrich_nodes(&tree, &[], true);
        assert_eq!(enriched.len(), 1);
        assert!(!enriched.values().next().unwrap().orphaned);
    }
}

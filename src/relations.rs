use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::colors::palette_color;
use crate::identity::{node_key, tree_node_key};
use crate::model::ResourceNetworkingInfo;
use crate::node::{compare_nodes, TreeNode};

/// Children of each parent, keyed by the parent's stable node id.
pub type ChildMap = HashMap<String, Vec<TreeNode>>;

/// Parent/child derivation for the ownership hierarchy.
pub struct OwnershipRelations {
    /// Nodes rendered directly under the application root: no parent refs,
    /// or present in the managed-resources status list (a managed resource
    /// whose declared owner is outside the visible tree still renders as a
    /// root instead of being dropped).
    pub roots: Vec<TreeNode>,
    /// Non-root nodes, attached under each declared parent. Nodes whose
    /// parents never materialize in the graph are laid out independently.
    pub orphans: Vec<TreeNode>,
    pub children: ChildMap,
}

pub fn build_ownership(
    nodes: &IndexMap<String, TreeNode>,
    managed_keys: &HashSet<String>,
) -> OwnershipRelations {
    let mut roots = Vec::new();
    let mut orphans = Vec::new();
    let mut children: ChildMap = HashMap::new();

    for node in nodes.values() {
        if node.parent_refs.is_empty() || managed_keys.contains(&node_key(node)) {
            roots.push(node.clone());
        } else {
            orphans.push(node.clone());
            for parent in &node.parent_refs {
                children
                    .entry(tree_node_key(parent))
                    .or_default()
                    .push(node.clone());
            }
        }
    }
    roots.sort_by(compare_nodes);
    orphans.sort_by(compare_nodes);

    debug!(
        "Ownership relations: {} roots, {} attached nodes",
        roots.len(),
        orphans.len()
    );
    OwnershipRelations {
        roots,
        orphans,
        children,
    }
}

/// Parent/child derivation for the networking hierarchy, where edges follow
/// traffic flow instead of ownership.
pub struct NetworkRelations {
    /// Roots that accept traffic from outside the cluster (at least one
    /// ingress endpoint).
    pub external_roots: Vec<TreeNode>,
    /// Roots without ingress; they fan in through the hidden internal
    /// traffic anchor.
    pub internal_roots: Vec<TreeNode>,
    pub children: ChildMap,
    /// Deterministic color per traffic source (internal root ids and
    /// external ingress endpoints), assigned in first-seen order.
    pub colors_by_source: IndexMap<String, String>,
}

/// Traffic targets of one networking-aware parent: the union of nodes named
/// in its target refs and nodes whose labels superset-match its target
/// labels, de-duplicated by node id.
pub fn find_network_targets<'a>(
    nodes: &[&'a TreeNode],
    networking_info: &ResourceNetworkingInfo,
) -> Vec<&'a TreeNode> {
    let refs: HashSet<String> = networking_info
        .target_refs
        .iter()
        .map(node_key)
        .collect();

    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for target in nodes {
        let matches_ref = refs.contains(&node_key(*target));
        let matches_labels = !networking_info.target_labels.is_empty()
            && target
                .networking_info
                .as_ref()
                .map(|target_info| {
                    networking_info
                        .target_labels
                        .iter()
                        .all(|(key, value)| target_info.labels.get(key) == Some(value))
                })
                .unwrap_or(false);
        if (matches_ref || matches_labels) && seen.insert(tree_node_key(*target)) {
            result.push(*target);
        }
    }
    result
}

pub fn build_network(nodes: &IndexMap<String, TreeNode>) -> NetworkRelations {
    let network_nodes: Vec<&TreeNode> = nodes
        .values()
        .filter(|node| node.networking_info.is_some())
        .collect();

    let mut has_parents: HashSet<String> = HashSet::new();
    let mut children: ChildMap = HashMap::new();
    for (parent, info) in network_nodes
        .iter()
        .filter_map(|node| node.networking_info.as_ref().map(|info| (*node, info)))
    {
        for child in find_network_targets(&network_nodes, info) {
            has_parents.insert(tree_node_key(child));
            children
                .entry(tree_node_key(parent))
                .or_default()
                .push(child.clone());
        }
    }

    let mut external_roots: Vec<TreeNode> = Vec::new();
    let mut internal_roots: Vec<TreeNode> = Vec::new();
    for node in &network_nodes {
        if has_parents.contains(&tree_node_key(*node)) {
            continue;
        }
        let has_ingress = node
            .networking_info
            .as_ref()
            .map(|info| !info.ingress.is_empty())
            .unwrap_or(false);
        if has_ingress {
            external_roots.push((*node).clone());
        } else {
            internal_roots.push((*node).clone());
        }
    }
    external_roots.sort_by(compare_nodes);
    internal_roots.sort_by(compare_nodes);

    // Traffic sources are internal roots plus every distinct external
    // ingress endpoint, colored in first-seen order.
    let mut colors_by_source: IndexMap<String, String> = IndexMap::new();
    let internal_keys = internal_roots.iter().map(tree_node_key);
    let ingress_endpoints = external_roots.iter().flat_map(|root| {
        root.networking_info
            .as_ref()
            .map(|info| {
                info.ingress
                    .iter()
                    .map(|ingress| ingress.endpoint().to_string())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default()
    });
    for source in internal_keys.chain(ingress_endpoints) {
        let next = colors_by_source.len();
        colors_by_source
            .entry(source)
            .or_insert_with(|| palette_color(next));
    }

    debug!(
        "Network relations: {} external roots, {} internal roots, {} traffic sources",
        external_roots.len(),
        internal_roots.len(),
        colors_by_source.len()
    );
    NetworkRelations {
        external_roots,
        internal_roots,
        children,
        colors_by_source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LoadBalancerIngress, ResourceRef};
    use std::collections::HashMap as StdHashMap;

    fn node(kind: &str, name: &str) -> TreeNode {
        TreeNode {
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: "default".to_string(),
            ..Default::default()
        }
    }

    fn index(nodes: Vec<TreeNode>) -> IndexMap<String, TreeNode> {
        nodes
            .into_iter()
            .map(|n| (tree_node_key(&n), n))
            .collect()
    }

    fn parent_ref(node: &TreeNode) -> ResourceRef {
        ResourceRef {
            group: node.group.clone(),
            kind: node.kind.clone(),
            namespace: node.namespace.clone(),
            name: node.name.clone(),
            uid: node.uid.clone(),
            ..Default::default()
        }
    }

    #[test]
    fn parentless_nodes_are_roots() {
        let deploy = node("Deployment", "web");
        let mut rs = node("ReplicaSet", "web-1");
        rs.parent_refs.push(parent_ref(&deploy));
        let relations = build_ownership(&index(vec![deploy, rs]), &HashSet::new());
        assert_eq!(relations.roots.len(), 1);
        assert_eq!(relations.roots[0].kind, "Deployment");
        assert_eq!(relations.orphans.len(), 1);
        let children = relations
            .children
            .get("/Deployment/default/web")
            .unwrap();
        assert_eq!(children[0].name, "web-1");
    }

    #[test]
    fn managed_node_with_foreign_parent_is_still_a_root() {
        let mut cm = node("ConfigMap", "shared");
        cm.parent_refs.push(ResourceRef {
            kind: "Owner".to_string(),
            name: "elsewhere".to_string(),
            namespace: "other".to_string(),
            ..Default::default()
        });
        let managed: HashSet<String> = [node_key(&cm)].into_iter().collect();
        let relations = build_ownership(&index(vec![cm]), &managed);
        assert_eq!(relations.roots.len(), 1);
        assert!(relations.orphans.is_empty());
    }

    fn networked(kind: &str, name: &str, labels: &[(&str, &str)]) -> TreeNode {
        let mut n = node(kind, name);
        n.networking_info = Some(ResourceNetworkingInfo {
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        });
        n
    }

    #[test]
    fn targets_match_by_ref_and_by_label_superset() {
        let by_ref = networked("Pod", "p-ref", &[]);
        let by_label = networked("Pod", "p-label", &[("app", "web"), ("tier", "front")]);
        let miss = networked("Pod", "p-miss", &[("app", "api")]);
        let info = ResourceNetworkingInfo {
            target_refs: vec![parent_ref(&by_ref)],
            target_labels: StdHashMap::from([("app".to_string(), "web".to_string())]),
            ..Default::default()
        };
        let pool = [&by_ref, &by_label, &miss];
        let targets = find_network_targets(&pool, &info);
        let names: Vec<&str> = targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["p-ref", "p-label"]);
    }

    #[test]
    fn empty_target_labels_do_not_match_everything() {
        let pod = networked("Pod", "p", &[("app", "web")]);
        let info = ResourceNetworkingInfo::default();
        let pool = [&pod];
        assert!(find_network_targets(&pool, &info).is_empty());
    }

    #[test]
    fn network_roots_split_by_ingress() {
        let mut svc_ext = networked("Service", "svc-ext", &[]);
        svc_ext.networking_info.as_mut().unwrap().ingress = vec![LoadBalancerIngress {
            hostname: "lb.example.com".to_string(),
            ip: String::new(),
        }];
        svc_ext.networking_info.as_mut().unwrap().target_labels =
            StdHashMap::from([("app".to_string(), "web".to_string())]);
        let svc_int = networked("Service", "svc-int", &[]);
        let pod = networked("Pod", "p1", &[("app", "web")]);
        let relations = build_network(&index(vec![svc_ext, svc_int, pod]));
        assert_eq!(relations.external_roots.len(), 1);
        assert_eq!(relations.external_roots[0].name, "svc-ext");
        // the pod is a target, so only svc-int remains an internal root
        assert_eq!(relations.internal_roots.len(), 1);
        assert_eq!(relations.internal_roots[0].name, "svc-int");
        assert!(relations
            .colors_by_source
            .contains_key("lb.example.com"));
    }

    #[test]
    fn traffic_source_colors_are_first_seen_deterministic() {
        let a = networked("Service", "a", &[]);
        let b = networked("Service", "b", &[]);
        let relations = build_network(&index(vec![a.clone(), b.clone()]));
        let again = build_network(&index(vec![a, b]));
        assert_eq!(relations.colors_by_source, again.colors_by_source);
        let colors: Vec<&String> = relations.colors_by_source.values().collect();
        assert_ne!(colors[0], colors[1]);
    }
}

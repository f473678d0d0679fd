use std::collections::HashSet;
use tracing::info;

use crate::enrich::enrich_nodes;
use crate::filter::filter_graph;
use crate::graph::{
    GraphNode, NodeKind, PodGroupNode, ResourceGraph, EXTERNAL_TRAFFIC_NODE,
    INTERNAL_TRAFFIC_NODE, NODE_HEIGHT, NODE_WIDTH, POD_ROW_HEIGHT, TRAFFIC_NODE_WIDTH,
};
use crate::grouping::group_leaf_siblings;
use crate::identity::{app_node_key, node_key, tree_node_key, APPLICATION_GROUP};
use crate::layout::{
    edge_geometry, graph_size, CanvasSize, EdgeGeometry, LayeredLayout, LayoutEngine,
};
use crate::model::{
    Application, ApplicationTree, InfoItem, ResourceNetworkingInfo, ResourceStatus,
};
use crate::node::{compare_nodes, PodGroup, PodSummary, TreeNode};
use crate::relations::{build_network, build_ownership, ChildMap};

pub const DEFAULT_POD_GROUP_THRESHOLD: usize = 15;

/// Per-build switches, mirroring the view toggles of the surrounding UI.
#[derive(Clone, Copy, Debug)]
pub struct BuildOptions {
    /// Edges follow traffic flow (service to targets) instead of ownership.
    pub use_networking_hierarchy: bool,
    pub show_orphaned_resources: bool,
    /// Enables sibling grouping and pod aggregation.
    pub show_compact_nodes: bool,
    /// Pod count past which a pod group collapses to health-bucket rows.
    pub pod_group_threshold: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            use_networking_hierarchy: false,
            show_orphaned_resources: false,
            show_compact_nodes: false,
            pod_group_threshold: DEFAULT_POD_GROUP_THRESHOLD,
        }
    }
}

/// Externally owned per-node expansion state, queried during the build.
/// The engine never persists this; callers hand it in on every pass.
pub trait NodeExpansion {
    fn is_expanded(&self, id: &str) -> bool;
}

/// Plain in-memory expansion state, sufficient for the CLI and for tests.
#[derive(Clone, Debug, Default)]
pub struct ExpansionMap {
    expanded: HashSet<String>,
}

impl ExpansionMap {
    pub fn set_expanded(&mut self, id: &str, expanded: bool) {
        if expanded {
            self.expanded.insert(id.to_string());
        } else {
            self.expanded.remove(id);
        }
    }
}

impl FromIterator<String> for ExpansionMap {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            expanded: iter.into_iter().collect(),
        }
    }
}

impl NodeExpansion for ExpansionMap {
    fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }
}

/// Everything one graph build needs. The engine holds no state across
/// calls; a new pass always starts from fresh input.
pub struct BuildInput<'a> {
    pub app: &'a Application,
    pub tree: &'a ApplicationTree,
    pub statuses: &'a [ResourceStatus],
    pub options: BuildOptions,
    pub node_filter: Option<&'a dyn Fn(&TreeNode) -> bool>,
    pub expansion: &'a dyn NodeExpansion,
}

/// The read-only result handed to rendering.
#[derive(serde::Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BuildOutput {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<EdgeGeometry>,
    pub canvas: CanvasSize,
    /// Real resource nodes that survived filtering; drives the companion
    /// filter-options panel, not used internally.
    pub survivors: Vec<TreeNode>,
    pub filtered_count: usize,
}

/// Builds the positioned resource graph with the built-in layered layout.
pub fn build_resource_graph(input: &BuildInput) -> BuildOutput {
    build_with_engine(input, &LayeredLayout::default())
}

/// One full pass: enrich, derive relationships, group, aggregate pods,
/// register, filter, lay out, derive edge geometry.
pub fn build_with_engine(input: &BuildInput, engine: &dyn LayoutEngine) -> BuildOutput {
    let enriched = enrich_nodes(
        input.tree,
        input.statuses,
        input.options.show_orphaned_resources,
    );
    let app_id = app_node_key(input.app);
    let mut walker = TreeWalker {
        graph: ResourceGraph::new(),
        children: ChildMap::new(),
        visited: HashSet::new(),
        compact: input.options.show_compact_nodes,
        expansion: input.expansion,
    };

    let indicator_parent = if input.options.use_networking_hierarchy {
        let relations = build_network(&enriched);
        walker.children = relations.children;

        if !relations.external_roots.is_empty() {
            walker.graph.set_node(
                EXTERNAL_TRAFFIC_NODE,
                TRAFFIC_NODE_WIDTH,
                NODE_HEIGHT,
                NodeKind::TrafficAnchor { external: true },
            );
            for root in &relations.external_roots {
                let root_id = tree_node_key(root);
                let endpoints: Vec<String> = root
                    .networking_info
                    .as_ref()
                    .map(|info| {
                        info.ingress
                            .iter()
                            .map(|ingress| ingress.endpoint().to_string())
                            .collect()
                    })
                    .unwrap_or_default();
                let colors: Vec<String> = endpoints
                    .iter()
                    .filter_map(|endpoint| relations.colors_by_source.get(endpoint).cloned())
                    .collect();
                walker.process_node(root, root, &colors);
                for endpoint in &endpoints {
                    let lb_id = format!("{}:{}", EXTERNAL_TRAFFIC_NODE, endpoint);
                    let color = relations
                        .colors_by_source
                        .get(endpoint)
                        .cloned()
                        .unwrap_or_default();
                    walker.graph.set_node(
                        &lb_id,
                        NODE_WIDTH,
                        NODE_HEIGHT,
                        NodeKind::LoadBalancer {
                            label: endpoint.clone(),
                            color: color.clone(),
                        },
                    );
                    walker.graph.set_edge(&lb_id, &root_id, vec![color.clone()]);
                    walker
                        .graph
                        .set_edge(EXTERNAL_TRAFFIC_NODE, &lb_id, vec![color]);
                }
            }
        }

        if !relations.internal_roots.is_empty() {
            walker.graph.set_node(
                INTERNAL_TRAFFIC_NODE,
                TRAFFIC_NODE_WIDTH,
                NODE_HEIGHT,
                NodeKind::TrafficAnchor { external: false },
            );
            for root in &relations.internal_roots {
                let colors: Vec<String> = relations
                    .colors_by_source
                    .get(&tree_node_key(root))
                    .cloned()
                    .into_iter()
                    .collect();
                walker.process_node(root, root, &colors);
                walker
                    .graph
                    .set_edge(INTERNAL_TRAFFIC_NODE, &tree_node_key(root), Vec::new());
            }
        }

        if !relations.external_roots.is_empty() {
            EXTERNAL_TRAFFIC_NODE.to_string()
        } else {
            INTERNAL_TRAFFIC_NODE.to_string()
        }
    } else {
        let managed_keys: HashSet<String> =
            input.app.status.resources.iter().map(node_key).collect();
        let relations = build_ownership(&enriched, &managed_keys);
        walker.children = relations.children;

        for root in &relations.roots {
            walker.process_node(root, root, &[]);
            walker
                .graph
                .set_edge(&app_id, &tree_node_key(root), Vec::new());
        }
        // Nodes whose declared parents never materialized are laid out as
        // independent roots instead of being dropped.
        for orphan in &relations.orphans {
            if !walker.visited.contains(&tree_node_key(orphan)) {
                walker.process_node(orphan, orphan, &[]);
            }
        }
        walker.graph.set_node(
            &app_id,
            NODE_WIDTH,
            NODE_HEIGHT,
            NodeKind::Resource(app_root_node(input.app)),
        );
        if input.options.show_compact_nodes {
            group_leaf_siblings(&mut walker.graph, input.expansion);
        }
        app_id.clone()
    };

    let mut graph = walker.graph;

    // Pod groups grow with their row count; everything else keeps the
    // fixed node height.
    for node in graph.nodes_mut() {
        if let NodeKind::PodGroup(pg) = &node.payload {
            let rows = pg.group.rows(input.options.pod_group_threshold) as f64;
            node.height = NODE_HEIGHT + rows * POD_ROW_HEIGHT;
        }
    }

    let mut filtered_count = 0;
    if let Some(predicate) = input.node_filter {
        filtered_count = filter_graph(&mut graph, &app_id, &indicator_parent, predicate);
    }
    let survivors: Vec<TreeNode> = graph
        .nodes()
        .filter_map(|node| node.payload.tree_node())
        .filter(|node| node.root_key.is_some())
        .cloned()
        .collect();

    engine.layout(&mut graph);
    let canvas = graph_size(&graph);
    let edges = edge_geometry(&graph);
    info!(
        "Built resource graph: {} ({} filtered out)",
        graph.stats(),
        filtered_count
    );

    BuildOutput {
        nodes: graph.nodes().cloned().collect(),
        edges,
        canvas,
        survivors,
        filtered_count,
    }
}

/// The application's own synthetic root node.
fn app_root_node(app: &Application) -> TreeNode {
    let mut info = Vec::new();
    if !app.spec.parameter_overrides.is_empty() {
        info.push(InfoItem {
            name: "Parameter overrides".to_string(),
            value: format!(
                "{} parameter override(s)",
                app.spec.parameter_overrides.len()
            ),
        });
    }
    // The app's summary external URLs ride on the root node the same way
    // they ride on any networked resource.
    let networking_info = if app.status.summary.external_urls.is_empty() {
        None
    } else {
        Some(ResourceNetworkingInfo {
            external_urls: app.status.summary.external_urls.clone(),
            ..Default::default()
        })
    };
    TreeNode {
        group: APPLICATION_GROUP.to_string(),
        kind: app.kind.clone(),
        namespace: app.metadata.namespace.clone(),
        name: app.metadata.name.clone(),
        resource_version: app.metadata.resource_version.clone(),
        created_at: app.metadata.creation_timestamp,
        status: Some(app.status.sync.status),
        health: Some(app.status.health.clone()),
        info,
        networking_info,
        ..Default::default()
    }
}

struct TreeWalker<'a> {
    graph: ResourceGraph,
    children: ChildMap,
    visited: HashSet<String>,
    compact: bool,
    expansion: &'a dyn NodeExpansion,
}

impl TreeWalker<'_> {
    /// Registers a node and descends into its children. The visited set
    /// guards against malformed multi-parent inputs cycling; a revisited
    /// child still gets its parent edge but is not re-descended.
    fn process_node(&mut self, node: &TreeNode, root: &TreeNode, colors: &[String]) {
        let node_id = tree_node_key(node);
        let root_id = tree_node_key(root);
        self.visited.insert(node_id.clone());

        let mut placed = node.clone();
        placed.root_key = Some(root_id.clone());
        self.graph
            .set_node(&node_id, NODE_WIDTH, NODE_HEIGHT, NodeKind::Resource(placed));

        let mut kids = self.children.get(&node_id).cloned().unwrap_or_default();
        kids.sort_by(compare_nodes);
        let mut visible_children = 0usize;
        for child in kids {
            let child_id = tree_node_key(&child);
            if child_id == root_id {
                continue;
            }
            if self.compact && child.is_pod() && !self.expansion.is_expanded(&node_id) {
                self.fold_pod(&node_id, &child);
                continue;
            }
            visible_children += 1;
            self.graph.set_edge(&node_id, &child_id, colors.to_vec());
            if !self.visited.contains(&child_id) {
                self.process_node(&child, root, colors);
            }
        }
        if visible_children > 0 {
            if let Some(node) = self.graph.node_mut(&node_id) {
                if let NodeKind::PodGroup(pg) = &mut node.payload {
                    pg.group.visible_child_count = visible_children;
                }
            }
        }
    }

    /// Folds a pod child into its parent's pod group instead of inserting
    /// it as a graph node. The group is materialized on first use; the
    /// parent's node then renders as a pod group.
    fn fold_pod(&mut self, parent_id: &str, pod: &TreeNode) {
        let summary = PodSummary::from_node(pod);
        let Some(graph_node) = self.graph.node_mut(parent_id) else {
            return;
        };
        if let NodeKind::Resource(node) = &graph_node.payload {
            let node = node.clone();
            graph_node.payload = NodeKind::PodGroup(PodGroupNode {
                group: PodGroup::new(&node),
                node,
            });
        }
        if let NodeKind::PodGroup(pg) = &mut graph_node.payload {
            pg.group.pods.push(summary);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AppMetadata, ResourceNode, ResourceRef};

    fn resource(kind: &str, name: &str) -> ResourceNode {
        ResourceNode {
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: "default".to_string(),
            ..Default::default()
        }
    }

    fn child_of(parent: &ResourceNode, kind: &str, name: &str) -> ResourceNode {
        let mut node = resource(kind, name);
        node.parent_refs.push(ResourceRef {
            group: parent.group.clone(),
            kind: parent.kind.clone(),
            namespace: parent.namespace.clone(),
            name: parent.name.clone(),
            uid: parent.uid.clone(),
            ..Default::default()
        });
        node
    }

    fn app() -> Application {
        Application {
            metadata: AppMetadata {
                name: "app-1".to_string(),
                namespace: "default".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn build(tree: &ApplicationTree, options: BuildOptions) -> BuildOutput {
        let app = app();
        build_resource_graph(&BuildInput {
            app: &app,
            tree,
            statuses: &[],
            options,
            node_filter: None,
            expansion: &ExpansionMap::default(),
        })
    }

    fn node_by_id<'a>(out: &'a BuildOutput, id: &str) -> Option<&'a GraphNode> {
        out.nodes.iter().find(|n| n.id == id)
    }

    #[test]
    fn empty_tree_yields_only_the_app_root() {
        let out = build(&ApplicationTree::default(), BuildOptions::default());
        assert_eq!(out.nodes.len(), 1);
        assert_eq!(out.nodes[0].id, "gitops.io/Application/default/app-1");
        match &out.nodes[0].payload {
            NodeKind::Resource(node) => assert!(node.root_key.is_none()),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn roots_hang_off_the_app_node() {
        let deploy = resource("Deployment", "d1");
        let rs = child_of(&deploy, "ReplicaSet", "rs1");
        let tree = ApplicationTree {
            nodes: vec![deploy, rs],
            orphaned_nodes: vec![],
        };
        let out = build(&tree, BuildOptions::default());
        assert_eq!(out.nodes.len(), 3);
        let edge_pairs: Vec<(&str, &str)> = out
            .edges
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str()))
            .collect();
        assert!(edge_pairs
            .contains(&("gitops.io/Application/default/app-1", "/Deployment/default/d1")));
        assert!(edge_pairs.contains(&("/Deployment/default/d1", "/ReplicaSet/default/rs1")));
    }

    #[test]
    fn node_with_unknown_parent_is_laid_out_independently() {
        let mut stray = resource("Pod", "stray");
        stray.parent_refs.push(ResourceRef {
            kind: "ReplicaSet".to_string(),
            name: "missing".to_string(),
            namespace: "default".to_string(),
            ..Default::default()
        });
        let tree = ApplicationTree {
            nodes: vec![stray],
            orphaned_nodes: vec![],
        };
        let out = build(&tree, BuildOptions::default());
        let stray = node_by_id(&out, "/Pod/default/stray").unwrap();
        match &stray.payload {
            NodeKind::Resource(node) => {
                assert_eq!(node.root_key.as_deref(), Some("/Pod/default/stray"))
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn pods_fold_into_a_pod_group_under_compaction() {
        let deploy = resource("Deployment", "d1");
        let rs = child_of(&deploy, "ReplicaSet", "rs1");
        let pods: Vec<ResourceNode> = (0..3)
            .map(|i| child_of(&rs, "Pod", &format!("p{}", i)))
            .collect();
        let mut nodes = vec![deploy, rs];
        nodes.extend(pods);
        let tree = ApplicationTree {
            nodes,
            orphaned_nodes: vec![],
        };
        let options = BuildOptions {
            show_compact_nodes: true,
            ..Default::default()
        };
        let out = build(&tree, options);

        let rs_node = node_by_id(&out, "/ReplicaSet/default/rs1").unwrap();
        match &rs_node.payload {
            NodeKind::PodGroup(pg) => {
                assert_eq!(pg.group.pods.len(), 3);
                assert_eq!(pg.group.parent.name, "rs1");
            }
            other => panic!("expected pod group, got {:?}", other),
        }
        assert!(rs_node.height > NODE_HEIGHT);
        assert!(!out.nodes.iter().any(|n| n.id.contains("/Pod/")));
    }

    #[test]
    fn pods_stay_individual_without_compaction() {
        let rs = resource("ReplicaSet", "rs1");
        let pod = child_of(&rs, "Pod", "p0");
        let tree = ApplicationTree {
            nodes: vec![rs, pod],
            orphaned_nodes: vec![],
        };
        let out = build(&tree, BuildOptions::default());
        assert!(node_by_id(&out, "/Pod/default/p0").is_some());
    }

    #[test]
    fn mutual_parent_refs_terminate() {
        let mut a = resource("Widget", "a");
        let mut b = resource("Widget", "b");
        a.parent_refs.push(ResourceRef {
            kind: "Widget".to_string(),
            namespace: "default".to_string(),
            name: "b".to_string(),
            ..Default::default()
        });
        b.parent_refs.push(ResourceRef {
            kind: "Widget".to_string(),
            namespace: "default".to_string(),
            name: "a".to_string(),
            ..Default::default()
        });
        let tree = ApplicationTree {
            nodes: vec![a, b],
            orphaned_nodes: vec![],
        };
        let out = build(&tree, BuildOptions::default());
        assert!(node_by_id(&out, "/Widget/default/a").is_some());
        assert!(node_by_id(&out, "/Widget/default/b").is_some());
    }

    #[test]
    fn app_root_carries_override_tag() {
        let mut application = app();
        application.spec.parameter_overrides.push(InfoItem {
            name: "image".to_string(),
            value: "v2".to_string(),
        });
        let out = build_resource_graph(&BuildInput {
            app: &application,
            tree: &ApplicationTree::default(),
            statuses: &[],
            options: BuildOptions::default(),
            node_filter: None,
            expansion: &ExpansionMap::default(),
        });
        match &out.nodes[0].payload {
            NodeKind::Resource(node) => {
                assert_eq!(node.info[0].name, "Parameter overrides");
                assert_eq!(node.info[0].value, "1 parameter override(s)");
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn app_root_carries_summary_external_urls() {
        let mut application = app();
        application.status.summary.external_urls =
            vec!["https://app.example.com".to_string()];
        let out = build_resource_graph(&BuildInput {
            app: &application,
            tree: &ApplicationTree::default(),
            statuses: &[],
            options: BuildOptions::default(),
            node_filter: None,
            expansion: &ExpansionMap::default(),
        });
        match &out.nodes[0].payload {
            NodeKind::Resource(node) => {
                let info = node.networking_info.as_ref().unwrap();
                assert_eq!(info.external_urls, vec!["https://app.example.com"]);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }
}

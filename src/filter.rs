use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::{
    NodeKind, ResourceGraph, FILTERED_INDICATOR_NODE, NODE_HEIGHT, NODE_WIDTH,
};
use crate::model::{HealthStatusCode, SyncStatusCode};
use crate::node::TreeNode;

/// Declarative node filter: every populated dimension must match; an empty
/// list places no constraint on that dimension. Name entries are regular
/// expressions matched against the full resource name.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct NodeFilter {
    #[serde(default)]
    pub kinds: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub namespaces: Vec<String>,
    #[serde(default)]
    pub health: Vec<HealthStatusCode>,
    #[serde(default)]
    pub sync: Vec<SyncStatusCode>,
}

impl NodeFilter {
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
            && self.names.is_empty()
            && self.namespaces.is_empty()
            && self.health.is_empty()
            && self.sync.is_empty()
    }

    /// Compiles the name patterns; fails fast on an invalid expression
    /// instead of silently matching nothing at build time.
    pub fn compile(&self) -> Result<CompiledFilter, regex::Error> {
        let name_patterns = self
            .names
            .iter()
            .map(|pattern| Regex::new(&format!("^(?:{})$", pattern)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CompiledFilter {
            filter: self.clone(),
            name_patterns,
        })
    }
}

/// A `NodeFilter` with its name regexes compiled, usable as the build's
/// node predicate.
#[derive(Clone, Debug)]
pub struct CompiledFilter {
    filter: NodeFilter,
    name_patterns: Vec<Regex>,
}

impl CompiledFilter {
    pub fn matches(&self, node: &TreeNode) -> bool {
        let f = &self.filter;
        if !f.kinds.is_empty() && !f.kinds.contains(&node.kind) {
            return false;
        }
        if !self.name_patterns.is_empty()
            && !self.name_patterns.iter().any(|re| re.is_match(&node.name))
        {
            return false;
        }
        if !f.namespaces.is_empty() && !f.namespaces.contains(&node.namespace) {
            return false;
        }
        if !f.health.is_empty() && !f.health.contains(&node.health_code()) {
            return false;
        }
        if !f.sync.is_empty() {
            let sync = node.status.unwrap_or(SyncStatusCode::Unknown);
            if !f.sync.contains(&sync) {
                return false;
            }
        }
        true
    }
}

/// Removes every real resource node rejected by the predicate, contracting
/// its edges so predecessors connect directly to successors. Synthetic
/// anchors and the application's own root node are never removed; they are
/// required as edge endpoints for the rest of the graph.
///
/// When anything was removed, a single filtered-indicator node carrying the
/// removed count is attached under `indicator_parent`. Returns the number
/// of nodes removed.
pub fn filter_graph(
    graph: &mut ResourceGraph,
    app_key: &str,
    indicator_parent: &str,
    predicate: &dyn Fn(&TreeNode) -> bool,
) -> usize {
    let mut removed = 0;
    for id in graph.node_ids() {
        if id == app_key {
            continue;
        }
        let rejected = match graph.node(&id).map(|n| &n.payload) {
            Some(NodeKind::Resource(node)) | Some(NodeKind::PodGroup(crate::graph::PodGroupNode { node, .. })) => {
                node.root_key.is_some() && !predicate(node)
            }
            _ => false,
        };
        if rejected {
            graph.contract_node(&id);
            removed += 1;
        }
    }
    if removed > 0 {
        debug!("Filtered {} nodes out of the graph", removed);
        graph.set_node(
            FILTERED_INDICATOR_NODE,
            NODE_WIDTH,
            NODE_HEIGHT,
            NodeKind::FilteredIndicator { count: removed },
        );
        graph.set_edge(indicator_parent, FILTERED_INDICATOR_NODE, Vec::new());
    }
    removed
}

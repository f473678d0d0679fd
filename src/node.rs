use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

use crate::identity::{node_key, Identified, APPLICATION_GROUP};
use crate::model::{
    HealthStatus, HealthStatusCode, InfoItem, ResourceNetworkingInfo, ResourceNode, ResourceRef,
    SyncStatusCode,
};

pub const POD_KIND: &str = "Pod";
pub const REPLICA_SET_KIND: &str = "ReplicaSet";

/// How many pods fit on one summary row before a pod group grows taller.
pub const PODS_PER_ROW: usize = 8;

/// The engine's working representation of one resource: a `ResourceNode`
/// merged with its reported status plus build-pass bookkeeping. Built fresh
/// on every pass; backend inputs are never mutated.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
    pub uid: String,
    pub parent_refs: Vec<ResourceRef>,
    pub info: Vec<InfoItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub networking_info: Option<ResourceNetworkingInfo>,
    pub images: Vec<String>,
    pub resource_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SyncStatusCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthStatus>,
    pub hook: bool,
    pub requires_pruning: bool,
    pub orphaned: bool,
    /// Key of the top-most ancestor this node was reached from, or `None`
    /// for the pass's own entry points (the application root and synthetic
    /// anchors). Filtering only ever touches nodes with a root set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_key: Option<String>,
}

impl Identified for TreeNode {
    fn group(&self) -> &str {
        &self.group
    }
    fn kind(&self) -> &str {
        &self.kind
    }
    fn namespace(&self) -> &str {
        &self.namespace
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn uid(&self) -> &str {
        &self.uid
    }
}

impl TreeNode {
    pub fn from_resource(node: &ResourceNode, orphaned: bool) -> Self {
        Self {
            group: node.group.clone(),
            version: node.version.clone(),
            kind: node.kind.clone(),
            namespace: node.namespace.clone(),
            name: node.name.clone(),
            uid: node.uid.clone(),
            parent_refs: node.parent_refs.clone(),
            info: node.info.clone(),
            networking_info: node.networking_info.clone(),
            images: node.images.clone(),
            resource_version: node.resource_version.clone(),
            created_at: node.created_at,
            orphaned,
            ..Default::default()
        }
    }

    pub fn info_value(&self, name: &str) -> Option<&str> {
        self.info
            .iter()
            .find(|tag| tag.name == name)
            .map(|tag| tag.value.as_str())
    }

    /// Rollout revision from the `Revision` info tag, `Rev:` prefix stripped.
    pub fn revision(&self) -> String {
        self.info_value("Revision")
            .map(|value| value.strip_prefix("Rev:").unwrap_or(value).to_string())
            .unwrap_or_default()
    }

    /// Cluster node this pod runs on, from the `Node` info tag.
    pub fn host_node_name(&self) -> String {
        self.info_value("Node").unwrap_or_default().to_string()
    }

    pub fn is_pod(&self) -> bool {
        self.kind == POD_KIND
    }

    pub fn health_code(&self) -> HealthStatusCode {
        self.health
            .as_ref()
            .map(|h| h.status)
            .unwrap_or(HealthStatusCode::Unknown)
    }
}

/// True for a node that is itself a child application of this application.
pub fn is_app_node(node: &TreeNode) -> bool {
    node.kind == "Application" && node.group == APPLICATION_GROUP
}

/// Plain-text summary of a node, used as a tooltip/comment by exporters.
pub fn describe_node(node: &TreeNode) -> String {
    let mut lines = vec![
        format!("Kind: {}", node.kind),
        format!("Namespace: {}", node.namespace),
        format!("Name: {}", node.name),
    ];
    if !node.images.is_empty() {
        lines.push("Images:".to_string());
        for image in &node.images {
            lines.push(format!("- {}", image));
        }
    }
    lines.join("\n")
}

/// Numeric and non-numeric revisions form disjoint ordered classes, with
/// every numeric revision above every non-numeric one; mixing the two
/// comparison modes per pair would break transitivity.
fn compare_revision(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(na), Ok(nb)) => na.cmp(&nb),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Sibling ordering before layout: orphaned nodes sort after managed ones;
/// ReplicaSets surface the newest revision first; everything else falls back
/// to the identity key, then ascending revision as a final tiebreak.
pub fn compare_nodes(first: &TreeNode, second: &TreeNode) -> Ordering {
    let by_orphaned = (first.orphaned as u8).cmp(&(second.orphaned as u8));
    if by_orphaned != Ordering::Equal {
        return by_orphaned;
    }
    if first.kind == REPLICA_SET_KIND && second.kind == REPLICA_SET_KIND {
        let newest_first = compare_revision(&second.revision(), &first.revision());
        if newest_first != Ordering::Equal {
            return newest_first;
        }
    }
    let by_key = node_key(first).cmp(&node_key(second));
    if by_key != Ordering::Equal {
        return by_key;
    }
    compare_revision(&first.revision(), &second.revision())
}

/// One pod folded into a pod group: identity plus resolved placement and
/// health, rebuilt on every pass.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodSummary {
    pub name: String,
    pub uid: String,
    pub health: HealthStatusCode,
    pub node_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl PodSummary {
    pub fn from_node(pod: &TreeNode) -> Self {
        Self {
            name: pod.name.clone(),
            uid: pod.uid.clone(),
            health: pod.health_code(),
            node_name: pod.host_node_name(),
            created_at: pod.created_at,
        }
    }
}

/// Aggregated pod children of one workload. Materialized lazily the first
/// time a pod child is found under compaction; one instance per parent per
/// build.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodGroup {
    /// Full identity copy of the owning workload.
    pub parent: ResourceRef,
    pub pods: Vec<PodSummary>,
    /// Non-pod children that stay visible as ordinary nodes next to this
    /// group.
    pub visible_child_count: usize,
}

/// Health buckets recognized for row bucketing; other healths still count
/// in the raw pod list.
pub const POD_HEALTH_BUCKETS: [HealthStatusCode; 3] = [
    HealthStatusCode::Healthy,
    HealthStatusCode::Degraded,
    HealthStatusCode::Progressing,
];

impl PodGroup {
    pub fn new(parent: &TreeNode) -> Self {
        Self {
            parent: ResourceRef {
                group: parent.group.clone(),
                version: parent.version.clone(),
                kind: parent.kind.clone(),
                namespace: parent.namespace.clone(),
                name: parent.name.clone(),
                uid: parent.uid.clone(),
            },
            pods: Vec::new(),
            visible_child_count: 0,
        }
    }

    pub fn bucket_count(&self, bucket: HealthStatusCode) -> usize {
        self.pods.iter().filter(|pod| pod.health == bucket).count()
    }

    /// Summary rows this group renders as. Small groups pack pods eight to a
    /// row; past the threshold the group collapses to one row per non-empty
    /// health bucket.
    pub fn rows(&self, health_bucket_threshold: usize) -> usize {
        if self.pods.is_empty() {
            return 1;
        }
        if self.pods.len() > health_bucket_threshold {
            let buckets = POD_HEALTH_BUCKETS
                .iter()
                .filter(|bucket| self.bucket_count(**bucket) > 0)
                .count();
            buckets.max(1)
        } else {
            self.pods.len().div_ceil(PODS_PER_ROW)
        }
    }
}

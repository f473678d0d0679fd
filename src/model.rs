use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// ## Structure
/// This module contains the data structures of an application snapshot as
/// reported by the delivery controller.
///
/// ```text
/// Snapshot
///   ├── application: Application
///   │   ├── metadata: AppMetadata
///   │   └── status: AppStatus
///   │       ├── sync / health summary
///   │       └── resources: Vec<ResourceStatus>
///   └── tree: ApplicationTree
///       ├── nodes: Vec<ResourceNode>
///       └── orphanedNodes: Vec<ResourceNode>
/// ```
///
/// Field names follow the controller's wire format (camelCase), so payloads
/// deserialize directly from the API without a mapping layer.

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub version: String,
    pub kind: String,
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub uid: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct InfoItem {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerIngress {
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub ip: String,
}

impl LoadBalancerIngress {
    /// The ingress endpoint used as a traffic-source key, hostname preferred.
    pub fn endpoint(&self) -> &str {
        if self.hostname.is_empty() {
            &self.ip
        } else {
            &self.hostname
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceNetworkingInfo {
    #[serde(default)]
    pub target_labels: HashMap<String, String>,
    #[serde(default)]
    pub target_refs: Vec<ResourceRef>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub ingress: Vec<LoadBalancerIngress>,
    #[serde(default, rename = "externalURLs")]
    pub external_urls: Vec<String>,
}

/// A live resource reported by the state watcher. Read-only input to the
/// tree engine; enrichment always works on copies.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceNode {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub version: String,
    pub kind: String,
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub parent_refs: Vec<ResourceRef>,
    #[serde(default)]
    pub info: Vec<InfoItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networking_info: Option<ResourceNetworkingInfo>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub resource_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SyncStatusCode {
    #[default]
    Unknown,
    Synced,
    OutOfSync,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HealthStatusCode {
    #[default]
    Unknown,
    Progressing,
    Healthy,
    Suspended,
    Degraded,
    Missing,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: HealthStatusCode,
    #[serde(default)]
    pub message: String,
}

/// Per-resource status from the application's reported state. Joined onto
/// tree nodes during enrichment by identity key.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatus {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub version: String,
    pub kind: String,
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SyncStatusCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthStatus>,
    #[serde(default)]
    pub hook: bool,
    #[serde(default)]
    pub requires_pruning: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppMetadata {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub resource_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSyncSummary {
    #[serde(default)]
    pub status: SyncStatusCode,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSummary {
    #[serde(default, rename = "externalURLs")]
    pub external_urls: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppStatus {
    #[serde(default)]
    pub sync: AppSyncSummary,
    #[serde(default)]
    pub health: HealthStatus,
    #[serde(default)]
    pub resources: Vec<ResourceStatus>,
    #[serde(default)]
    pub summary: AppSummary,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSpec {
    /// Parameter overrides applied on top of the declared source, surfaced
    /// as an info tag on the application's root node.
    #[serde(default)]
    pub parameter_overrides: Vec<InfoItem>,
}

fn default_app_kind() -> String {
    "Application".to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(default = "default_app_kind")]
    pub kind: String,
    pub metadata: AppMetadata,
    #[serde(default)]
    pub spec: AppSpec,
    #[serde(default)]
    pub status: AppStatus,
}

impl Default for Application {
    fn default() -> Self {
        Self {
            kind: default_app_kind(),
            metadata: AppMetadata::default(),
            spec: AppSpec::default(),
            status: AppStatus::default(),
        }
    }
}

/// The live resource tree for one application: managed nodes plus resources
/// present in the cluster but no longer declared in desired state.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationTree {
    #[serde(default)]
    pub nodes: Vec<ResourceNode>,
    #[serde(default)]
    pub orphaned_nodes: Vec<ResourceNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_node_deserializes_from_wire_format() {
        let json = r#"{
            "group": "apps",
            "version": "v1",
            "kind": "Deployment",
            "namespace": "default",
            "name": "web",
            "uid": "u-1",
            "parentRefs": [],
            "info": [{"name": "Revision", "value": "Rev:3"}],
            "resourceVersion": "1001"
        }"#;
        let node: ResourceNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.kind, "Deployment");
        assert_eq!(node.resource_version, "1001");
        assert_eq!(node.info[0].value, "Rev:3");
        assert!(node.networking_info.is_none());
    }

    #[test]
    fn missing_optional_fields_default() {
        let node: ResourceNode =
            serde_json::from_str(r#"{"kind": "Pod", "name": "p"}"#).unwrap();
        assert!(node.group.is_empty());
        assert!(node.parent_refs.is_empty());
        assert!(node.images.is_empty());
        assert!(node.created_at.is_none());
    }

    #[test]
    fn networking_info_target_fields() {
        let yaml = r#"
targetLabels:
  app: web
ingress:
  - ip: 10.0.0.1
  - hostname: lb.example.com
"#;
        let info: ResourceNetworkingInfo = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(info.target_labels.get("app").unwrap(), "web");
        assert_eq!(info.ingress[0].endpoint(), "10.0.0.1");
        assert_eq!(info.ingress[1].endpoint(), "lb.example.com");
    }

    #[test]
    fn status_codes_round_trip() {
        let status: ResourceStatus = serde_yaml::from_str(
            r#"
kind: Deployment
name: web
status: OutOfSync
health:
  status: Degraded
  message: not enough replicas
"#,
        )
        .unwrap();
        assert_eq!(status.status, Some(SyncStatusCode::OutOfSync));
        assert_eq!(status.health.as_ref().unwrap().status, HealthStatusCode::Degraded);
        assert!(!status.hook);
    }
}

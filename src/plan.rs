use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::build::{BuildOptions, DEFAULT_POD_GROUP_THRESHOLD};
use crate::filter::NodeFilter;

/// ## Structure
/// This module contains the data structures for the plan file.
///
/// ```text
/// Plan
///   ├── meta: Option<Meta>
///   │   └── name: Option<String>
///   ├── import: ImportConfig
///   │   └── profiles: Vec<ImportProfile>
///   │       ├── filename: String
///   │       └── filetype: ImportFileType
///   │           ├── Application
///   │           ├── Tree
///   │           └── Statuses
///   ├── build: BuildConfig
///   │   ├── hierarchy: Hierarchy (Ownership | Network)
///   │   ├── show_orphaned_resources: bool
///   │   ├── show_compact_nodes: bool
///   │   ├── pod_group_threshold: usize
///   │   ├── expanded_nodes: Vec<String>
///   │   └── filter: Option<NodeFilter>
///   └── export: ExportProfile
///       └── profiles: Vec<ExportProfileItem>
///           ├── filename: String
///           └── exporter: ExportFileType
///               ├── JSON
///               ├── DOT
///               ├── Mermaid
///               └── Custom(CustomExportProfile)
/// ```

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Meta {
    pub name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Plan {
    pub meta: Option<Meta>,
    pub import: ImportConfig,
    #[serde(default)]
    pub build: BuildConfig,
    pub export: ExportProfile,
}

//
// Import configuration
//

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ImportConfig {
    pub profiles: Vec<ImportProfile>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum ImportFileType {
    Application,
    Tree,
    Statuses,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ImportProfile {
    pub filename: String,
    pub filetype: ImportFileType,
}

//
// Build configuration
//

#[derive(Serialize, Deserialize, Clone, Debug, Copy, PartialEq, Eq, Default)]
pub enum Hierarchy {
    #[default]
    Ownership,
    Network,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BuildConfig {
    #[serde(default)]
    pub hierarchy: Hierarchy,
    #[serde(default)]
    pub show_orphaned_resources: bool,
    #[serde(default = "default_true")]
    pub show_compact_nodes: bool,
    #[serde(default = "default_pod_group_threshold")]
    pub pod_group_threshold: usize,
    #[serde(default)]
    pub expanded_nodes: Vec<String>,
    #[serde(default)]
    pub filter: Option<NodeFilter>,
}

fn default_true() -> bool {
    true
}

fn default_pod_group_threshold() -> usize {
    DEFAULT_POD_GROUP_THRESHOLD
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            hierarchy: Hierarchy::Ownership,
            show_orphaned_resources: false,
            show_compact_nodes: true,
            pod_group_threshold: DEFAULT_POD_GROUP_THRESHOLD,
            expanded_nodes: Vec::new(),
            filter: None,
        }
    }
}

impl BuildConfig {
    pub fn options(&self) -> BuildOptions {
        BuildOptions {
            use_networking_hierarchy: self.hierarchy == Hierarchy::Network,
            show_orphaned_resources: self.show_orphaned_resources,
            show_compact_nodes: self.show_compact_nodes,
            pod_group_threshold: self.pod_group_threshold,
        }
    }
}

//
// Export configuration
//

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ExportProfile {
    pub profiles: Vec<ExportProfileItem>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ExportProfileItem {
    pub filename: String,
    pub exporter: ExportFileType,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CustomExportProfile {
    pub template: String,
    pub partials: Option<HashMap<String, String>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum ExportFileType {
    JSON,
    DOT,
    Mermaid,
    Custom(CustomExportProfile),
}

use serde::de::DeserializeOwned;
use std::path::Path;
use thiserror::Error;

use crate::model::{Application, ApplicationTree, ResourceStatus};

/// Errors raised while reading snapshot files from disk.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("unsupported snapshot extension '{0}', expected json, yaml or yml")]
    UnsupportedExtension(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path} as JSON: {source}")]
    ParseJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse {path} as YAML: {source}")]
    ParseYaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<T, SnapshotError> {
    let display = path.display().to_string();
    let extension = path
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("");
    let content = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: display.clone(),
        source,
    })?;
    match extension {
        "json" => serde_json::from_str(&content).map_err(|source| SnapshotError::ParseJson {
            path: display,
            source,
        }),
        "yaml" | "yml" => {
            serde_yaml::from_str(&content).map_err(|source| SnapshotError::ParseYaml {
                path: display,
                source,
            })
        }
        other => Err(SnapshotError::UnsupportedExtension(other.to_string())),
    }
}

pub fn load_application(path: &Path) -> Result<Application, SnapshotError> {
    load(path)
}

pub fn load_tree(path: &Path) -> Result<ApplicationTree, SnapshotError> {
    load(path)
}

pub fn load_statuses(path: &Path) -> Result<Vec<ResourceStatus>, SnapshotError> {
    load(path)
}

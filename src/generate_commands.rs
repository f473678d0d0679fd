use std::fs;
use std::path::Path;
use tracing::{error, info};

static SAMPLE_GUESTBOOK: &[(&str, &str)] = &[
    ("plan.yaml", include_str!("../sample/guestbook/plan.yaml")),
    ("app.json", include_str!("../sample/guestbook/app.json")),
    ("tree.json", include_str!("../sample/guestbook/tree.json")),
    (
        "statuses.json",
        include_str!("../sample/guestbook/statuses.json"),
    ),
];

pub fn generate_template(exporter: String) {
    info!("Generating exporter template: {}", exporter);
    match exporter.as_str() {
        "mermaid" => {
            println!("{}", crate::export::to_mermaid::get_template());
        }
        "dot" => {
            println!("{}", crate::export::to_dot::get_template());
        }
        _ => {
            error!("Unsupported exporter: {} - use mermaid, dot", exporter);
        }
    }
}

pub fn generate_sample(sample: String, dir: String) {
    info!("Generating sample project: {:?} in {:?}", sample, dir);
    let target_path = Path::new(&dir);
    if let Err(e) = fs::create_dir_all(target_path) {
        error!("Failed to create target directory: {:?}", e);
        return;
    }

    let files = match sample.to_lowercase().as_str() {
        "guestbook" => SAMPLE_GUESTBOOK,
        _ => {
            error!("Unsupported sample: {} - use guestbook", sample);
            return;
        }
    };

    for (name, content) in files {
        let target_file_path = target_path.join(name);
        if let Err(e) = fs::write(&target_file_path, content) {
            error!("Failed to write file {:?}: {:?}", target_file_path, e);
            return;
        }
    }

    info!("Sample project generated successfully at: {:?}", dir);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Plan;

    #[test]
    fn embedded_sample_plan_parses() {
        let (_, plan_yaml) = SAMPLE_GUESTBOOK
            .iter()
            .find(|(name, _)| *name == "plan.yaml")
            .unwrap();
        let plan: Plan = serde_yaml::from_str(plan_yaml).unwrap();
        assert_eq!(plan.import.profiles.len(), 3);
        assert_eq!(plan.export.profiles.len(), 3);
    }

    #[test]
    fn embedded_sample_snapshots_parse() {
        let content = |name: &str| {
            SAMPLE_GUESTBOOK
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, c)| *c)
                .unwrap()
        };
        let app: crate::model::Application = serde_json::from_str(content("app.json")).unwrap();
        assert_eq!(app.metadata.name, "guestbook");
        let tree: crate::model::ApplicationTree =
            serde_json::from_str(content("tree.json")).unwrap();
        assert_eq!(tree.nodes.len(), 5);
        assert_eq!(tree.orphaned_nodes.len(), 1);
        let statuses: Vec<crate::model::ResourceStatus> =
            serde_json::from_str(content("statuses.json")).unwrap();
        assert_eq!(statuses.len(), 2);
    }

    #[test]
    fn generate_sample_writes_all_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        generate_sample(
            "guestbook".to_string(),
            dir.path().to_string_lossy().into_owned(),
        );
        for (name, _) in SAMPLE_GUESTBOOK {
            assert!(dir.path().join(name).exists(), "missing {}", name);
        }
    }
}

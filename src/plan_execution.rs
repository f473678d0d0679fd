use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc::channel;
use tracing::{debug, error, info};

use anyhow::{anyhow, Result};

use crate::build::{build_resource_graph, BuildInput, BuildOutput, ExpansionMap};
use crate::model::{Application, ApplicationTree, ResourceStatus};
use crate::plan::{ExportFileType, ExportProfileItem, ImportFileType, Plan};
use crate::snapshot;

/// The three snapshot files a plan imports. The statuses file is optional;
/// when absent the per-resource statuses embedded in the application
/// document are used instead.
pub struct LoadedSnapshot {
    pub application: Application,
    pub tree: ApplicationTree,
    pub statuses: Vec<ResourceStatus>,
}

/// Loads the import profiles named by the plan, resolving filenames
/// relative to the plan file.
fn load_inputs(plan: &Plan, plan_file_path: &Path) -> Result<LoadedSnapshot> {
    let parent_dir = plan_file_path
        .parent()
        .ok_or_else(|| anyhow!("Plan file has no parent directory"))?;

    let mut application: Option<Application> = None;
    let mut tree: Option<ApplicationTree> = None;
    let mut statuses: Option<Vec<ResourceStatus>> = None;

    for profile in &plan.import.profiles {
        let import_file_path = parent_dir.join(&profile.filename);
        info!(
            "Importing file: {} as {:?}",
            import_file_path.display(),
            profile.filetype
        );
        match profile.filetype {
            ImportFileType::Application => {
                application = Some(snapshot::load_application(&import_file_path)?);
            }
            ImportFileType::Tree => {
                tree = Some(snapshot::load_tree(&import_file_path)?);
            }
            ImportFileType::Statuses => {
                statuses = Some(snapshot::load_statuses(&import_file_path)?);
            }
        }
    }

    let application =
        application.ok_or_else(|| anyhow!("Plan imports no Application profile"))?;
    let tree = tree.ok_or_else(|| anyhow!("Plan imports no Tree profile"))?;
    let statuses = statuses.unwrap_or_else(|| application.status.resources.clone());

    info!(
        "Snapshot loaded with {} managed nodes, {} orphaned nodes and {} statuses",
        tree.nodes.len(),
        tree.orphaned_nodes.len(),
        statuses.len()
    );

    Ok(LoadedSnapshot {
        application,
        tree,
        statuses,
    })
}

/// Builds the resource graph described by the plan's build section.
fn build_from_plan(plan: &Plan, snapshot: &LoadedSnapshot) -> Result<BuildOutput> {
    let expansion: ExpansionMap = plan.build.expanded_nodes.iter().cloned().collect();
    let compiled = match &plan.build.filter {
        Some(filter) if !filter.is_empty() => Some(filter.compile()?),
        _ => None,
    };
    let predicate = compiled.as_ref().map(|c| {
        Box::new(move |node: &crate::node::TreeNode| c.matches(node))
            as Box<dyn Fn(&crate::node::TreeNode) -> bool + '_>
    });

    let input = BuildInput {
        app: &snapshot.application,
        tree: &snapshot.tree,
        statuses: &snapshot.statuses,
        options: plan.build.options(),
        node_filter: predicate.as_deref(),
        expansion: &expansion,
    };
    let output = build_resource_graph(&input);
    info!(
        "Graph built with {} nodes, {} edges ({} filtered out)",
        output.nodes.len(),
        output.edges.len(),
        output.filtered_count
    );
    Ok(output)
}

/// Renders the built graph to the specified file using the appropriate
/// exporter. Output filenames resolve relative to the plan file, same as
/// imports.
fn export_output(output: &BuildOutput, profile: &ExportProfileItem, parent_dir: &Path) -> Result<()> {
    let target = parent_dir.join(&profile.filename);
    let target = target.to_string_lossy();
    info!(
        "Starting export to file: {} using exporter {:?}",
        target, profile.exporter
    );

    let result = match &profile.exporter {
        ExportFileType::JSON => crate::export::to_json::render(output),
        ExportFileType::DOT => crate::export::to_dot::render(output),
        ExportFileType::Mermaid => crate::export::to_mermaid::render(output),
        ExportFileType::Custom(template_config) => {
            crate::export::to_custom::render(output, template_config)
        }
    };

    match result {
        Ok(rendered) => {
            if let Err(e) = crate::common::write_string_to_file(&target, &rendered) {
                error!("Failed to write to file {}: {}", target, e);
            }
        }
        Err(e) => {
            error!("Failed to export file {}: {}", target, e);
        }
    }

    Ok(())
}

/// Executes a single plan: load, build, export.
pub fn run_plan(plan: &Plan, plan_file_path: &Path) -> Result<()> {
    let snapshot = load_inputs(plan, plan_file_path)?;
    let output = build_from_plan(plan, &snapshot)?;

    let parent_dir = plan_file_path
        .parent()
        .ok_or_else(|| anyhow!("Plan file has no parent directory"))?;
    for profile in &plan.export.profiles {
        if let Err(e) = export_output(&output, profile, parent_dir) {
            error!("Failed to export graph: {}", e);
        }
    }

    Ok(())
}

/// Main function to execute a plan, with optional file watching.
pub fn execute_plan(plan: String, watch: bool) -> Result<()> {
    info!("Executing plan {}", plan);

    let plan_file_path = std::path::Path::new(&plan);
    let path_content = std::fs::read_to_string(plan_file_path)?;
    let plan: Plan = serde_yaml::from_str(&path_content)?;

    debug!("Executing plan: {:?}", plan);
    run_plan(&plan, plan_file_path)?;

    if watch {
        watch_for_changes(plan, plan_file_path)?;
    }

    Ok(())
}

/// Sets up file watching for input files to re-run the plan on changes.
fn watch_for_changes(plan: Plan, plan_file_path: &Path) -> Result<()> {
    info!("Watching for changes");
    let files: Vec<String> = plan
        .import
        .profiles
        .iter()
        .map(|profile| profile.filename.clone())
        .collect();

    let (tx, rx) = channel();
    let mut watcher = RecommendedWatcher::new(tx, Config::default())?;
    for file in &files {
        let parent_dir = plan_file_path
            .parent()
            .ok_or_else(|| anyhow!("Plan file has no parent directory"))?;
        let path = parent_dir.join(file);
        watcher.watch(&path, RecursiveMode::NonRecursive)?;
    }

    loop {
        match rx.recv() {
            Ok(event) => {
                if let Ok(event) = event {
                    if let EventKind::Modify(_) = event.kind {
                        debug!("File modified {:?}", event.paths);
                        info!("Change detected, re-executing plan");
                        run_plan(&plan, plan_file_path)?;
                    }
                }
            }
            Err(e) => error!("Watch error: {:?}", e),
        }
    }
}

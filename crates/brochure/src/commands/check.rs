//! Validate every partial in the project.

use std::path::Path;

use anyhow::Result;
use brochure_partials::{DiscoveryReport, PartialRegistry};

use super::Workspace;

/// Run the check command.
pub async fn run(config_path: &Path) -> Result<()> {
    let workspace = Workspace::load(config_path).await?;

    let problems = collect_problems(&workspace.registry, &workspace.report);
    for problem in &problems {
        tracing::error!("{}", problem);
    }

    if !problems.is_empty() {
        anyhow::bail!(
            "{} problem(s) found in {}",
            problems.len(),
            workspace.config.partials.dir.display()
        );
    }

    tracing::info!("All {} partials are valid", workspace.registry.len());
    Ok(())
}

/// Load failures followed by dependency errors, one line each.
fn collect_problems(registry: &PartialRegistry, report: &DiscoveryReport) -> Vec<String> {
    let mut problems: Vec<String> = report
        .failures
        .iter()
        .map(|failure| format!("{}: {}", failure.path.display(), failure.error))
        .collect();

    let mut names = registry.partial_names();
    names.sort();
    for name in names {
        if let Err(e) = registry.resolve_dependencies(&name) {
            problems.push(format!("{name}: {e}"));
        }
    }

    problems
}

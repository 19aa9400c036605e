//! Render a single partial.

use std::path::Path;

use anyhow::{Context, Result};
use brochure_partials::PartialRegistry;
use serde_json::Value;

use super::Workspace;

/// Run the render command.
pub async fn run(config_path: &Path, name: &str, props: Option<&str>) -> Result<()> {
    let props: Value = match props {
        Some(raw) => serde_json::from_str(raw).context("Failed to parse --props as JSON")?,
        None => Value::Object(Default::default()),
    };

    let workspace = Workspace::load(config_path).await?;
    let output = render_with_styles(&workspace.registry, name, &props)?;

    println!("{output}");
    Ok(())
}

/// Render `name` preceded by a style block for it and its dependencies.
fn render_with_styles(registry: &PartialRegistry, name: &str, props: &Value) -> Result<String> {
    let order = registry.resolve_dependencies(name)?;
    tracing::debug!("Load order for {}: {}", name, order.join(", "));

    let styles = registry.collect_styles(name)?;
    let html = registry.render(name, props)?;

    if styles.is_empty() {
        Ok(html)
    } else {
        Ok(format!("<style>\n{styles}\n</style>\n{html}"))
    }
}

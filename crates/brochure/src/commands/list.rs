//! List discovered partials.

use std::path::Path;

use anyhow::Result;
use brochure_partials::PartialRegistry;

use super::Workspace;

/// Run the list command.
pub async fn run(config_path: &Path) -> Result<()> {
    let workspace = Workspace::load(config_path).await?;

    if workspace.registry.is_empty() {
        tracing::warn!(
            "No partials found in {}",
            workspace.config.partials.dir.display()
        );
        return Ok(());
    }

    for line in listing(&workspace.registry) {
        println!("{line}");
    }

    Ok(())
}

/// One line per partial, sorted by name, followed by an indented line per prop.
fn listing(registry: &PartialRegistry) -> Vec<String> {
    let mut partials: Vec<_> = registry.get_all().into_iter().collect();
    partials.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut lines = Vec::new();
    for (name, definition) in &partials {
        let metadata = definition.metadata();
        let mut line = format!(
            "{:<24} {:<12} {}",
            name, metadata.category, metadata.description
        );
        if !definition.dependencies().is_empty() {
            line.push_str(&format!(" (needs {})", definition.dependencies().join(", ")));
        }
        lines.push(line);

        for (prop, field) in definition.schema().fields() {
            let marker = if field.is_optional() { "?" } else { "" };
            let mut line = format!("    {prop}{marker}: {}", field.kind());
            if let Some(description) = field.description() {
                line.push_str(&format!("  {description}"));
            }
            lines.push(line);
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use brochure_partials::{CandidateMetadata, FieldSchema, PartialCandidate, PropSchema, Template};
    use pretty_assertions::assert_eq;

    fn candidate(category: &str, description: &str, deps: &[&str]) -> PartialCandidate {
        candidate_with_schema(PropSchema::new(), category, description, deps)
    }

    fn candidate_with_schema(
        schema: PropSchema,
        category: &str,
        description: &str,
        deps: &[&str],
    ) -> PartialCandidate {
        PartialCandidate::new(
            schema,
            Template::from_fn(|_| String::new()),
            "",
            CandidateMetadata {
                description: Some(description.to_string()),
                category: Some(category.to_string()),
                keywords: Some(vec!["test".to_string()]),
                usage_examples: Some(vec!["{}".to_string()]),
            },
        )
        .with_dependencies(deps.iter().copied())
    }

    #[test]
    fn lists_partials_by_name_with_dependencies() {
        let registry = PartialRegistry::new();
        registry
            .register("pricing-card", candidate("content", "Plan card", &["button"]))
            .unwrap();
        registry
            .register("button", candidate("interactive", "CTA button", &[]))
            .unwrap();

        let lines = listing(&registry);

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("button "));
        assert!(lines[0].contains("interactive"));
        assert!(lines[1].contains("Plan card (needs button)"));
    }

    #[test]
    fn lists_props_under_each_partial() {
        let schema = PropSchema::new()
            .field("title", FieldSchema::string().describe("Main headline"))
            .field("columns", FieldSchema::integer().optional());
        let registry = PartialRegistry::new();
        registry
            .register("hero", candidate_with_schema(schema, "layout", "Page hero", &[]))
            .unwrap();

        let lines = listing(&registry);

        assert_eq!(
            lines[1..].to_vec(),
            vec![
                "    title: string  Main headline".to_string(),
                "    columns?: integer".to_string(),
            ]
        );
    }
}

//! Scaffold a brochure project.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Run the init command.
pub async fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing brochure...");

    let created = scaffold(Path::new("."), config_path, yes)?;
    for path in &created {
        tracing::info!("Created {}", path.display());
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'brochure check' to validate your partials.");

    Ok(())
}

/// Write the config file and example partials under `root`.
///
/// Existing files are left alone unless `overwrite` is set. Returns the
/// files that were written.
fn scaffold(root: &Path, config_path: &Path, overwrite: bool) -> Result<Vec<PathBuf>> {
    let partials_dir = root.join("partials");
    if partials_dir.exists() && !overwrite {
        tracing::warn!("partials/ directory already exists. Use --yes to overwrite.");
        return Ok(Vec::new());
    }
    fs::create_dir_all(&partials_dir).context("Failed to create partials directory")?;

    let files = [
        (root.join(config_path), DEFAULT_CONFIG),
        (partials_dir.join("button.partial.yaml"), DEFAULT_BUTTON),
        (partials_dir.join("hero.partial.yaml"), DEFAULT_HERO),
    ];

    let mut created = Vec::new();
    for (path, contents) in files {
        if path.exists() && !overwrite {
            continue;
        }
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        created.push(path);
    }

    Ok(created)
}

const DEFAULT_CONFIG: &str = r#"# Brochure Configuration

[partials]
# Directory scanned for *.partial.yaml files
dir = "partials"

[cache]
# How long validated prop schemas stay cached
ttl_ms = 5000
"#;

const DEFAULT_BUTTON: &str = r#"schema:
  label:
    type: string
    min: 1
  href:
    type: url
  variant:
    type: enum
    values: [primary, secondary]
    default: primary

template: |
  <a class="button button--{{ variant }}" href="{{ href }}">{{ label }}</a>

styles: |
  .button { display: inline-block; padding: 0.75rem 1.5rem; border-radius: 0.5rem; }
  .button--primary { background: #2563eb; color: #fff; }
  .button--secondary { background: #e5e7eb; color: #111827; }

metadata:
  description: Call-to-action link styled as a button
  category: interactive
  keywords: [button, cta, link]
  usage_examples:
    - '{"label": "Get started", "href": "https://example.com/signup"}'
"#;

const DEFAULT_HERO: &str = r#"schema:
  headline:
    type: string
    min: 1
    max: 80
  subheadline:
    type: string
    optional: true
  cta:
    type: object
    fields:
      label:
        type: string
      href:
        type: url

template: |
  <section class="hero">
    <h1>{{ headline }}</h1>
    {% if subheadline %}<p>{{ subheadline }}</p>{% endif %}
    <a class="button button--primary" href="{{ cta.href }}">{{ cta.label }}</a>
  </section>

styles: |
  .hero { padding: 6rem 1.5rem; text-align: center; }
  .hero h1 { font-size: 3rem; margin-bottom: 1rem; }

dependencies: [button]

metadata:
  description: Full-width banner with headline and call to action
  category: layout
  keywords: [hero, banner, header]
  usage_examples:
    - '{"headline": "Ship faster", "cta": {"label": "Start", "href": "https://example.com"}}'
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use brochure_partials::PartialRegistry;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn writes_config_and_partials() {
        let temp = tempdir().unwrap();

        let created = scaffold(temp.path(), Path::new("brochure.toml"), false).unwrap();

        assert_eq!(created.len(), 3);
        assert!(temp.path().join("brochure.toml").exists());
        assert!(temp.path().join("partials/hero.partial.yaml").exists());
    }

    #[test]
    fn leaves_existing_project_alone_without_yes() {
        let temp = tempdir().unwrap();
        scaffold(temp.path(), Path::new("brochure.toml"), false).unwrap();
        fs::write(temp.path().join("brochure.toml"), "# mine").unwrap();

        let created = scaffold(temp.path(), Path::new("brochure.toml"), false).unwrap();

        assert!(created.is_empty());
        assert_eq!(
            fs::read_to_string(temp.path().join("brochure.toml")).unwrap(),
            "# mine"
        );
    }

    #[tokio::test]
    async fn scaffolded_partials_load_and_render() {
        let temp = tempdir().unwrap();
        scaffold(temp.path(), Path::new("brochure.toml"), false).unwrap();

        let registry = PartialRegistry::new();
        let report = registry.discover_partials(temp.path().join("partials")).await;

        assert!(report.is_clean(), "{:?}", report.failures);
        assert_eq!(
            registry.resolve_dependencies("hero").unwrap(),
            vec!["button", "hero"]
        );

        let html = registry
            .render(
                "hero",
                &json!({
                    "headline": "Ship faster",
                    "cta": { "label": "Start", "href": "https://example.com" }
                }),
            )
            .unwrap();
        assert!(html.contains("<h1>Ship faster</h1>"));
        assert!(!html.contains("<p>"));
    }
}

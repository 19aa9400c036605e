//! Shared test helpers.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;

use crate::partial::{CandidateMetadata, PartialCandidate, Template};
use crate::schema::{FieldSchema, PropSchema};

pub(crate) fn sample_metadata() -> CandidateMetadata {
    CandidateMetadata {
        description: Some("Full-width hero banner".to_string()),
        category: Some("layout".to_string()),
        keywords: Some(vec!["hero".to_string(), "banner".to_string()]),
        usage_examples: Some(vec!["{{> hero title=\"Welcome\" }}".to_string()]),
    }
}

pub(crate) fn sample_candidate(dependencies: &[&str]) -> PartialCandidate {
    let schema = PropSchema::new()
        .field("title", FieldSchema::string().min(1.0))
        .field("tone", FieldSchema::enumeration(["light", "dark"]).with_default(json!("light")));
    let template = Template::from_fn(|props| {
        format!("<section>{}</section>", props["title"].as_str().unwrap_or_default())
    });

    PartialCandidate::new(schema, template, ".hero { padding: 4rem; }", sample_metadata())
        .with_dependencies(dependencies.iter().copied())
}

/// YAML for a well-formed partial file.
pub(crate) fn partial_yaml(styles: &str, dependencies: &[&str]) -> String {
    let dependencies = dependencies
        .iter()
        .map(|d| format!("\"{d}\""))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"schema:
  title:
    type: string
    min: 1
template: "<section>{{{{ title }}}}</section>"
styles: "{styles}"
dependencies: [{dependencies}]
metadata:
  description: Test partial
  category: content
  keywords: [test]
  usage_examples: ["{{{{> sample }}}}"]
"#
    )
}

pub(crate) fn write_partial(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(format!("{name}.partial.yaml"));
    fs::create_dir_all(dir).unwrap();
    fs::write(&path, contents).unwrap();
    path
}

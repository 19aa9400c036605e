//! Structural validation of partial definitions.
//!
//! Validation runs at the registry boundary: nothing enters the store unless
//! it passes [`validate_structure`]. File-loaded definitions additionally go
//! through [`candidate_from_document`], which checks field types on the raw
//! document before the candidate is assembled.

use std::sync::Arc;

use serde_yaml::{Mapping, Value};

use crate::error::RegistryError;
use crate::partial::{
    CandidateMetadata, Category, PartialCandidate, PartialDefinition, PartialMetadata, Template,
};
use crate::schema::PropSchema;

/// Top-level keys of a partial definition document.
pub(crate) const DEFINITION_KEYS: [&str; 5] =
    ["schema", "template", "styles", "dependencies", "metadata"];

/// Turn a candidate into a definition, or report what is wrong with it.
///
/// Missing top-level fields are reported together, as are missing or empty
/// metadata fields.
pub fn validate_structure(
    name: &str,
    candidate: PartialCandidate,
) -> Result<PartialDefinition, RegistryError> {
    let PartialCandidate {
        schema,
        template,
        styles,
        dependencies,
        metadata,
    } = candidate;

    let mut missing = Vec::new();
    if schema.is_none() {
        missing.push("schema");
    }
    if template.is_none() {
        missing.push("template");
    }
    if styles.is_none() {
        missing.push("styles");
    }
    if metadata.is_none() {
        missing.push("metadata");
    }

    let (Some(schema), Some(template), Some(styles), Some(metadata)) =
        (schema, template, styles, metadata)
    else {
        return Err(RegistryError::invalid(
            name,
            format!("missing required field(s): {}", missing.join(", ")),
        ));
    };

    if let Some(position) = dependencies.iter().position(|d| d.trim().is_empty()) {
        return Err(RegistryError::invalid(
            name,
            format!("dependencies[{position}] must be a non-empty partial name"),
        ));
    }

    let metadata =
        validate_metadata(metadata).map_err(|reason| RegistryError::invalid(name, reason))?;

    Ok(PartialDefinition {
        schema,
        template,
        styles,
        dependencies,
        metadata,
    })
}

fn validate_metadata(metadata: CandidateMetadata) -> Result<PartialMetadata, String> {
    let CandidateMetadata {
        description,
        category,
        keywords,
        usage_examples,
    } = metadata;

    let description = description.filter(|d| !d.trim().is_empty());
    let keywords = keywords.filter(|k| !k.is_empty());
    let usage_examples = usage_examples.filter(|u| !u.is_empty());

    let mut missing = Vec::new();
    if description.is_none() {
        missing.push("description");
    }
    if category.is_none() {
        missing.push("category");
    }
    if keywords.is_none() {
        missing.push("keywords");
    }
    if usage_examples.is_none() {
        missing.push("usage_examples (usageExamples)");
    }

    let mut problems = Vec::new();
    if !missing.is_empty() {
        problems.push(format!(
            "metadata is missing or has empty field(s): {}",
            missing.join(", ")
        ));
    }

    let parsed_category = match category.as_deref() {
        Some(raw) => match raw.parse::<Category>() {
            Ok(category) => Some(category),
            Err(_) => {
                let allowed: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
                problems.push(format!(
                    "metadata.category must be one of {} (found \"{raw}\")",
                    allowed.join(", ")
                ));
                None
            }
        },
        None => None,
    };

    match (description, parsed_category, keywords, usage_examples) {
        (Some(description), Some(category), Some(keywords), Some(usage_examples))
            if problems.is_empty() =>
        {
            Ok(PartialMetadata {
                description,
                category,
                keywords,
                usage_examples,
            })
        }
        _ => Err(problems.join("; ")),
    }
}

/// Build a candidate from a parsed definition document.
///
/// Absent fields are left empty for [`validate_structure`] to report; fields
/// that are present with the wrong type are rejected here.
pub fn candidate_from_document(
    name: &str,
    document: &Value,
) -> Result<PartialCandidate, RegistryError> {
    let Some(mapping) = document.as_mapping() else {
        return Err(RegistryError::invalid(
            name,
            format!("definition must be an object, found {}", describe(document)),
        ));
    };

    let mut candidate = PartialCandidate::default();

    if let Some(schema) = mapping.get("schema") {
        if !schema.is_mapping() {
            return Err(RegistryError::invalid(
                name,
                format!(
                    "field \"schema\" must be a schema definition, found {}",
                    describe(schema)
                ),
            ));
        }
        let schema: PropSchema = serde_yaml::from_value(schema.clone()).map_err(|e| {
            RegistryError::invalid(name, format!("field \"schema\" is not a valid schema: {e}"))
        })?;
        candidate.schema = Some(Arc::new(schema));
    }

    if let Some(template) = mapping.get("template") {
        let Some(source) = template.as_str() else {
            return Err(RegistryError::invalid(
                name,
                format!(
                    "field \"template\" must be a template string, found {}",
                    describe(template)
                ),
            ));
        };
        let template = Template::from_source(name, source).map_err(|e| {
            RegistryError::invalid(name, format!("field \"template\" does not compile: {e}"))
        })?;
        candidate.template = Some(template);
    }

    candidate.styles =
        string_field(mapping, "styles").map_err(|r| RegistryError::invalid(name, r))?;

    if let Some(dependencies) =
        string_list(mapping, "dependencies").map_err(|r| RegistryError::invalid(name, r))?
    {
        candidate.dependencies = dependencies;
    }

    if let Some(metadata) = mapping.get("metadata") {
        let Some(metadata) = metadata.as_mapping() else {
            return Err(RegistryError::invalid(
                name,
                format!("field \"metadata\" must be an object, found {}", describe(metadata)),
            ));
        };
        let metadata =
            metadata_from_mapping(metadata).map_err(|r| RegistryError::invalid(name, r))?;
        candidate.metadata = Some(metadata);
    }

    Ok(candidate)
}

fn metadata_from_mapping(mapping: &Mapping) -> Result<CandidateMetadata, String> {
    let usage_examples = match string_list(mapping, "usage_examples")? {
        Some(examples) => Some(examples),
        None => string_list(mapping, "usageExamples")?,
    };

    Ok(CandidateMetadata {
        description: string_field(mapping, "description")?,
        category: string_field(mapping, "category")?,
        keywords: string_list(mapping, "keywords")?,
        usage_examples,
    })
}

fn string_field(mapping: &Mapping, key: &str) -> Result<Option<String>, String> {
    match mapping.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(format!(
            "field \"{key}\" must be a string, found {}",
            describe(other)
        )),
    }
}

fn string_list(mapping: &Mapping, key: &str) -> Result<Option<Vec<String>>, String> {
    match mapping.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Sequence(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    format!("field \"{key}\" must contain only strings, found {}", describe(item))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(other) => Err(format!(
            "field \"{key}\" must be a list of strings, found {}",
            describe(other)
        )),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "an object",
        Value::Tagged(_) => "a tagged value",
    }
}

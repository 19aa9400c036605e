//! Error types for registry operations.

use std::path::PathBuf;

use crate::schema::SchemaIssue;

/// Errors that can occur with the partial registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// `register` was called with a name that is already present.
    #[error("Partial \"{0}\" is already registered")]
    DuplicateName(String),

    /// A candidate definition failed structural validation.
    #[error("Invalid partial structure for \"{name}\": {reason}")]
    InvalidStructure { name: String, reason: String },

    #[error("Partial \"{0}\" not found")]
    NotFound(String),

    /// The dependency graph reachable from the queried root has a cycle.
    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    #[error("Missing dependency \"{dependency}\" required by \"{requester}\"")]
    MissingDependency {
        dependency: String,
        requester: String,
    },

    /// Props did not satisfy the partial's schema.
    #[error("Validation failed for partial \"{name}\": {}", join_issues(.issues))]
    PropValidation {
        name: String,
        issues: Vec<SchemaIssue>,
    },

    #[error("Failed to load partial file {}: {message}", .path.display())]
    Load { path: PathBuf, message: String },

    /// Two partial files in one directory tree derive the same name.
    #[error("Partial \"{name}\" is already defined by {}", .existing.display())]
    NameConflict { name: String, existing: PathBuf },

    #[error("Failed to render partial \"{name}\": {message}")]
    Render { name: String, message: String },

    #[error("File watch error: {0}")]
    Watch(String),
}

impl RegistryError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidStructure {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

fn join_issues(issues: &[SchemaIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

//! Loading partial definitions from files.
//!
//! Partial files are named `<name>.partial.yaml` and may live anywhere under a
//! partials root. The registry key is the file name with the suffix removed.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use walkdir::WalkDir;

use crate::error::RegistryError;
use crate::partial::{PartialCandidate, PartialDefinition};
use crate::validate::{candidate_from_document, validate_structure, DEFINITION_KEYS};

/// Suffix that marks a partial definition file.
pub const PARTIAL_SUFFIX: &str = ".partial.yaml";

/// Maps a partial file to an unvalidated candidate.
///
/// Loaders run on blocking threads and must not touch registry state.
pub trait PartialLoader: Send + Sync {
    /// Load the definition stored at `path`, registered as `name`.
    fn load(&self, path: &Path, name: &str) -> Result<PartialCandidate, RegistryError>;
}

/// Loads partials from YAML documents.
///
/// The document itself is the definition when it has any definition key at
/// the top level. Otherwise a top-level key equal to the partial's name is
/// used, so one file can nest its definition under its own name:
///
/// ```yaml
/// hero:
///   schema: { title: { type: string } }
///   template: "<h1>{{ title }}</h1>"
///   ...
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlLoader;

impl PartialLoader for YamlLoader {
    fn load(&self, path: &Path, name: &str) -> Result<PartialCandidate, RegistryError> {
        let source = fs::read_to_string(path).map_err(|e| RegistryError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let document: Value = serde_yaml::from_str(&source).map_err(|e| RegistryError::Load {
            path: path.to_path_buf(),
            message: format!("invalid YAML: {e}"),
        })?;

        candidate_from_document(name, select_export(&document, name))
    }
}

fn select_export<'a>(document: &'a Value, name: &str) -> &'a Value {
    if let Some(mapping) = document.as_mapping() {
        let is_definition = DEFINITION_KEYS.iter().any(|key| mapping.contains_key(*key));
        if !is_definition {
            if let Some(named) = mapping.get(name) {
                return named;
            }
        }
    }
    document
}

/// Derive the registry name from a partial file path.
///
/// Takes the last path segment and strips [`PARTIAL_SUFFIX`]. Works on the
/// path text alone; the file does not need to exist.
pub fn extract_partial_name(path: impl AsRef<Path>) -> String {
    let path = path.as_ref().to_string_lossy();
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or_default();

    match file_name.strip_suffix(PARTIAL_SUFFIX) {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => file_name.to_string(),
    }
}

/// Whether `path` names a partial definition file.
pub fn is_partial_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_suffix(PARTIAL_SUFFIX))
        .is_some_and(|stem| !stem.is_empty())
}

/// Recursively collect partial files under `dir`, sorted by path.
pub(crate) fn find_partial_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_partial_file(e.path()))
        .map(|e| e.into_path())
        .collect();

    files.sort();
    files
}

/// Load and structurally validate one file. Blocking.
pub(crate) fn load_definition(
    loader: &dyn PartialLoader,
    path: &Path,
) -> Result<PartialDefinition, RegistryError> {
    let name = extract_partial_name(path);
    let candidate = loader.load(path, &name)?;
    validate_structure(&name, candidate)
}

//! Filesystem discovery of partial files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::error::RegistryError;
use crate::events::RegistryEvent;
use crate::loader::{extract_partial_name, find_partial_files, load_definition};
use crate::registry::PartialRegistry;

/// Outcome of a discovery run.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Names stored by this run, in the order their loads finished
    pub discovered: Vec<String>,

    /// Files that were skipped
    pub failures: Vec<DiscoveryFailure>,
}

/// A partial file that could not be loaded.
#[derive(Debug)]
pub struct DiscoveryFailure {
    pub path: PathBuf,
    pub error: RegistryError,
}

impl DiscoveryReport {
    /// Number of partials discovered.
    pub fn count(&self) -> usize {
        self.discovered.len()
    }

    /// Check if every partial file loaded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl PartialRegistry {
    /// Scan `directory` recursively and store every valid partial file.
    ///
    /// When several files derive the same name, the one nearest `directory`
    /// is loaded and the others are reported as [`RegistryError::NameConflict`].
    ///
    /// Files load concurrently on the blocking pool and are stored as each
    /// load finishes. A file that fails to load or validate is logged and
    /// recorded in the report; it never stops the rest of the scan.
    ///
    /// Discovered partials overwrite existing entries with the same name,
    /// including ones added through [`register`](Self::register).
    pub async fn discover_partials(&self, directory: impl AsRef<Path>) -> DiscoveryReport {
        let directory = directory.as_ref().to_path_buf();
        let mut report = DiscoveryReport::default();

        match tokio::fs::metadata(&directory).await {
            Ok(meta) if meta.is_dir() => {}
            _ => {
                tracing::warn!("Partials directory not found: {}", directory.display());
                return report;
            }
        }

        let scan_dir = directory.clone();
        let files = match tokio::task::spawn_blocking(move || find_partial_files(&scan_dir)).await {
            Ok(files) => files,
            Err(e) => {
                tracing::error!("Failed to scan {}: {}", directory.display(), e);
                return report;
            }
        };

        let mut loads = JoinSet::new();
        let mut claimed: HashMap<String, PathBuf> = HashMap::new();
        for path in shallowest_first(files) {
            let name = extract_partial_name(&path);
            if let Some(existing) = claimed.get(&name) {
                tracing::warn!(
                    "Skipping {}: partial {} is already defined by {}",
                    path.display(),
                    name,
                    existing.display()
                );
                report.failures.push(DiscoveryFailure {
                    path,
                    error: RegistryError::NameConflict {
                        name,
                        existing: existing.clone(),
                    },
                });
                continue;
            }
            claimed.insert(name, path.clone());

            let loader = Arc::clone(&self.inner.loader);
            loads.spawn_blocking(move || {
                let result = load_definition(loader.as_ref(), &path);
                (path, result)
            });
        }

        while let Some(joined) = loads.join_next().await {
            let (path, result) = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Partial load task failed: {}", e);
                    continue;
                }
            };

            match result {
                Ok(definition) => {
                    let name = extract_partial_name(&path);
                    let definition = self.store(&name, definition);
                    tracing::debug!("Discovered partial {} at {}", name, path.display());
                    self.emit(RegistryEvent::Discovered {
                        name: name.clone(),
                        definition,
                    });
                    report.discovered.push(name);
                }
                Err(error) => {
                    tracing::warn!("Skipping {}: {}", path.display(), error);
                    report.failures.push(DiscoveryFailure { path, error });
                }
            }
        }

        tracing::info!(
            "Discovered {} partials in {}",
            report.count(),
            directory.display()
        );

        report
    }
}

/// Order files so that, among files deriving the same name, the one nearest
/// the root comes first. Ties break on path.
fn shallowest_first(mut files: Vec<PathBuf>) -> Vec<PathBuf> {
    files.sort_by(|a, b| {
        a.components()
            .count()
            .cmp(&b.components().count())
            .then_with(|| a.cmp(b))
    });
    files
}

//! Dependency resolution over registered partials.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::error::RegistryError;
use crate::partial::PartialDefinition;

/// Compute the load order for `root`: every dependency before its dependents,
/// `root` last.
///
/// Dependencies are visited in the order each definition lists them, so the
/// result is stable for a given registry state.
pub(crate) fn resolve(
    root: &str,
    partials: &IndexMap<String, Arc<PartialDefinition>>,
) -> Result<Vec<String>, RegistryError> {
    let mut resolution = Resolution::default();
    resolution.visit(root, None, partials)?;
    Ok(resolution.resolved)
}

#[derive(Default)]
struct Resolution {
    /// Finalized order
    resolved: Vec<String>,
    /// Current DFS path, in visiting order
    visiting: IndexSet<String>,
    visited: HashSet<String>,
}

impl Resolution {
    fn visit(
        &mut self,
        name: &str,
        requester: Option<&str>,
        partials: &IndexMap<String, Arc<PartialDefinition>>,
    ) -> Result<(), RegistryError> {
        if self.visiting.contains(name) {
            let mut cycle: Vec<&str> = self.visiting.iter().map(String::as_str).collect();
            cycle.push(name);
            return Err(RegistryError::CircularDependency {
                cycle: cycle.join(" -> "),
            });
        }

        if self.visited.contains(name) {
            return Ok(());
        }

        let definition = partials.get(name).ok_or_else(|| match requester {
            Some(requester) => RegistryError::MissingDependency {
                dependency: name.to_string(),
                requester: requester.to_string(),
            },
            None => RegistryError::NotFound(name.to_string()),
        })?;

        self.visiting.insert(name.to_string());
        for dependency in definition.dependencies() {
            self.visit(dependency, Some(name), partials)?;
        }
        self.visiting.pop();

        self.visited.insert(name.to_string());
        self.resolved.push(name.to_string());
        Ok(())
    }
}

//! Partial registry.
//!
//! The registry is the single source of truth for which partials exist. It
//! validates definitions before they enter the store, resolves dependency
//! order, validates props against each partial's schema, and broadcasts a
//! [`RegistryEvent`] for every change.
//!
//! [`PartialRegistry`] is a cheap handle: clones share the same store.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::cache::{CacheStats, ValidationCache, DEFAULT_CACHE_TTL};
use crate::error::RegistryError;
use crate::events::{EventHub, RegistryEvent, DEFAULT_EVENT_CAPACITY};
use crate::hot_reload::HotReloadSession;
use crate::loader::{PartialLoader, YamlLoader};
use crate::partial::{PartialCandidate, PartialDefinition};
use crate::resolver;
use crate::validate::validate_structure;

/// Registry tuning.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// How long a prop-validation cache entry stays fresh
    pub cache_ttl: Duration,

    /// Events buffered per subscriber before slow subscribers start lagging
    pub event_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// A registry of partial definitions.
#[derive(Clone)]
pub struct PartialRegistry {
    pub(crate) inner: Arc<RegistryInner>,
}

pub(crate) struct RegistryInner {
    /// Registered partials in insertion order
    partials: RwLock<IndexMap<String, Arc<PartialDefinition>>>,
    pub(crate) cache: ValidationCache,
    events: EventHub,
    pub(crate) loader: Arc<dyn PartialLoader>,
    pub(crate) hot_reload: Mutex<Option<HotReloadSession>>,
}

impl PartialRegistry {
    /// Create an empty registry that loads YAML partial files.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty YAML-loading registry with custom tuning.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self::with_loader(config, YamlLoader)
    }

    /// Create a registry that loads partial files with a custom loader.
    pub fn with_loader(config: RegistryConfig, loader: impl PartialLoader + 'static) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                partials: RwLock::new(IndexMap::new()),
                cache: ValidationCache::new(config.cache_ttl),
                events: EventHub::new(config.event_capacity),
                loader: Arc::new(loader),
                hot_reload: Mutex::new(None),
            }),
        }
    }

    /// Register a partial under a new name.
    ///
    /// Fails if the name is taken or the candidate is structurally invalid;
    /// in both cases the registry is unchanged.
    pub fn register(
        &self,
        name: impl Into<String>,
        candidate: PartialCandidate,
    ) -> Result<Arc<PartialDefinition>, RegistryError> {
        let name = name.into();

        let definition = {
            let mut partials = self.inner.partials.write();
            if partials.contains_key(&name) {
                return Err(RegistryError::DuplicateName(name));
            }
            let definition = Arc::new(validate_structure(&name, candidate)?);
            partials.insert(name.clone(), Arc::clone(&definition));
            definition
        };
        self.inner.cache.invalidate(&name);

        tracing::debug!("Registered partial {}", name);
        self.emit(RegistryEvent::Registered {
            name,
            definition: Arc::clone(&definition),
        });

        Ok(definition)
    }

    /// Remove a partial. Returns whether it was registered.
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.inner.partials.write().shift_remove(name).is_some();
        if !removed {
            return false;
        }
        self.inner.cache.invalidate(name);

        tracing::debug!("Unregistered partial {}", name);
        self.emit(RegistryEvent::Unregistered {
            name: name.to_string(),
        });
        true
    }

    /// Check if a partial is registered.
    pub fn has(&self, name: &str) -> bool {
        self.inner.partials.read().contains_key(name)
    }

    /// Get a registered partial by name.
    pub fn get(&self, name: &str) -> Option<Arc<PartialDefinition>> {
        self.inner.partials.read().get(name).cloned()
    }

    /// Registered names in insertion order.
    pub fn partial_names(&self) -> Vec<String> {
        self.inner.partials.read().keys().cloned().collect()
    }

    /// Point-in-time copy of every registered partial.
    pub fn get_all(&self) -> IndexMap<String, Arc<PartialDefinition>> {
        self.inner.partials.read().clone()
    }

    /// Number of registered partials.
    pub fn len(&self) -> usize {
        self.inner.partials.read().len()
    }

    /// Check if no partials are registered.
    pub fn is_empty(&self) -> bool {
        self.inner.partials.read().is_empty()
    }

    /// Load order for `name`: its transitive dependencies first, `name` last.
    pub fn resolve_dependencies(&self, name: &str) -> Result<Vec<String>, RegistryError> {
        resolver::resolve(name, &self.inner.partials.read())
    }

    /// Styles of `name` and its dependencies, dependencies first.
    pub fn collect_styles(&self, name: &str) -> Result<String, RegistryError> {
        let partials = self.inner.partials.read();
        let order = resolver::resolve(name, &partials)?;

        let styles: Vec<&str> = order
            .iter()
            .filter_map(|n| partials.get(n))
            .map(|d| d.styles().trim())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(styles.join("\n"))
    }

    /// Validate props against the partial's schema.
    ///
    /// Returns the normalized props (defaults applied, unknown keys dropped).
    pub fn validate_partial_props(&self, name: &str, props: &Value) -> Result<Value, RegistryError> {
        let definition = self.require(name)?;
        self.validate_against(name, &definition, props)
    }

    /// Validate props and render the partial's template.
    pub fn render(&self, name: &str, props: &Value) -> Result<String, RegistryError> {
        let definition = self.require(name)?;
        let validated = self.validate_against(name, &definition, props)?;

        definition
            .template()
            .render(&validated)
            .map_err(|e| RegistryError::Render {
                name: name.to_string(),
                message: e.to_string(),
            })
    }

    fn require(&self, name: &str) -> Result<Arc<PartialDefinition>, RegistryError> {
        self.get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    fn validate_against(
        &self,
        name: &str,
        definition: &PartialDefinition,
        props: &Value,
    ) -> Result<Value, RegistryError> {
        let schema = self.inner.cache.schema_for(name, definition.schema());
        schema
            .validate(props)
            .map_err(|issues| RegistryError::PropValidation {
                name: name.to_string(),
                issues,
            })
    }

    /// Subscribe to registry events.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.inner.events.subscribe()
    }

    /// Validation cache hits and misses since the registry was created.
    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }

    /// Insert or replace a definition without the duplicate-name check.
    ///
    /// Used by discovery and hot reload, where the file is the source of truth
    /// for its name.
    pub(crate) fn store(&self, name: &str, definition: PartialDefinition) -> Arc<PartialDefinition> {
        let definition = Arc::new(definition);
        self.inner
            .partials
            .write()
            .insert(name.to_string(), Arc::clone(&definition));
        self.inner.cache.invalidate(name);
        definition
    }

    pub(crate) fn emit(&self, event: RegistryEvent) {
        self.inner.events.send(event);
    }
}

impl Default for PartialRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PartialRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialRegistry")
            .field("partials", &self.partial_names())
            .field("hot_reload", &self.is_hot_reload_enabled())
            .finish()
    }
}

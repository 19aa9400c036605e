//! Partial registry for brochure sites.
//!
//! Partials are reusable page fragments: a prop schema, a template, styles,
//! dependencies on other partials, and catalog metadata. This crate keeps them
//! in a validated in-memory store, resolves dependency load order, discovers
//! partial files on disk, and reloads them while the site is being edited.

pub mod cache;
pub mod discovery;
pub mod error;
pub mod events;
mod hot_reload;
pub mod loader;
pub mod partial;
pub mod registry;
mod resolver;
pub mod schema;
pub mod validate;
pub mod watcher;

#[cfg(test)]
mod fixtures;

pub use cache::{CacheStats, DEFAULT_CACHE_TTL};
pub use discovery::{DiscoveryFailure, DiscoveryReport};
pub use error::RegistryError;
pub use events::{RegistryEvent, DEFAULT_EVENT_CAPACITY};
pub use loader::{extract_partial_name, is_partial_file, PartialLoader, YamlLoader, PARTIAL_SUFFIX};
pub use partial::{
    CandidateMetadata, Category, PartialCandidate, PartialDefinition, PartialMetadata, Template,
    TemplateError,
};
pub use registry::{PartialRegistry, RegistryConfig};
pub use schema::{FieldKind, FieldSchema, PropSchema, SchemaIssue};
pub use validate::{candidate_from_document, validate_structure};
pub use watcher::{FileWatcher, WatchEvent};

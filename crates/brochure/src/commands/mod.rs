//! CLI commands.

pub mod check;
pub mod init;
pub mod list;
pub mod render;
pub mod watch;

use std::path::Path;

use anyhow::Result;
use brochure_partials::{DiscoveryReport, PartialRegistry};

use crate::config::{load_config, ConfigFile};

/// A registry populated from the configured partials directory.
pub struct Workspace {
    pub config: ConfigFile,
    pub registry: PartialRegistry,
    pub report: DiscoveryReport,
}

impl Workspace {
    pub async fn load(config_path: &Path) -> Result<Self> {
        let config = load_config(config_path)?;
        let registry = PartialRegistry::with_config(config.registry_config());
        let report = registry.discover_partials(&config.partials.dir).await;

        Ok(Self {
            config,
            registry,
            report,
        })
    }
}

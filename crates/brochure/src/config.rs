//! Configuration file (brochure.toml).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use brochure_partials::{RegistryConfig, DEFAULT_CACHE_TTL};
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub partials: PartialsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize)]
pub struct PartialsConfig {
    /// Directory scanned for partial files
    #[serde(default = "default_partials_dir")]
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    /// Freshness window for prop-validation cache entries
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
}

impl Default for PartialsConfig {
    fn default() -> Self {
        Self {
            dir: default_partials_dir(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_ttl_ms(),
        }
    }
}

fn default_partials_dir() -> PathBuf {
    PathBuf::from("partials")
}

fn default_ttl_ms() -> u64 {
    DEFAULT_CACHE_TTL.as_millis() as u64
}

impl ConfigFile {
    /// Registry tuning taken from the `[cache]` table.
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            cache_ttl: Duration::from_millis(self.cache.ttl_ms),
            ..RegistryConfig::default()
        }
    }
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() {
        let temp = tempdir().unwrap();

        let config = load_config(&temp.path().join("brochure.toml")).unwrap();

        assert_eq!(config.partials.dir, PathBuf::from("partials"));
        assert_eq!(config.cache.ttl_ms, 5000);
    }

    #[test]
    fn reads_partials_and_cache_sections() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("brochure.toml");
        fs::write(&path, "[partials]\ndir = \"site/partials\"\n\n[cache]\nttl_ms = 250\n").unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.partials.dir, PathBuf::from("site/partials"));
        assert_eq!(config.registry_config().cache_ttl, Duration::from_millis(250));
    }

    #[test]
    fn partial_sections_fall_back_to_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("brochure.toml");
        fs::write(&path, "[cache]\n").unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.partials.dir, PathBuf::from("partials"));
        assert_eq!(config.cache.ttl_ms, 5000);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("brochure.toml");
        fs::write(&path, "[cache]\nttl_ms = \"soon\"\n").unwrap();

        let err = load_config(&path).unwrap_err();

        assert!(err.to_string().contains("Failed to parse"));
    }
}

//! Configuration schema for chacc
//!
//! Configuration is stored at `~/.config/chacc/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache location
    pub cache: CacheConfig,

    /// External resolver settings
    pub resolver: ResolverConfig,

    /// Requirement file discovery
    pub discovery: DiscoveryConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding `dependency_cache.json`
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".dependency_cache"),
        }
    }
}

/// Resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Python interpreter used for pip-tools and pip
    pub python: String,

    /// Per-module resolver timeout in seconds
    pub timeout_secs: u64,

    /// Maximum number of modules resolved at once
    pub max_concurrency: usize,

    /// Extra arguments passed to pip-compile
    pub extra_args: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            timeout_secs: 300,
            max_concurrency: 4,
            extra_args: vec![],
        }
    }
}

/// Discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// File name pattern to search for
    pub pattern: String,

    /// Directories searched recursively (defaults to the current directory)
    pub search_dirs: Vec<PathBuf>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            pattern: "requirements.txt".to_string(),
            search_dirs: vec![PathBuf::from(".")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[resolver]"));
        assert!(toml.contains("[discovery]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.cache.dir, PathBuf::from(".dependency_cache"));
        assert_eq!(config.resolver.python, "python3");
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [resolver]
            max_concurrency = 8
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.resolver.max_concurrency, 8);
        assert_eq!(config.resolver.timeout_secs, 300); // default preserved
        assert_eq!(config.discovery.pattern, "requirements.txt");
    }
}

//! Persisted cache record schema

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version of the on-disk record layout. Records with any other version load as empty.
pub const SCHEMA_VERSION: u32 = 1;

/// Package name -> version specifier (e.g. `requests` -> `==2.31.0`)
pub type PackageMap = BTreeMap<String, String>;

/// Cached resolution of a single module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleCacheEntry {
    /// Module hash at the time of the last successful resolution
    pub hash: String,

    /// Resolved packages keyed by canonical name
    pub packages: PackageMap,

    /// When this module was last resolved
    pub last_updated: DateTime<Utc>,
}

/// Full persisted cache state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Layout version, see [`SCHEMA_VERSION`]
    pub schema_version: u32,

    /// Per-module entries keyed by module name
    #[serde(default)]
    pub requirements_caches: BTreeMap<String, ModuleCacheEntry>,

    /// Hash over all module hashes and the environment
    #[serde(default)]
    pub combined_hash: Option<String>,

    /// Environment fingerprint used for `combined_hash`
    #[serde(default)]
    pub environment_hash: Option<String>,

    /// Merge of every module's packages
    #[serde(default)]
    pub resolved_packages: PackageMap,

    /// When any module entry last changed
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl CacheRecord {
    /// First-run record: no modules, no hashes
    pub fn empty() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            requirements_caches: BTreeMap::new(),
            combined_hash: None,
            environment_hash: None,
            resolved_packages: BTreeMap::new(),
            last_updated: None,
        }
    }

    /// Whether the record holds no module entries
    pub fn is_empty(&self) -> bool {
        self.requirements_caches.is_empty()
    }

    /// Entry for a module, if cached
    pub fn module(&self, name: &str) -> Option<&ModuleCacheEntry> {
        self.requirements_caches.get(name)
    }
}

impl Default for CacheRecord {
    fn default() -> Self {
        Self::empty()
    }
}

//! Per-module cache hit/miss decisions and entry commits
//!
//! # Entry States
//!
//! | State | Meaning |
//! |-------|---------|
//! | Miss  | No entry for the module |
//! | Stale | Entry exists but its hash no longer matches the current inputs |
//! | Fresh | Entry hash matches, cached packages are reused |

use crate::cache::fingerprint::module_hash;
use crate::cache::record::{CacheRecord, ModuleCacheEntry, PackageMap};
use crate::packages::canonical_key;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache state of one module relative to its current inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    /// No entry exists
    Miss,
    /// Entry exists but was produced from different inputs
    Stale,
    /// Entry is valid for the current inputs
    Fresh,
}

impl EntryState {
    /// Whether the module must go through the resolver
    pub fn needs_resolution(&self) -> bool {
        !matches!(self, Self::Fresh)
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Miss => "miss",
            Self::Stale => "stale",
            Self::Fresh => "fresh",
        };
        write!(f, "{}", s)
    }
}

/// Classify a module's cache entry against its current inputs
pub fn entry_state(
    module_name: &str,
    requirements: &str,
    environment_fingerprint: &str,
    record: &CacheRecord,
) -> EntryState {
    match record.module(module_name) {
        None => EntryState::Miss,
        Some(entry) if entry.hash == module_hash(module_name, requirements, environment_fingerprint) => {
            EntryState::Fresh
        }
        Some(_) => EntryState::Stale,
    }
}

/// True iff the module has no entry or its stored hash differs from the current one
pub fn is_stale(
    module_name: &str,
    requirements: &str,
    environment_fingerprint: &str,
    record: &CacheRecord,
) -> bool {
    entry_state(module_name, requirements, environment_fingerprint, record).needs_resolution()
}

/// Re-key resolver output by canonical package name
pub fn canonical_packages(packages: &PackageMap) -> PackageMap {
    packages
        .iter()
        .map(|(name, spec)| (canonical_key(name), spec.trim().to_string()))
        .collect()
}

/// Replace or insert a module entry stamped with the current time
pub fn commit(
    record: CacheRecord,
    module_name: &str,
    requirements: &str,
    environment_fingerprint: &str,
    packages: &PackageMap,
) -> CacheRecord {
    commit_at(
        record,
        module_name,
        requirements,
        environment_fingerprint,
        packages,
        Utc::now(),
    )
}

/// Replace or insert a module entry with an explicit timestamp.
///
/// Only the named module's entry changes. Derived fields (`combined_hash`,
/// `resolved_packages`) are left for [`crate::cache::merge::refresh_derived`].
pub fn commit_at(
    mut record: CacheRecord,
    module_name: &str,
    requirements: &str,
    environment_fingerprint: &str,
    packages: &PackageMap,
    now: DateTime<Utc>,
) -> CacheRecord {
    let entry = ModuleCacheEntry {
        hash: module_hash(module_name, requirements, environment_fingerprint),
        packages: canonical_packages(packages),
        last_updated: now,
    };

    record
        .requirements_caches
        .insert(module_name.to_string(), entry);
    record.last_updated = Some(now);
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    const FP: &str = "env-fingerprint";

    fn packages(pairs: &[(&str, &str)]) -> PackageMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn missing_entry_is_stale() {
        let record = CacheRecord::empty();
        assert_eq!(entry_state("api", "requests", FP, &record), EntryState::Miss);
        assert!(is_stale("api", "requests", FP, &record));
    }

    #[test]
    fn committed_entry_is_fresh() {
        let record = commit(
            CacheRecord::empty(),
            "api",
            "requests",
            FP,
            &packages(&[("requests", "==2.31.0")]),
        );
        assert_eq!(entry_state("api", "requests", FP, &record), EntryState::Fresh);
        assert!(!is_stale("api", "requests", FP, &record));
    }

    #[test]
    fn changed_text_or_environment_is_stale() {
        let record = commit(CacheRecord::empty(), "api", "requests", FP, &PackageMap::new());
        assert_eq!(
            entry_state("api", "requests>=2", FP, &record),
            EntryState::Stale
        );
        assert_eq!(
            entry_state("api", "requests", "other-env", &record),
            EntryState::Stale
        );
    }

    #[test]
    fn commit_leaves_other_modules_untouched() {
        let record = commit(
            CacheRecord::empty(),
            "api",
            "requests",
            FP,
            &packages(&[("requests", "==2.31.0")]),
        );
        let api_before = record.module("api").cloned().unwrap();

        let record = commit(record, "web", "flask", FP, &packages(&[("Flask", "==3.0.0")]));

        assert_eq!(record.module("api"), Some(&api_before));
        assert_eq!(record.requirements_caches.len(), 2);
    }

    #[test]
    fn commit_canonicalizes_package_names() {
        let record = commit(
            CacheRecord::empty(),
            "web",
            "flask",
            FP,
            &packages(&[("Flask_Cors", "==4.0.0"), ("Jinja2", " ==3.1.2 ")]),
        );
        let entry = record.module("web").unwrap();
        assert_eq!(entry.packages.get("flask-cors").map(String::as_str), Some("==4.0.0"));
        assert_eq!(entry.packages.get("jinja2").map(String::as_str), Some("==3.1.2"));
    }

    #[test]
    fn commit_replaces_entry_as_a_unit() {
        let record = commit(
            CacheRecord::empty(),
            "api",
            "requests",
            FP,
            &packages(&[("requests", "==2.28.0"), ("idna", "==3.4")]),
        );
        let record = commit(record, "api", "httpx", FP, &packages(&[("httpx", "==0.27.0")]));

        let entry = record.module("api").unwrap();
        assert_eq!(entry.packages.len(), 1);
        assert!(entry.packages.contains_key("httpx"));
        assert_eq!(entry.hash, module_hash("api", "httpx", FP));
    }
}

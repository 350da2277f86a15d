//! Global package merge and combined hash
//!
//! Both are derived purely from `requirements_caches` and the environment
//! fingerprint. Modules are visited in lexicographic order; when two modules
//! pin the same package differently, the module that sorts last wins.

use crate::cache::fingerprint::pairs_hash;
use crate::cache::record::{CacheRecord, ModuleCacheEntry, PackageMap};
use std::collections::BTreeMap;
use tracing::warn;

/// A package pinned differently by two or more modules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageConflict {
    /// Canonical package name
    pub package: String,

    /// `(module, version spec)` in module order; the last one wins
    pub specs: Vec<(String, String)>,
}

impl PackageConflict {
    /// The version spec kept in `resolved_packages`
    pub fn winner(&self) -> Option<&(String, String)> {
        self.specs.last()
    }
}

/// Union of all module packages, last writer wins by module name
pub fn merge_packages(caches: &BTreeMap<String, ModuleCacheEntry>) -> PackageMap {
    let mut merged = PackageMap::new();
    for entry in caches.values() {
        for (name, spec) in &entry.packages {
            merged.insert(name.clone(), spec.clone());
        }
    }
    merged
}

/// Packages whose version specs disagree across modules
pub fn find_conflicts(caches: &BTreeMap<String, ModuleCacheEntry>) -> Vec<PackageConflict> {
    let mut by_package: BTreeMap<&str, Vec<(String, String)>> = BTreeMap::new();
    for (module, entry) in caches {
        for (name, spec) in &entry.packages {
            by_package
                .entry(name.as_str())
                .or_default()
                .push((module.clone(), spec.clone()));
        }
    }

    by_package
        .into_iter()
        .filter(|(_, specs)| specs.iter().any(|(_, s)| *s != specs[0].1))
        .map(|(package, specs)| PackageConflict {
            package: package.to_string(),
            specs,
        })
        .collect()
}

/// Hash over the sorted `(module, entry hash)` pairs plus the environment
pub fn combined_hash(
    caches: &BTreeMap<String, ModuleCacheEntry>,
    environment_fingerprint: &str,
) -> String {
    pairs_hash(
        caches
            .iter()
            .map(|(module, entry)| (module.as_str(), entry.hash.as_str())),
        environment_fingerprint,
    )
}

/// Recompute `combined_hash` and `resolved_packages` from the module entries
pub fn refresh_derived(record: &mut CacheRecord) {
    for conflict in find_conflicts(&record.requirements_caches) {
        if let Some((module, spec)) = conflict.winner() {
            warn!(
                "Package {} pinned differently across modules, using {}{} from {}",
                conflict.package, conflict.package, spec, module
            );
        }
    }

    record.resolved_packages = merge_packages(&record.requirements_caches);
    record.combined_hash = if record.requirements_caches.is_empty() {
        None
    } else {
        let fingerprint = record.environment_hash.as_deref().unwrap_or_default();
        Some(combined_hash(&record.requirements_caches, fingerprint))
    };
}

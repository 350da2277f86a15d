//! Resolution orchestration
//!
//! One `resolve`/`upgrade` call owns the cache record from load to save:
//!
//! 1. probe the environment once and fingerprint it
//! 2. split modules into fresh (reused as-is) and stale
//! 3. resolve stale modules concurrently, results come back over a channel
//! 4. commit successes in module-name order, keep failed modules' old entries
//! 5. recompute `resolved_packages` and `combined_hash`
//! 6. save once, atomically
//!
//! Resolver tasks never see the record, so no locking is needed and an
//! interrupted run leaves the persisted cache untouched.

use crate::cache::{
    commit, entry_state, refresh_derived, CacheRecord, CacheStore, PackageMap,
};
use crate::config::Config;
use crate::discovery::discover_requirements;
use crate::error::{ChaccError, ChaccResult};
use crate::resolver::{ResolveMode, Resolver};
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

/// Module name -> requirement text
pub type ModuleRequirements = BTreeMap<String, String>;

/// A module whose resolution failed; its previous entry was kept
#[derive(Debug)]
pub struct ModuleFailure {
    /// Module name
    pub module: String,

    /// Resolver error
    pub error: ChaccError,
}

/// Outcome of one resolve or upgrade run
#[derive(Debug)]
pub struct ResolveReport {
    /// Record after the run (as persisted)
    pub record: CacheRecord,

    /// Modules sent to the resolver and committed
    pub resolved: Vec<String>,

    /// Modules served from the cache
    pub reused: Vec<String>,

    /// Modules whose resolution failed
    pub failures: Vec<ModuleFailure>,

    /// Cached modules outside the request dropped because the environment changed
    pub evicted: Vec<String>,

    /// Discovery found no requirement files
    pub nothing_discovered: bool,

    /// Whether the record changed and was written
    pub saved: bool,
}

impl ResolveReport {
    fn discovered_nothing(record: CacheRecord) -> Self {
        Self {
            record,
            resolved: vec![],
            reused: vec![],
            failures: vec![],
            evicted: vec![],
            nothing_discovered: true,
            saved: false,
        }
    }

    /// True when no module failed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of resolver invocations made
    pub fn resolver_calls(&self) -> usize {
        self.resolved.len() + self.failures.len()
    }
}

type TaskResult = (String, String, ChaccResult<PackageMap>);

/// Coordinates the cache store and the resolver
pub struct DependencyManager {
    store: CacheStore,
    resolver: Arc<dyn Resolver>,
    config: Config,
}

impl DependencyManager {
    /// Create a manager using the cache directory from `config`
    pub fn new(config: Config, resolver: Arc<dyn Resolver>) -> Self {
        Self {
            store: CacheStore::new(config.cache.dir.clone()),
            resolver,
            config,
        }
    }

    /// Cache directory
    pub fn cache_dir(&self) -> &Path {
        self.store.dir()
    }

    /// Underlying store
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Load the persisted record (empty if missing or unreadable)
    pub async fn load_cache(&self) -> CacheRecord {
        self.store.load().await
    }

    /// Persist a record
    pub async fn save_cache(&self, record: &CacheRecord) -> ChaccResult<()> {
        self.store.save(record).await
    }

    /// Drop every cached module
    pub async fn invalidate_all(&self) -> ChaccResult<CacheRecord> {
        self.store.clear().await
    }

    /// Drop one cached module
    pub async fn invalidate_module(&self, module_name: &str) -> ChaccResult<CacheRecord> {
        self.store.clear_module(module_name).await
    }

    /// Resolve modules, reusing every cache entry that is still valid.
    ///
    /// With `None`, requirement files are discovered using the configured
    /// pattern and search directories.
    pub async fn resolve(&self, modules: Option<ModuleRequirements>) -> ChaccResult<ResolveReport> {
        self.run(modules, ResolveMode::Default).await
    }

    /// Re-resolve the given modules even when their cache entries are valid
    pub async fn upgrade(&self, modules: Option<ModuleRequirements>) -> ChaccResult<ResolveReport> {
        self.run(modules, ResolveMode::Upgrade).await
    }

    async fn run(
        &self,
        modules: Option<ModuleRequirements>,
        mode: ResolveMode,
    ) -> ChaccResult<ResolveReport> {
        let record = self.store.load().await;

        let modules = match modules {
            Some(modules) => modules,
            None => {
                let discovery = &self.config.discovery;
                let found = discover_requirements(&discovery.pattern, &discovery.search_dirs)?;
                if found.is_empty() {
                    warn!(
                        "No files matching {} found in {:?}",
                        discovery.pattern, discovery.search_dirs
                    );
                    return Ok(ResolveReport::discovered_nothing(record));
                }
                found
            }
        };

        let report = self.resolve_record(&modules, record, mode).await?;

        if report.saved {
            self.store.save(&report.record).await?;
        } else {
            debug!("Cache is up to date, nothing to save");
        }

        Ok(report.finish())
    }

    /// Compute the updated record for `modules` without persisting it
    pub async fn resolve_record(
        &self,
        modules: &ModuleRequirements,
        mut record: CacheRecord,
        mode: ResolveMode,
    ) -> ChaccResult<ResolveReport> {
        let environment = self.resolver.environment().await?;
        let fingerprint = environment.fingerprint();
        debug!("Environment: {} [{}]", environment, &fingerprint[..12]);

        let evicted = if record.environment_hash.as_deref() != Some(fingerprint.as_str()) {
            evict_unrequested(&mut record, modules)
        } else {
            Vec::new()
        };

        let mut stale = ModuleRequirements::new();
        let mut reused = Vec::new();
        for (name, text) in modules {
            let state = entry_state(name, text, &fingerprint, &record);
            if mode == ResolveMode::Upgrade || state.needs_resolution() {
                debug!("Module {} is {}, resolving", name, state);
                stale.insert(name.clone(), text.clone());
            } else {
                debug!("Module {} is fresh, reusing cached packages", name);
                reused.push(name.clone());
            }
        }

        info!(
            "Resolving {} of {} modules with {}",
            stale.len(),
            modules.len(),
            self.resolver.name()
        );
        let results = self.resolve_stale(stale, mode).await;

        let previous = (
            record.environment_hash.clone(),
            record.combined_hash.clone(),
            record.resolved_packages.clone(),
        );
        record.environment_hash = Some(fingerprint.clone());

        let mut resolved = Vec::new();
        let mut failures = Vec::new();
        for (name, (text, result)) in results {
            match result {
                Ok(packages) => {
                    debug!("Resolved {} to {} packages", name, packages.len());
                    record = commit(record, &name, &text, &fingerprint, &packages);
                    resolved.push(name);
                }
                Err(error) => {
                    warn!("Keeping previous cache for {}: {}", name, error);
                    failures.push(ModuleFailure {
                        module: name,
                        error,
                    });
                }
            }
        }

        refresh_derived(&mut record);

        let derived_changed = previous
            != (
                record.environment_hash.clone(),
                record.combined_hash.clone(),
                record.resolved_packages.clone(),
            );
        if derived_changed && resolved.is_empty() {
            record.last_updated = Some(Utc::now());
        }

        Ok(ResolveReport {
            record,
            saved: derived_changed || !resolved.is_empty(),
            resolved,
            reused,
            failures,
            evicted,
            nothing_discovered: false,
        })
    }

    /// Fan out resolver calls and collect results keyed by module name
    async fn resolve_stale(
        &self,
        stale: ModuleRequirements,
        mode: ResolveMode,
    ) -> BTreeMap<String, (String, ChaccResult<PackageMap>)> {
        let mut results = BTreeMap::new();
        if stale.is_empty() {
            return results;
        }

        let expected: Vec<(String, String)> = stale
            .iter()
            .map(|(name, text)| (name.clone(), text.clone()))
            .collect();
        let (tx, mut rx) = mpsc::channel::<TaskResult>(stale.len());
        let permits = Arc::new(Semaphore::new(self.config.resolver.max_concurrency.max(1)));

        for (name, text) in stale {
            let tx = tx.clone();
            let resolver = Arc::clone(&self.resolver);
            let permits = Arc::clone(&permits);

            tokio::spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => resolver.resolve(&name, &text, mode).await,
                    Err(_) => Err(ChaccError::resolution(&name, "resolver pool closed")),
                };
                let _ = tx.send((name, text, result)).await;
            });
        }
        drop(tx);

        while let Some((name, text, result)) = rx.recv().await {
            results.insert(name, (text, result));
        }

        // A panicked task drops its sender without reporting
        for (name, text) in expected {
            results.entry(name.clone()).or_insert_with(|| {
                (text, Err(ChaccError::resolution(name, "resolver task aborted")))
            });
        }

        results
    }
}

/// Remove entries not in `modules`; they were resolved for another environment
/// and cannot be re-resolved without their requirement text.
fn evict_unrequested(record: &mut CacheRecord, modules: &ModuleRequirements) -> Vec<String> {
    let evicted: Vec<String> = record
        .requirements_caches
        .keys()
        .filter(|name| !modules.contains_key(*name))
        .cloned()
        .collect();

    for name in &evicted {
        warn!("Environment changed, dropping cached module {}", name);
        record.requirements_caches.remove(name);
    }
    evicted
}

impl ResolveReport {
    fn finish(mut self) -> Self {
        self.resolved.sort();
        self.reused.sort();
        self
    }
}

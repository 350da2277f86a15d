//! Durable storage for the cache record
//!
//! The record lives in `<cache_dir>/dependency_cache.json`. Writes go to a
//! temporary file in the same directory which is synced and then renamed over
//! the target, so readers see either the old record or the new one.

use crate::cache::merge::refresh_derived;
use crate::cache::record::{CacheRecord, SCHEMA_VERSION};
use crate::error::{ChaccError, ChaccResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// File name of the persisted record
pub const CACHE_FILE: &str = "dependency_cache.json";

/// Result of reading the persisted record
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// A valid record was read
    Loaded(CacheRecord),
    /// No record has been written yet
    Missing,
    /// The file exists but cannot be used
    Corrupt { reason: String },
}

impl LoadOutcome {
    /// The loaded record, or an empty one for missing/corrupt data
    pub fn into_record(self) -> CacheRecord {
        match self {
            Self::Loaded(record) => record,
            Self::Missing | Self::Corrupt { .. } => CacheRecord::empty(),
        }
    }

    /// Whether the persisted data was unreadable
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}

/// Owner of the on-disk cache record
#[derive(Debug, Clone)]
pub struct CacheStore {
    cache_dir: PathBuf,
}

impl CacheStore {
    /// Create a store rooted at `cache_dir` (created lazily on first save)
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the record file
    pub fn path(&self) -> PathBuf {
        self.cache_dir.join(CACHE_FILE)
    }

    /// Read the persisted record without falling back
    pub async fn try_load(&self) -> LoadOutcome {
        let path = self.path();

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return LoadOutcome::Missing,
            Err(e) => {
                return LoadOutcome::Corrupt {
                    reason: format!("reading {}: {}", path.display(), e),
                }
            }
        };

        parse_record(&content)
    }

    /// Load the record, treating missing or corrupt data as an empty cache
    pub async fn load(&self) -> CacheRecord {
        let outcome = self.try_load().await;
        match &outcome {
            LoadOutcome::Loaded(record) => debug!(
                "Loaded cache with {} modules from {}",
                record.requirements_caches.len(),
                self.path().display()
            ),
            LoadOutcome::Missing => debug!("No cache at {}, starting empty", self.path().display()),
            LoadOutcome::Corrupt { reason } => warn!(
                "Ignoring unreadable cache {}: {}",
                self.path().display(),
                reason
            ),
        }
        outcome.into_record()
    }

    /// Persist the full record atomically
    pub async fn save(&self, record: &CacheRecord) -> ChaccResult<()> {
        let path = self.path();
        let write_err = |source| ChaccError::CacheWrite {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.cache_dir).await.map_err(write_err)?;

        let mut content = serde_json::to_string_pretty(record)?;
        content.push('\n');

        let tmp = self
            .cache_dir
            .join(format!(".{}.{}.tmp", CACHE_FILE, uuid::Uuid::new_v4()));

        let written = async {
            let mut file = fs::File::create(&tmp).await?;
            file.write_all(content.as_bytes()).await?;
            file.sync_all().await?;
            fs::rename(&tmp, &path).await
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp).await;
            return Err(write_err(e));
        }

        debug!("Saved cache to {}", path.display());
        Ok(())
    }

    /// Reset to an empty record and persist it
    pub async fn clear(&self) -> ChaccResult<CacheRecord> {
        let record = CacheRecord::empty();
        self.save(&record).await?;
        info!("Cleared dependency cache at {}", self.cache_dir.display());
        Ok(record)
    }

    /// Drop one module's entry and persist the recomputed record
    pub async fn clear_module(&self, module_name: &str) -> ChaccResult<CacheRecord> {
        let mut record = self.load().await;

        if record.requirements_caches.remove(module_name).is_some() {
            info!("Removed cached module {}", module_name);
        } else {
            debug!("Module {} not cached, nothing to remove", module_name);
        }

        refresh_derived(&mut record);
        self.save(&record).await?;
        Ok(record)
    }
}

/// Parse record JSON, rejecting unknown schema versions
fn parse_record(content: &str) -> LoadOutcome {
    let value: serde_json::Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => {
            return LoadOutcome::Corrupt {
                reason: format!("invalid JSON: {}", e),
            }
        }
    };

    match value.get("schema_version").and_then(|v| v.as_u64()) {
        Some(v) if v == u64::from(SCHEMA_VERSION) => {}
        Some(v) => {
            return LoadOutcome::Corrupt {
                reason: format!("unsupported schema version {}", v),
            }
        }
        None => {
            return LoadOutcome::Corrupt {
                reason: "missing schema_version".to_string(),
            }
        }
    }

    match serde_json::from_value(value) {
        Ok(record) => LoadOutcome::Loaded(record),
        Err(e) => LoadOutcome::Corrupt {
            reason: format!("invalid record: {}", e),
        },
    }
}

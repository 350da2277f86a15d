//! Fingerprinted dependency cache
//!
//! Each module's resolution is cached under a hash of its name, its
//! requirement text and the environment fingerprint. Changing a module's
//! text invalidates only that module; changing the environment invalidates
//! every module at once because the fingerprint feeds every module hash.
//!
//! The global `resolved_packages` and `combined_hash` are always recomputed
//! from the module entries and never edited on their own.

pub mod entry;
pub mod fingerprint;
pub mod merge;
pub mod record;
pub mod store;

pub use entry::{commit, entry_state, is_stale, EntryState};
pub use fingerprint::{environment_fingerprint, module_hash, Environment};
pub use merge::{combined_hash, find_conflicts, merge_packages, refresh_derived, PackageConflict};
pub use record::{CacheRecord, ModuleCacheEntry, PackageMap, SCHEMA_VERSION};
pub use store::{CacheStore, LoadOutcome, CACHE_FILE};

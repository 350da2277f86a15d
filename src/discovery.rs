//! Requirement file discovery
//!
//! Finds requirement files matching a file-name pattern below a set of
//! search directories. Each file becomes one module, named by its path.

use crate::error::{ChaccError, ChaccResult};
use std::collections::BTreeMap;
use std::path::{Component, Path};
use tracing::{debug, info, warn};

/// Directory names never searched
const SKIP_DIRS: &[&str] = &[
    "node_modules",
    "site-packages",
    "__pycache__",
    "venv",
    "env",
    "build",
    "dist",
];

/// Whether a path passes through a hidden, virtualenv or build directory
fn is_skipped(relative: &Path) -> bool {
    let mut components: Vec<Component<'_>> = relative.components().collect();
    // Only directories count, not the file itself
    components.pop();

    components.iter().any(|c| match c {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            name.starts_with('.') || SKIP_DIRS.contains(&name.as_ref())
        }
        _ => false,
    })
}

/// Module name for a discovered file: its path with `/` separators
pub fn module_name(path: &Path) -> String {
    let name = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/");

    // Absolute paths keep their root marker
    name.replace("//", "/")
}

/// Discover requirement files and read their contents.
///
/// `pattern` is a file-name glob (e.g. `requirements*.txt`) matched at any
/// depth below each search directory. Returns module name -> requirement text.
pub fn discover_requirements<P: AsRef<Path>>(
    pattern: &str,
    search_dirs: &[P],
) -> ChaccResult<BTreeMap<String, String>> {
    let mut modules = BTreeMap::new();

    for dir in search_dirs {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            debug!("Search directory does not exist: {}", dir.display());
            continue;
        }

        let full = dir.join("**").join(pattern);
        let entries = glob::glob(&full.to_string_lossy()).map_err(|e| {
            ChaccError::DiscoveryPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            }
        })?;

        for path in entries.flatten() {
            if !path.is_file() {
                continue;
            }
            let relative = path.strip_prefix(dir).unwrap_or(&path);
            if is_skipped(relative) {
                debug!("Skipping {}", path.display());
                continue;
            }

            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    debug!("Discovered requirements: {}", path.display());
                    modules.insert(module_name(&path), text);
                }
                Err(e) => warn!("Skipping unreadable {}: {}", path.display(), e),
            }
        }
    }

    info!("Discovered {} requirement files", modules.len());
    Ok(modules)
}

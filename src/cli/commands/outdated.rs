//! Outdated command - cached packages with newer releases available

use super::EMPTY_CACHE;
use crate::cache::{CacheStore, PackageMap};
use crate::config::Config;
use crate::error::ChaccResult;
use crate::packages::{base_name, canonicalize_name, OutdatedPackage, Pip};
use crate::ui::{self, TaskSpinner, UiContext};
use std::collections::BTreeSet;

/// Execute the outdated command
pub async fn execute(config: &Config, ctx: &UiContext) -> ChaccResult<()> {
    let record = CacheStore::new(config.cache.dir.clone()).load().await;
    if record.resolved_packages.is_empty() {
        println!("{}", EMPTY_CACHE);
        return Ok(());
    }

    let mut spinner = TaskSpinner::new(ctx);
    spinner.start("Checking for newer releases...");
    let outdated = match Pip::new(config.resolver.python.clone()).outdated().await {
        Ok(list) => {
            spinner.stop("Checked package index");
            list
        }
        Err(e) => {
            spinner.stop_error("Could not query package index");
            return Err(e);
        }
    };

    let cached = cached_outdated(&record.resolved_packages, outdated);
    if cached.is_empty() {
        ui::step_ok(ctx, "All cached packages are up to date");
        return Ok(());
    }

    println!();
    println!("{:<30} {:<15} {:<15}", "PACKAGE", "INSTALLED", "LATEST");
    println!("{}", "-".repeat(60));
    for package in &cached {
        println!(
            "{:<30} {:<15} {:<15}",
            package.name, package.version, package.latest_version
        );
    }
    println!();
    ui::step_info(ctx, "Run 'cdm upgrade' to re-resolve with newer releases");
    Ok(())
}

/// Keep only outdated packages that are part of the cached set
fn cached_outdated(resolved: &PackageMap, outdated: Vec<OutdatedPackage>) -> Vec<OutdatedPackage> {
    let cached: BTreeSet<String> = resolved.keys().map(|k| base_name(k)).collect();
    outdated
        .into_iter()
        .filter(|p| cached.contains(&canonicalize_name(&p.name)))
        .collect()
}

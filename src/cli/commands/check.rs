//! Check command - compare the cached package set with the environment

use super::EMPTY_CACHE;
use crate::cache::{CacheStore, PackageMap};
use crate::cli::args::CheckArgs;
use crate::config::Config;
use crate::error::{ChaccError, ChaccResult};
use crate::packages::{base_name, Pip};
use crate::ui::{self, UiContext};
use std::collections::BTreeSet;

/// Execute the check command
pub async fn execute(args: CheckArgs, config: &Config, ctx: &UiContext) -> ChaccResult<()> {
    let record = CacheStore::new(config.cache.dir.clone()).load().await;
    if record.resolved_packages.is_empty() {
        println!("{}", EMPTY_CACHE);
        return Ok(());
    }

    let installed = Pip::new(config.resolver.python.clone()).installed().await?;
    let diff = PackageDiff::compare(&record.resolved_packages, &installed);

    if diff.missing.is_empty() {
        ui::step_ok(
            ctx,
            &format!(
                "All {} cached packages are installed",
                record.resolved_packages.len()
            ),
        );
    } else {
        ui::step_warn(ctx, &format!("{} package(s) not installed:", diff.missing.len()));
        for key in &diff.missing {
            let spec = record.resolved_packages.get(key).map(String::as_str).unwrap_or("");
            ui::bullet(ctx, &format!("{}{}", key, spec));
        }
    }

    if args.all {
        if diff.extra.is_empty() {
            ui::step_info(ctx, "No installed packages outside the cache");
        } else {
            ui::step_info(
                ctx,
                &format!("{} installed package(s) not in the cache:", diff.extra.len()),
            );
            for name in &diff.extra {
                ui::bullet(ctx, name);
            }
        }
    }

    if diff.missing.is_empty() {
        Ok(())
    } else {
        Err(ChaccError::MissingPackages {
            count: diff.missing.len(),
        })
    }
}

/// Cached keys missing from the environment, and installed names not cached
#[derive(Debug, Default, PartialEq, Eq)]
struct PackageDiff {
    missing: Vec<String>,
    extra: Vec<String>,
}

impl PackageDiff {
    fn compare(resolved: &PackageMap, installed: &BTreeSet<String>) -> Self {
        let cached: BTreeSet<String> = resolved.keys().map(|k| base_name(k)).collect();

        Self {
            missing: resolved
                .keys()
                .filter(|k| !installed.contains(&base_name(k)))
                .cloned()
                .collect(),
            extra: installed.difference(&cached).cloned().collect(),
        }
    }
}

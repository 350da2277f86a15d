//! Resolve command - refresh the cache without installing

use super::{print_report, requested_modules, run_resolution};
use crate::cli::args::ResolveArgs;
use crate::config::Config;
use crate::error::ChaccResult;
use crate::manager::DependencyManager;
use crate::resolver::{create_resolver, ResolveMode};
use crate::ui::{self, UiContext};

/// Execute the resolve command
pub async fn execute(args: ResolveArgs, config: &Config, ctx: &UiContext) -> ChaccResult<()> {
    ui::intro(ctx, "cdm resolve");

    let config = with_discovery_overrides(config, &args);
    let modules = requested_modules(&[], args.requirements.as_deref()).await?;
    let manager = DependencyManager::new(config.clone(), create_resolver(&config));

    let report = run_resolution(ctx, &manager, modules, ResolveMode::Default).await?;
    print_report(ctx, &report)?;

    if report.saved {
        ui::outro_success(ctx, "Cache updated");
    } else if !report.nothing_discovered {
        ui::outro_success(ctx, "Cache already up to date");
    }
    Ok(())
}

/// Apply `--pattern` and `--search-dirs` on top of the loaded config
fn with_discovery_overrides(config: &Config, args: &ResolveArgs) -> Config {
    let mut config = config.clone();
    if let Some(pattern) = &args.pattern {
        config.discovery.pattern = pattern.clone();
    }
    if !args.search_dirs.is_empty() {
        config.discovery.search_dirs = args.search_dirs.clone();
    }
    config
}

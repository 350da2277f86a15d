//! Install and upgrade commands - resolve through the cache, then pip install

use super::{print_report, requested_modules, run_resolution, until_interrupted};
use crate::cli::args::InstallArgs;
use crate::config::Config;
use crate::error::ChaccResult;
use crate::manager::DependencyManager;
use crate::packages::Pip;
use crate::resolver::{create_resolver, ResolveMode};
use crate::ui::{self, TaskSpinner, UiContext};

/// Execute `install` (`ResolveMode::Default`) or `upgrade` (`ResolveMode::Upgrade`)
pub async fn execute(
    args: InstallArgs,
    mode: ResolveMode,
    config: &Config,
    ctx: &UiContext,
) -> ChaccResult<()> {
    ui::intro(
        ctx,
        match mode {
            ResolveMode::Default => "cdm install",
            ResolveMode::Upgrade => "cdm upgrade",
        },
    );

    let modules = requested_modules(&args.packages, args.requirements.as_deref()).await?;
    let manager = DependencyManager::new(config.clone(), create_resolver(config));

    let report = run_resolution(ctx, &manager, modules, mode).await?;
    print_report(ctx, &report)?;

    if report.nothing_discovered {
        ui::outro_warn(ctx, "Nothing to install");
        return Ok(());
    }
    if args.no_install {
        ui::outro_success(ctx, "Resolved (installation skipped)");
        return Ok(());
    }

    let packages = &report.record.resolved_packages;
    if packages.is_empty() {
        ui::outro_warn(ctx, "Resolved set is empty, nothing to install");
        return Ok(());
    }

    let pip = Pip::new(config.resolver.python.clone());
    let mut spinner = TaskSpinner::new(ctx);
    spinner.start(&format!("Installing {} packages...", packages.len()));

    match until_interrupted(pip.install(packages)).await {
        Ok(()) => spinner.stop(&format!("Installed {} packages", packages.len())),
        Err(e) => {
            spinner.stop_error("Installation failed");
            return Err(e);
        }
    }

    ui::outro_success(ctx, "Dependencies installed");
    Ok(())
}

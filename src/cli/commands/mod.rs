//! CLI command implementations

pub mod cache;
pub mod check;
pub mod config;
pub mod install;
pub mod outdated;
pub mod resolve;

pub use cache::execute as cache;
pub use check::execute as check;
pub use config::execute as config;
pub use install::execute as install;
pub use outdated::execute as outdated;
pub use resolve::execute as resolve;

use crate::discovery;
use crate::error::{ChaccError, ChaccResult};
use crate::manager::{DependencyManager, ModuleRequirements, ResolveReport};
use crate::resolver::ResolveMode;
use crate::ui::{self, TaskSpinner, UiContext};
use std::future::Future;
use std::path::Path;

/// Module name used for packages given on the command line
pub const CLI_MODULE: &str = "cli";

pub(crate) const EMPTY_CACHE: &str = "No cached packages found. Run 'cdm install' first.";

/// Run `fut`, abandoning it on Ctrl-C
pub(crate) async fn until_interrupted<T>(
    fut: impl Future<Output = ChaccResult<T>>,
) -> ChaccResult<T> {
    tokio::select! {
        result = fut => result,
        _ = tokio::signal::ctrl_c() => Err(ChaccError::Cancelled),
    }
}

/// Build the requested modules from CLI input.
///
/// Ad-hoc packages form the `cli` module, a requirements file forms a module
/// named by its path, and `None` means discovery.
pub(crate) async fn requested_modules(
    packages: &[String],
    requirements: Option<&Path>,
) -> ChaccResult<Option<ModuleRequirements>> {
    if let Some(path) = requirements {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ChaccError::io(format!("reading {}", path.display()), e))?;
        let mut modules = ModuleRequirements::new();
        modules.insert(discovery::module_name(path), text);
        return Ok(Some(modules));
    }

    if packages.is_empty() {
        return Ok(None);
    }

    let mut modules = ModuleRequirements::new();
    modules.insert(CLI_MODULE.to_string(), cli_requirements(packages));
    Ok(Some(modules))
}

/// Requirement text for packages given as arguments, one per line
fn cli_requirements(packages: &[String]) -> String {
    let mut text = packages
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    text.push('\n');
    text
}

/// Resolve or upgrade behind a spinner, interruptible with Ctrl-C
pub(crate) async fn run_resolution(
    ctx: &UiContext,
    manager: &DependencyManager,
    modules: Option<ModuleRequirements>,
    mode: ResolveMode,
) -> ChaccResult<ResolveReport> {
    let mut spinner = TaskSpinner::new(ctx);
    spinner.start(match mode {
        ResolveMode::Default => "Resolving dependencies...",
        ResolveMode::Upgrade => "Resolving dependencies (preferring newer releases)...",
    });

    let resolving = async {
        match mode {
            ResolveMode::Default => manager.resolve(modules).await,
            ResolveMode::Upgrade => manager.upgrade(modules).await,
        }
    };

    match until_interrupted(resolving).await {
        Ok(report) if report.is_success() => {
            spinner.stop(&format!(
                "{} packages across {} modules",
                report.record.resolved_packages.len(),
                report.record.requirements_caches.len()
            ));
            Ok(report)
        }
        Ok(report) => {
            spinner.stop_warn("Resolution finished with failures");
            Ok(report)
        }
        Err(e) => {
            spinner.stop_error("Resolution aborted");
            Err(e)
        }
    }
}

/// Print the per-module outcome and fail if any module failed
pub(crate) fn print_report(ctx: &UiContext, report: &ResolveReport) -> ChaccResult<()> {
    if report.nothing_discovered {
        ui::step_warn(ctx, "No requirement files found");
        return Ok(());
    }

    for module in &report.resolved {
        ui::step_ok(ctx, &format!("Resolved {}", module));
    }
    if !report.reused.is_empty() {
        ui::step_info(
            ctx,
            &format!("{} module(s) unchanged, served from cache", report.reused.len()),
        );
    }

    if !report.evicted.is_empty() {
        ui::step_warn(
            ctx,
            &format!(
                "Environment changed, dropped {} module(s) not in this run:",
                report.evicted.len()
            ),
        );
        for module in &report.evicted {
            ui::bullet(ctx, module);
        }
    }

    for failure in &report.failures {
        if ctx.show_details() {
            ui::step_error_detail(ctx, &failure.module, &failure.error.to_string());
        } else {
            ui::step_error(ctx, &format!("{} (kept previous cache entry)", failure.module));
        }
    }

    ui::key_value(
        ctx,
        "Modules",
        &format!(
            "{} resolved, {} reused, {} failed",
            report.resolved.len(),
            report.reused.len(),
            report.failures.len()
        ),
    );
    ui::key_value(
        ctx,
        "Packages",
        &report.record.resolved_packages.len().to_string(),
    );

    if report.is_success() {
        Ok(())
    } else {
        Err(ChaccError::IncompleteResolution {
            failed: report.failures.len(),
        })
    }
}

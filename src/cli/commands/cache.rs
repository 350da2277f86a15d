//! Cache command - inspect or invalidate the dependency cache

use crate::cache::{CacheRecord, CacheStore, LoadOutcome};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::config::Config;
use crate::error::ChaccResult;
use crate::ui::{self, UiContext};
use console::style;
use serde::Serialize;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config, ctx: &UiContext) -> ChaccResult<()> {
    let store = CacheStore::new(config.cache.dir.clone());

    match args.action {
        CacheAction::Info { format } => show_info(&store, format).await,
        CacheAction::Clear { module: Some(module), .. } => clear_module(&store, &module, ctx).await,
        CacheAction::Clear { module: None, yes } => {
            clear_all(&store, &ctx.clone().with_auto_yes(yes)).await
        }
    }
}

#[derive(Serialize)]
struct CacheInfo {
    cache_file: String,
    state: &'static str,
    combined_hash: Option<String>,
    environment_hash: Option<String>,
    last_updated: Option<String>,
    package_count: usize,
    module_count: usize,
    modules: Vec<ModuleInfo>,
}

#[derive(Serialize)]
struct ModuleInfo {
    name: String,
    hash: String,
    package_count: usize,
    last_updated: String,
}

impl CacheInfo {
    fn new(store: &CacheStore, outcome: LoadOutcome) -> Self {
        let state = match &outcome {
            LoadOutcome::Loaded(_) => "loaded",
            LoadOutcome::Missing => "missing",
            LoadOutcome::Corrupt { .. } => "corrupt",
        };
        let record: CacheRecord = outcome.into_record();

        Self {
            cache_file: store.path().display().to_string(),
            state,
            package_count: record.resolved_packages.len(),
            module_count: record.requirements_caches.len(),
            modules: record
                .requirements_caches
                .iter()
                .map(|(name, entry)| ModuleInfo {
                    name: name.clone(),
                    hash: entry.hash.clone(),
                    package_count: entry.packages.len(),
                    last_updated: entry.last_updated.to_rfc3339(),
                })
                .collect(),
            combined_hash: record.combined_hash,
            environment_hash: record.environment_hash,
            last_updated: record.last_updated.map(|t| t.to_rfc3339()),
        }
    }
}

async fn show_info(store: &CacheStore, format: OutputFormat) -> ChaccResult<()> {
    let outcome = store.try_load().await;
    if let LoadOutcome::Corrupt { reason } = &outcome {
        eprintln!(
            "{} cache file is unreadable and will be rebuilt: {}",
            style("warning:").yellow(),
            reason
        );
    }
    let info = CacheInfo::new(store, outcome);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
        OutputFormat::Table => print_info_table(&info),
    }
    Ok(())
}

fn short(hash: &Option<String>) -> String {
    match hash {
        Some(h) => h.chars().take(16).collect(),
        None => style("none").dim().to_string(),
    }
}

fn print_info_table(info: &CacheInfo) {
    println!("Cache file:       {}", info.cache_file);
    println!("State:            {}", info.state);
    println!("Combined hash:    {}", short(&info.combined_hash));
    println!("Environment hash: {}", short(&info.environment_hash));
    println!(
        "Last updated:     {}",
        info.last_updated.as_deref().unwrap_or("never")
    );
    println!("Packages:         {}", info.package_count);
    println!("Modules:          {}", info.module_count);

    if info.modules.is_empty() {
        return;
    }

    println!();
    println!("{:<40} {:<18} {:>8}  {:<25}", "MODULE", "HASH", "PACKAGES", "UPDATED");
    println!("{}", "-".repeat(94));
    for module in &info.modules {
        println!(
            "{:<40} {:<18} {:>8}  {:<25}",
            module.name,
            module.hash.chars().take(16).collect::<String>(),
            module.package_count,
            module.last_updated
        );
    }
}

async fn clear_all(store: &CacheStore, ctx: &UiContext) -> ChaccResult<()> {
    let record = store.load().await;
    if record.is_empty() {
        println!("Cache is already empty.");
        return Ok(());
    }

    let prompt = format!(
        "Clear {} cached module(s) and {} packages?",
        record.requirements_caches.len(),
        record.resolved_packages.len()
    );
    if !ui::confirm(ctx, &prompt, true).await? {
        println!("Aborted.");
        return Ok(());
    }

    store.clear().await?;
    ui::step_ok(ctx, "Cache cleared");
    Ok(())
}

async fn clear_module(store: &CacheStore, module: &str, ctx: &UiContext) -> ChaccResult<()> {
    if store.load().await.module(module).is_none() {
        ui::step_warn(ctx, &format!("Module {} is not cached", module));
        return Ok(());
    }

    let record = store.clear_module(module).await?;
    ui::step_ok(
        ctx,
        &format!(
            "Cleared {} ({} modules remain)",
            module,
            record.requirements_caches.len()
        ),
    );
    Ok(())
}

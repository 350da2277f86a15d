//! cdm - cached dependency manager
//!
//! CLI entry point that dispatches to subcommands.

use chacc::cli::{commands, Cli, Commands};
use chacc::config::ConfigManager;
use chacc::error::ChaccResult;
use chacc::resolver::ResolveMode;
use chacc::ui::{self, UiContext};
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ChaccResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let mut config = config_manager.load().await?;

    init_logging(cli.verbose, &config.general.log_format);
    debug!("Loaded configuration from {}", config_manager.path().display());

    if let Some(dir) = cli.cache_dir {
        debug!("Cache directory overridden: {}", dir.display());
        config.cache.dir = dir;
    }

    ui::init_theme();
    let ctx = UiContext::detect().with_verbosity(cli.verbose);

    match cli.command {
        Commands::Install(args) => {
            commands::install(args, ResolveMode::Default, &config, &ctx).await
        }
        Commands::Upgrade(args) => {
            commands::install(args, ResolveMode::Upgrade, &config, &ctx).await
        }
        Commands::Resolve(args) => commands::resolve(args, &config, &ctx).await,
        Commands::Cache(args) => commands::cache(args, &config, &ctx).await,
        Commands::Check(args) => commands::check(args, &config, &ctx).await,
        Commands::Outdated => commands::outdated(&config, &ctx).await,
        Commands::Config(args) => commands::config(args, &config, &config_manager, &ctx).await,
    }
}

/// 0 = warn (spinners only), 1 = info, 2+ = debug
fn init_logging(verbose: u8, log_format: &str) {
    let filter = match verbose {
        0 => EnvFilter::new("chacc=warn"),
        1 => EnvFilter::new("chacc=info"),
        _ => EnvFilter::new("chacc=debug"),
    };

    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .init();
    }
}

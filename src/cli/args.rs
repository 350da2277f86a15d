//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// cdm - cached dependency manager
///
/// Resolves Python requirement sets once per environment and reuses the
/// result until the requirements or the interpreter change.
#[derive(Parser, Debug)]
#[command(name = "cdm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CHACC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cache directory (overrides cache.dir)
    #[arg(long, global = true, env = "CHACC_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve requirements (cached) and install them
    Install(InstallArgs),

    /// Re-resolve preferring newer releases, then install
    Upgrade(InstallArgs),

    /// Resolve requirements into the cache without installing
    Resolve(ResolveArgs),

    /// Inspect or clear the dependency cache
    Cache(CacheArgs),

    /// Compare cached packages with the installed ones
    Check(CheckArgs),

    /// List cached packages with newer releases
    Outdated,

    /// Show or initialize configuration
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
pub struct InstallArgs {
    /// Packages to resolve as the `cli` module (e.g. requests flask>=2)
    pub packages: Vec<String>,

    /// Requirements file; defaults to discovery when no packages are given
    #[arg(short, long, conflicts_with = "packages")]
    pub requirements: Option<PathBuf>,

    /// Resolve only, skip pip install
    #[arg(long)]
    pub no_install: bool,
}

#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Requirements file to resolve as a single module
    #[arg(short, long)]
    pub requirements: Option<PathBuf>,

    /// File-name pattern for discovery (overrides discovery.pattern)
    #[arg(short, long, conflicts_with = "requirements")]
    pub pattern: Option<String>,

    /// Directories to search (overrides discovery.search_dirs)
    #[arg(long, num_args = 1.., conflicts_with = "requirements")]
    pub search_dirs: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show cache location, hashes and counts
    Info {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Invalidate the whole cache or one module
    Clear {
        /// Only drop this module's entry
        #[arg(short, long)]
        module: Option<String>,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Also list installed packages that are not in the cache
    #[arg(short, long)]
    pub all: bool,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_install_packages() {
        let cli = Cli::parse_from(["cdm", "install", "requests", "flask>=2"]);
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.packages, vec!["requests", "flask>=2"]);
                assert!(args.requirements.is_none());
                assert!(!args.no_install);
            }
            _ => panic!("expected Install command"),
        }
    }

    #[test]
    fn cli_parses_install_requirements_file() {
        let cli = Cli::parse_from(["cdm", "install", "-r", "requirements.txt", "--no-install"]);
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.requirements, Some(PathBuf::from("requirements.txt")));
                assert!(args.no_install);
            }
            _ => panic!("expected Install command"),
        }
    }

    #[test]
    fn cli_rejects_packages_with_requirements_file() {
        let result = Cli::try_parse_from(["cdm", "install", "requests", "-r", "req.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parses_upgrade() {
        let cli = Cli::parse_from(["cdm", "upgrade"]);
        match cli.command {
            Commands::Upgrade(args) => assert!(args.packages.is_empty()),
            _ => panic!("expected Upgrade command"),
        }
    }

    #[test]
    fn cli_parses_resolve_discovery_overrides() {
        let cli = Cli::parse_from([
            "cdm",
            "resolve",
            "-p",
            "requirements*.txt",
            "--search-dirs",
            "services",
            "libs",
        ]);
        match cli.command {
            Commands::Resolve(args) => {
                assert_eq!(args.pattern.as_deref(), Some("requirements*.txt"));
                assert_eq!(
                    args.search_dirs,
                    vec![PathBuf::from("services"), PathBuf::from("libs")]
                );
            }
            _ => panic!("expected Resolve command"),
        }
    }

    #[test]
    fn cli_parses_cache_info_json() {
        let cli = Cli::parse_from(["cdm", "cache", "info", "--format", "json"]);
        match cli.command {
            Commands::Cache(CacheArgs {
                action: CacheAction::Info { format },
            }) => assert_eq!(format, OutputFormat::Json),
            _ => panic!("expected cache info"),
        }
    }

    #[test]
    fn cli_parses_cache_clear_module() {
        let cli = Cli::parse_from(["cdm", "cache", "clear", "--module", "api", "-y"]);
        match cli.command {
            Commands::Cache(CacheArgs {
                action: CacheAction::Clear { module, yes },
            }) => {
                assert_eq!(module.as_deref(), Some("api"));
                assert!(yes);
            }
            _ => panic!("expected cache clear"),
        }
    }

    #[test]
    fn cli_parses_check_all() {
        let cli = Cli::parse_from(["cdm", "check", "--all"]);
        match cli.command {
            Commands::Check(args) => assert!(args.all),
            _ => panic!("expected Check command"),
        }
    }

    #[test]
    fn cli_global_flags() {
        let cli = Cli::parse_from(["cdm", "-vv", "--cache-dir", "/tmp/c", "outdated"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/c")));
        assert!(matches!(cli.command, Commands::Outdated));
    }

    #[test]
    fn cli_parses_config_init_force() {
        let cli = Cli::parse_from(["cdm", "config", "init", "--force"]);
        match cli.command {
            Commands::Config(ConfigArgs {
                action: Some(ConfigAction::Init { force }),
            }) => assert!(force),
            _ => panic!("expected config init"),
        }
    }
}

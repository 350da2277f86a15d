//! pip-tools backed resolver
//!
//! Runs `python -m piptools compile` with the module's requirement text on
//! stdin and the pinned output on stdout.

use crate::cache::{Environment, PackageMap};
use crate::config::schema::ResolverConfig;
use crate::error::{ChaccError, ChaccResult};
use crate::resolver::{ResolveMode, Resolver};
use async_trait::async_trait;
use serde::Deserialize;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::debug;

/// Prints interpreter identity as one JSON object
const PROBE_SCRIPT: &str = "import json, platform, sys; print(json.dumps({\
'version': sys.version.split()[0], \
'implementation': platform.python_implementation(), \
'platform': sys.platform, \
'machine': platform.machine()}))";

#[derive(Deserialize)]
struct InterpreterProbe {
    version: String,
    implementation: String,
    platform: String,
    machine: String,
}

/// Resolver that shells out to pip-compile
pub struct PipCompileResolver {
    config: ResolverConfig,
    environment: OnceCell<Environment>,
}

impl PipCompileResolver {
    /// Create a resolver for the configured interpreter
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            environment: OnceCell::new(),
        }
    }

    /// Run the interpreter with arguments and capture the output
    async fn python(&self, args: &[&str]) -> ChaccResult<std::process::Output> {
        debug!("Executing: {} {:?}", self.config.python, args);

        Command::new(&self.config.python)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| self.spawn_error(args, e))
    }

    fn spawn_error(&self, args: &[&str], e: std::io::Error) -> ChaccError {
        if e.kind() == ErrorKind::NotFound {
            ChaccError::PythonNotFound(self.config.python.clone())
        } else {
            ChaccError::command_failed(format!("{} {:?}", self.config.python, args), e)
        }
    }

    async fn probe(&self) -> ChaccResult<Environment> {
        let output = self.python(&["-c", PROBE_SCRIPT]).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ChaccError::EnvironmentProbe(stderr.trim().to_string()));
        }

        let probe: InterpreterProbe = serde_json::from_slice(&output.stdout)
            .map_err(|e| ChaccError::EnvironmentProbe(format!("unexpected probe output: {}", e)))?;

        let output = self.python(&["-m", "piptools", "compile", "--version"]).await?;
        if !output.status.success() {
            return Err(ChaccError::PipToolsNotFound {
                python: self.config.python.clone(),
            });
        }
        let tool = String::from_utf8_lossy(&output.stdout).trim().to_string();

        let environment = Environment::new(
            format!("{} {}", probe.implementation, probe.version),
            format!(
                "{}-{} ({} {})",
                std::env::consts::OS,
                std::env::consts::ARCH,
                probe.platform,
                probe.machine
            ),
            tool,
        );
        debug!("Probed environment: {}", environment);
        Ok(environment)
    }

    fn compile_args(&self, mode: ResolveMode) -> Vec<String> {
        let mut args: Vec<String> = [
            "-m",
            "piptools",
            "compile",
            "--quiet",
            "--no-header",
            "--no-annotate",
            "--no-emit-index-url",
            "--output-file",
            "-",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        if mode == ResolveMode::Upgrade {
            args.push("--upgrade".to_string());
        }
        args.extend(self.config.extra_args.iter().cloned());
        args.push("-".to_string());
        args
    }
}

#[async_trait]
impl Resolver for PipCompileResolver {
    async fn environment(&self) -> ChaccResult<Environment> {
        self.environment
            .get_or_try_init(|| self.probe())
            .await
            .cloned()
    }

    async fn resolve(
        &self,
        module_name: &str,
        requirements: &str,
        mode: ResolveMode,
    ) -> ChaccResult<PackageMap> {
        let args = self.compile_args(mode);
        debug!("Resolving {}: {} {:?}", module_name, self.config.python, args);

        let mut child = Command::new(&self.config.python)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                self.spawn_error(&args, e)
            })?;

        // Feeding stdin counts toward the timeout; a child that stops reading must not hang us
        let exchange = async {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(requirements.as_bytes()).await.map_err(|e| {
                    ChaccError::io(format!("writing requirements for {}", module_name), e)
                })?;
            }
            child
                .wait_with_output()
                .await
                .map_err(|e| ChaccError::io(format!("waiting for pip-compile on {}", module_name), e))
        };

        let secs = self.config.timeout_secs;
        let output = tokio::time::timeout(Duration::from_secs(secs), exchange)
            .await
            .map_err(|_| ChaccError::ResolverTimeout {
                module: module_name.to_string(),
                secs,
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ChaccError::resolution(module_name, stderr.trim()));
        }

        parse_compiled(module_name, &String::from_utf8_lossy(&output.stdout))
    }

    fn name(&self) -> &'static str {
        "pip-tools"
    }
}

/// Parse pip-compile output into `name -> version spec`.
///
/// Comments, option lines, `--hash` continuations and environment markers
/// are dropped. Direct references keep their `@ url` as the spec. Editable
/// requirements (`-e`) have no pinnable version and fail the module.
pub fn parse_compiled(module_name: &str, output: &str) -> ChaccResult<PackageMap> {
    let mut packages = PackageMap::new();

    for raw in output.lines() {
        let line = match raw.find('#') {
            Some(0) => continue,
            Some(pos) if raw[..pos].ends_with(char::is_whitespace) => &raw[..pos],
            _ => raw,
        };
        let line = line.trim().trim_end_matches('\\').trim();

        if let Some(target) = line
            .strip_prefix("--editable")
            .or_else(|| line.strip_prefix("-e"))
        {
            return Err(ChaccError::resolution(
                module_name,
                format!(
                    "editable requirement {} cannot be cached, pin a released version instead",
                    target.trim_start_matches('=').trim()
                ),
            ));
        }
        if line.is_empty() || line.starts_with('-') {
            continue;
        }

        let line = line.split(';').next().unwrap_or_default().trim();
        let split = line
            .find(|c: char| matches!(c, '=' | '<' | '>' | '!' | '~' | '@') || c.is_whitespace())
            .unwrap_or(line.len());

        let name = line[..split].trim();
        if name.is_empty() {
            continue;
        }
        let spec = line[split..].trim().to_string();
        packages.insert(name.to_string(), spec);
    }

    Ok(packages)
}

//! pip subprocess wrapper
//!
//! Queries and mutates the package set of the configured interpreter by
//! running `python -m pip`.

use crate::error::{ChaccError, ChaccResult};
use crate::packages::canonicalize_name;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// A package with a newer release than the installed one
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutdatedPackage {
    /// Name as reported by pip
    pub name: String,

    /// Installed version
    pub version: String,

    /// Newest available version
    pub latest_version: String,
}

#[derive(Deserialize)]
struct ListedPackage {
    name: String,
}

/// pip runner bound to one interpreter
pub struct Pip {
    python: String,
}

impl Pip {
    /// Create a pip runner for the given interpreter
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    /// Execute `python -m pip <args>` and return the output
    async fn exec(&self, args: &[String]) -> ChaccResult<std::process::Output> {
        debug!("Executing: {} -m pip {:?}", self.python, args);

        Command::new(&self.python)
            .args(["-m", "pip"])
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ChaccError::command_failed(format!("{} -m pip {:?}", self.python, args), e))
    }

    /// Canonical names of all installed packages
    pub async fn installed(&self) -> ChaccResult<BTreeSet<String>> {
        let args = ["list".to_string(), "--format=json".to_string()];
        let output = self.exec(&args).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ChaccError::PackageQuery(stderr.trim().to_string()));
        }

        parse_installed(&String::from_utf8_lossy(&output.stdout))
    }

    /// Installed packages that have newer releases
    pub async fn outdated(&self) -> ChaccResult<Vec<OutdatedPackage>> {
        let args = [
            "list".to_string(),
            "--outdated".to_string(),
            "--format=json".to_string(),
        ];
        let output = self.exec(&args).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ChaccError::PackageQuery(stderr.trim().to_string()));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }

    /// Install the given packages (`name -> version spec`)
    pub async fn install(&self, packages: &BTreeMap<String, String>) -> ChaccResult<()> {
        if packages.is_empty() {
            debug!("Nothing to install");
            return Ok(());
        }

        let mut args = vec!["install".to_string()];
        args.extend(install_specs(packages));

        info!("Installing {} packages", packages.len());
        let output = self.exec(&args).await?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(ChaccError::Install(stderr.trim().to_string()))
        }
    }
}

/// Parse `pip list --format=json` into canonical names
fn parse_installed(json: &str) -> ChaccResult<BTreeSet<String>> {
    let listed: Vec<ListedPackage> = serde_json::from_str(json)?;
    Ok(listed
        .iter()
        .map(|p| canonicalize_name(&p.name))
        .collect())
}

/// Requirement specifiers (`name==1.0`) for pip install
fn install_specs(packages: &BTreeMap<String, String>) -> Vec<String> {
    packages
        .iter()
        .map(|(name, spec)| format!("{}{}", name, spec))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_installed_canonicalizes() {
        let json = r#"[{"name": "Flask_Cors", "version": "4.0.0"}, {"name": "requests", "version": "2.31.0"}]"#;
        let installed = parse_installed(json).unwrap();
        assert!(installed.contains("flask-cors"));
        assert!(installed.contains("requests"));
        assert_eq!(installed.len(), 2);
    }

    #[test]
    fn parse_installed_rejects_garbage() {
        assert!(parse_installed("not json").is_err());
    }

    #[test]
    fn outdated_deserializes() {
        let json = r#"[{"name": "requests", "version": "2.28.0", "latest_version": "2.31.0", "latest_filetype": "wheel"}]"#;
        let parsed: Vec<OutdatedPackage> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed[0].latest_version, "2.31.0");
    }

    #[test]
    fn install_specs_join_name_and_spec() {
        let mut packages = BTreeMap::new();
        packages.insert("requests".to_string(), "==2.31.0".to_string());
        packages.insert("idna".to_string(), "==3.6".to_string());
        assert_eq!(install_specs(&packages), vec!["idna==3.6", "requests==2.31.0"]);
    }
}

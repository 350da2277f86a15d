//! Integration tests for the cdm binary

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const SEEDED_CACHE: &str = r#"{
  "schema_version": 1,
  "requirements_caches": {
    "api": {
      "hash": "5f2b0c6e9a1d4b7c8e3f0a2d6c9b1e4f7a0d3c6b9e2f5a8d1c4b7e0f3a6d9c2b",
      "packages": {
        "idna": "==3.6",
        "requests": "==2.31.0"
      },
      "last_updated": "2026-01-05T10:00:00Z"
    },
    "worker": {
      "hash": "0a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f9",
      "packages": {
        "celery": "==5.3.6"
      },
      "last_updated": "2026-01-05T10:00:00Z"
    }
  },
  "combined_hash": "c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00",
  "environment_hash": "e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1",
  "resolved_packages": {
    "celery": "==5.3.6",
    "idna": "==3.6",
    "requests": "==2.31.0"
  },
  "last_updated": "2026-01-05T10:00:00Z"
}
"#;

    /// `cdm` isolated from the user's config and cache
    fn cdm(dir: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("cdm");
        cmd.env_remove("CHACC_CONFIG")
            .env_remove("CHACC_CACHE_DIR")
            .arg("--config")
            .arg(dir.join("config.toml"))
            .arg("--cache-dir")
            .arg(dir.join("cache"));
        cmd
    }

    fn seed_cache(dir: &Path) {
        fs::create_dir_all(dir.join("cache")).unwrap();
        fs::write(dir.join("cache/dependency_cache.json"), SEEDED_CACHE).unwrap();
    }

    fn cache_file(dir: &Path) -> String {
        fs::read_to_string(dir.join("cache/dependency_cache.json")).unwrap()
    }

    #[test]
    fn help_displays() {
        let dir = TempDir::new().unwrap();
        cdm(dir.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("dependency resolution cache"));
    }

    #[test]
    fn version_displays() {
        let dir = TempDir::new().unwrap();
        cdm(dir.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("cdm"));
    }

    #[test]
    fn cache_info_on_empty_cache() {
        let dir = TempDir::new().unwrap();
        cdm(dir.path())
            .args(["cache", "info"])
            .assert()
            .success()
            .stdout(predicate::str::contains("missing"))
            .stdout(predicate::str::contains("Modules:          0"));
    }

    #[test]
    fn cache_info_json_lists_modules() {
        let dir = TempDir::new().unwrap();
        seed_cache(dir.path());

        cdm(dir.path())
            .args(["cache", "info", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"module_count\": 2"))
            .stdout(predicate::str::contains("\"package_count\": 3"))
            .stdout(predicate::str::contains("\"worker\""));
    }

    #[test]
    fn cache_info_corrupt_cache_warns() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("cache")).unwrap();
        fs::write(dir.path().join("cache/dependency_cache.json"), "{ not json").unwrap();

        cdm(dir.path())
            .args(["cache", "info"])
            .assert()
            .success()
            .stdout(predicate::str::contains("corrupt"))
            .stderr(predicate::str::contains("will be rebuilt"));
    }

    #[test]
    fn cache_clear_resets_record() {
        let dir = TempDir::new().unwrap();
        seed_cache(dir.path());

        cdm(dir.path())
            .args(["cache", "clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cache cleared"));

        let record: serde_json::Value = serde_json::from_str(&cache_file(dir.path())).unwrap();
        assert_eq!(record["schema_version"], 1);
        assert!(record["requirements_caches"].as_object().unwrap().is_empty());
        assert!(record["combined_hash"].is_null());
    }

    #[test]
    fn cache_clear_module_keeps_others() {
        let dir = TempDir::new().unwrap();
        seed_cache(dir.path());

        cdm(dir.path())
            .args(["cache", "clear", "--module", "worker"])
            .assert()
            .success();

        let record: serde_json::Value = serde_json::from_str(&cache_file(dir.path())).unwrap();
        let caches = record["requirements_caches"].as_object().unwrap();
        assert!(caches.contains_key("api"));
        assert!(!caches.contains_key("worker"));
        assert!(record["resolved_packages"].get("celery").is_none());
        assert_eq!(record["resolved_packages"]["requests"], "==2.31.0");
    }

    #[test]
    fn cache_clear_unknown_module_is_noop() {
        let dir = TempDir::new().unwrap();
        seed_cache(dir.path());

        cdm(dir.path())
            .args(["cache", "clear", "--module", "nope"])
            .assert()
            .success()
            .stdout(predicate::str::contains("not cached"));

        assert_eq!(cache_file(dir.path()), SEEDED_CACHE);
    }

    #[test]
    fn check_without_cache() {
        let dir = TempDir::new().unwrap();
        cdm(dir.path())
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "No cached packages found. Run 'cdm install' first.",
            ));
    }

    #[test]
    fn outdated_without_cache() {
        let dir = TempDir::new().unwrap();
        cdm(dir.path())
            .arg("outdated")
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached packages found"));
    }

    #[test]
    fn resolve_with_nothing_to_discover() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("project");
        fs::create_dir_all(&project).unwrap();

        cdm(dir.path())
            .arg("resolve")
            .arg("--search-dirs")
            .arg(&project)
            .assert()
            .success()
            .stdout(predicate::str::contains("No requirement files found"));

        assert!(!dir.path().join("cache/dependency_cache.json").exists());
    }

    #[test]
    fn install_with_missing_interpreter_leaves_cache_untouched() {
        let dir = TempDir::new().unwrap();
        seed_cache(dir.path());
        fs::write(
            dir.path().join("config.toml"),
            "[resolver]\npython = \"/nonexistent/python-for-cdm-tests\"\n",
        )
        .unwrap();

        cdm(dir.path())
            .args(["install", "requests"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Python interpreter not found"))
            .stderr(predicate::str::contains("Hint:"));

        assert_eq!(cache_file(dir.path()), SEEDED_CACHE);
    }

    #[test]
    fn invalid_config_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "[resolver\n").unwrap();

        cdm(dir.path())
            .args(["cache", "info"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn config_path() {
        let dir = TempDir::new().unwrap();
        cdm(dir.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let dir = TempDir::new().unwrap();
        cdm(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[resolver]"))
            .stdout(predicate::str::contains("max_concurrency"));
    }

    #[test]
    fn config_init_creates_file() {
        let dir = TempDir::new().unwrap();
        cdm(dir.path())
            .args(["config", "init"])
            .assert()
            .success();

        assert!(dir.path().join("config.toml").exists());
    }
}

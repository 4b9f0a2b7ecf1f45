//! Option file and logging environment tests.

use super::unitrun;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn option_file(content: &str) -> Result<(TempDir, std::path::PathBuf), std::io::Error> {
    let dir = TempDir::new()?;
    let path = dir.path().join("unitrun.yaml");
    fs::write(&path, content)?;
    Ok((dir, path))
}

#[test]
fn test_config_file_sets_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, path) = option_file("output: junit\ntimes: true\n")?;
    unitrun()
        .env("UNITRUN_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<?xml"))
        .stdout(predicate::str::contains(" time=\""));
    Ok(())
}

#[test]
fn test_arguments_override_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, path) = option_file("output: junit\n")?;
    unitrun()
        .env("UNITRUN_CONFIG", &path)
        .args(["--output", "terminal", "-u"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("all tests pass: 15 tests\n"));
    Ok(())
}

#[test]
fn test_config_file_may_set_plugin_options() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, path) = option_file("tally-limit: 1\n")?;
    unitrun()
        .env("UNITRUN_CONFIG", &path)
        .arg("-u")
        .assert()
        .code(10);
    Ok(())
}

#[test]
fn test_config_file_unknown_option() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, path) = option_file("outptu: junit\n")?;
    unitrun()
        .env("UNITRUN_CONFIG", &path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("outptu"));
    Ok(())
}

#[test]
fn test_config_file_missing() {
    unitrun()
        .env("UNITRUN_CONFIG", "/nonexistent/unitrun.yaml")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("config error"));
}

#[test]
fn test_config_file_malformed() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, path) = option_file("output: [junit\n")?;
    unitrun()
        .env("UNITRUN_CONFIG", &path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("config error"));
    Ok(())
}

#[test]
fn test_log_filter_enables_diagnostics() {
    unitrun()
        .env("UNITRUN_LOG", "debug")
        .arg("-u")
        .assert()
        .success()
        .stderr(predicate::str::contains("test finished"))
        .stdout(predicate::str::contains("test finished").not());
}

#[test]
fn test_default_log_level_is_quiet() {
    unitrun()
        .arg("-u")
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

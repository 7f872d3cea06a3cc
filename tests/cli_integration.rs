use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn rusty_reaper() -> Command {
    Command::cargo_bin("rusty-reaper").unwrap()
}

fn workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("cache/a")).unwrap();
    fs::write(tmp.path().join("cache/a/blob"), "x".repeat(2048)).unwrap();
    tmp
}

#[test]
fn shows_help() {
    rusty_reaper()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("disposable directory trees"));
}

#[test]
fn shows_version() {
    rusty_reaper()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn requires_subcommand() {
    rusty_reaper()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn scan_subcommand_help() {
    rusty_reaper()
        .args(["scan", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Measure candidate directories"))
        .stdout(predicate::str::contains("--base"));
}

#[test]
fn delete_subcommand_help() {
    rusty_reaper()
        .args(["delete", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"));
}

#[test]
fn delete_without_paths_fails() {
    rusty_reaper().arg("delete").assert().failure();
}

#[test]
fn completions_for_bash() {
    rusty_reaper()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rusty-reaper"));
}

#[test]
fn verbose_flag_accepted() {
    let tmp = workspace();
    rusty_reaper()
        .args(["-vvv", "scan"])
        .arg(tmp.path().join("cache"))
        .assert()
        .success();
}

#[test]
fn invalid_config_path_fails() {
    rusty_reaper()
        .args(["--config", "/nonexistent/path.toml", "scan"])
        .assert()
        .failure();
}

#[test]
fn scan_prints_total() {
    let tmp = workspace();
    rusty_reaper()
        .arg("scan")
        .arg(tmp.path().join("cache"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 2.0 KB"));
}

#[test]
fn scan_with_json_output() {
    let tmp = workspace();
    rusty_reaper()
        .args(["scan", "--json"])
        .arg(tmp.path().join("cache"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("["));
}

#[test]
fn scan_empty_base_reports_nothing() {
    let tmp = TempDir::new().unwrap();
    rusty_reaper()
        .args(["scan", "--base"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No candidate directories found."));
}

#[test]
fn log_file_receives_logs() {
    let tmp = workspace();
    let log = tmp.path().join("reaper.log");

    rusty_reaper()
        .args(["-v", "--log-file"])
        .arg(&log)
        .arg("scan")
        .arg(tmp.path().join("cache"))
        .assert()
        .success();

    let content = fs::read_to_string(&log).unwrap();
    assert!(content.contains("Scan batch started"));
}

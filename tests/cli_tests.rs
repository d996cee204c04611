//! CLI binary tests.
//!
//! These run the built `restcycle` binary and check argument handling and the
//! behavior without a running daemon.

use assert_cmd::Command;
use predicates::prelude::*;

fn restcycle() -> Command {
    Command::cargo_bin("restcycle").unwrap()
}

// ============================================================================
// Help and Version
// ============================================================================

#[test]
fn test_help_lists_commands() {
    restcycle()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Activity-aware work/rest reminders"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("input"))
        .stdout(predicate::str::contains("stop"));
}

#[test]
fn test_version() {
    restcycle()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("restcycle "));
}

#[test]
fn test_no_command_prints_help() {
    restcycle()
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

// ============================================================================
// Completions
// ============================================================================

#[test]
fn test_bash_completions() {
    restcycle()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("restcycle"));
}

#[test]
fn test_unknown_shell_is_rejected() {
    restcycle()
        .args(["completions", "cmd"])
        .assert()
        .failure();
}

// ============================================================================
// Argument Validation
// ============================================================================

#[test]
fn test_run_rejects_zero_threshold() {
    restcycle()
        .args(["run", "--inactivity-threshold", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("greater than 0"));
}

#[test]
fn test_config_set_rejects_non_numeric_minutes() {
    restcycle()
        .args(["config", "set", "--work", "soon"])
        .assert()
        .failure();
}

// ============================================================================
// Without a Daemon
// ============================================================================

#[test]
fn test_status_without_daemon_fails() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("missing.sock");

    restcycle()
        .arg("status")
        .arg("--socket")
        .arg(&socket)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("restcycle run"));
}

#[test]
fn test_input_without_daemon_fails() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("missing.sock");

    restcycle()
        .args(["input", "--socket"])
        .arg(&socket)
        .assert()
        .failure()
        .code(1);
}

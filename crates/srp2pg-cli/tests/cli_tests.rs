//! CLI integration tests for srp2pg.
//!
//! These tests verify command-line argument parsing, help output,
//! and exit codes for error conditions that need no database.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

/// Get a command for the srp2pg binary.
fn cmd() -> Command {
    Command::cargo_bin("srp2pg").unwrap()
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_flags() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--table"))
        .stdout(predicate::str::contains("--include-data"))
        .stdout(predicate::str::contains("--data-only"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("srp2pg"));
}

#[test]
fn test_verbosity_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--verbosity"))
        .stdout(predicate::str::contains("[default: info]"));
}

#[test]
fn test_log_format_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("[default: text]"));
}

#[test]
fn test_misspelled_verbosity_is_rejected() {
    cmd()
        .args(["--verbosity", "debgu", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'debgu'"))
        .stderr(predicate::str::contains("possible values"));
}

#[test]
fn test_unknown_log_format_is_rejected() {
    cmd()
        .args(["--log-format", "yaml", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'yaml'"));
}

// =============================================================================
// Configuration Error Tests
// =============================================================================

#[test]
fn test_missing_config_file_fails() {
    cmd()
        .args(["--config", "/nonexistent/config.yaml", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_invalid_yaml_fails_with_config_exit_code() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "source: [not, a, mapping]").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "--dry-run"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_incomplete_config_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "source:\n  host: \"\"\n  database: SRP\n  user: u\n  password: p\n\
         target:\n  host: h\n  database: d\n  user: u\n  password: p"
    )
    .unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "--dry-run"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("source.host"));
}

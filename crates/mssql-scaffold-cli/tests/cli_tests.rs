//! CLI integration tests for mssql-scaffold.
//!
//! These tests verify command-line argument parsing, help output,
//! and exit codes for various error conditions.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

/// Get a command for the mssql-scaffold binary.
fn cmd() -> Command {
    Command::cargo_bin("mssql-scaffold").unwrap()
}

/// Write a config file pointing at a port nothing listens on.
fn unreachable_config(extra: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
source:
  host: 127.0.0.1
  port: 1
  database: app
  user: sa
  password: secret
  encrypt: false
{}"#,
        extra
    )
    .unwrap();
    file
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scaffold"))
        .stdout(predicate::str::contains("detect-schema"))
        .stdout(predicate::str::contains("inspect"));
}

#[test]
fn test_scaffold_subcommand_help() {
    cmd()
        .args(["scaffold", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--output"))
        .stdout(predicate::str::contains("--namespace"))
        .stdout(predicate::str::contains("--schema"))
        .stdout(predicate::str::contains("--tables"))
        .stdout(predicate::str::contains("--single-file"))
        .stdout(predicate::str::contains("--include-data"))
        .stdout(predicate::str::contains("--separate-seed-files"))
        .stdout(predicate::str::contains("--chunk-size"));
}

#[test]
fn test_inspect_subcommand_help() {
    cmd()
        .args(["inspect", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--schema"))
        .stdout(predicate::str::contains("--tables"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mssql-scaffold"));
}

// =============================================================================
// Global Flags Tests
// =============================================================================

#[test]
fn test_global_flags_exist() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-json"))
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("--verbosity"));
}

#[test]
fn test_config_default_path() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("[default: scaffold.yaml]"));
}

#[test]
fn test_no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

// =============================================================================
// Configuration Error Tests
// =============================================================================

#[test]
fn test_missing_config_exits_with_code_7() {
    cmd()
        .args(["-c", "/nonexistent/scaffold.yaml", "scaffold"])
        .assert()
        .code(7); // EXIT_IO_ERROR - file not found
}

#[test]
fn test_invalid_yaml_exits_with_code_1() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "source: [unclosed").unwrap();

    cmd()
        .args(["-c", file.path().to_str().unwrap(), "scaffold"])
        .assert()
        .code(1); // EXIT_CONFIG_ERROR
}

#[test]
fn test_empty_config_exits_with_code_1() {
    let file = tempfile::NamedTempFile::new().unwrap();

    cmd()
        .args(["-c", file.path().to_str().unwrap(), "scaffold"])
        .assert()
        .code(1); // EXIT_CONFIG_ERROR
}

#[test]
fn test_missing_required_fields_exits_with_code_1() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "source:\n  host: localhost\n  database: app").unwrap();

    cmd()
        .args(["-c", file.path().to_str().unwrap(), "scaffold"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("source.user"));
}

#[test]
fn test_unsupported_provider_exits_with_code_1() {
    let file = unreachable_config("");
    let mut contents = std::fs::read_to_string(file.path()).unwrap();
    contents = contents.replace("source:\n", "source:\n  provider: oracle\n");
    std::fs::write(file.path(), contents).unwrap();

    cmd()
        .args(["-c", file.path().to_str().unwrap(), "scaffold"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("oracle"));
}

#[test]
fn test_zero_chunk_size_override_exits_with_code_1() {
    let file = unreachable_config("");

    cmd()
        .args([
            "-c",
            file.path().to_str().unwrap(),
            "scaffold",
            "--chunk-size",
            "0",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("chunk_size"));
}

#[test]
fn test_unknown_log_format_exits_with_code_1() {
    let file = unreachable_config("");

    cmd()
        .args([
            "-c",
            file.path().to_str().unwrap(),
            "--log-format",
            "xml",
            "detect-schema",
        ])
        .assert()
        .code(1);
}

// =============================================================================
// Connection Behaviour Tests
// =============================================================================

#[test]
fn test_detect_schema_falls_back_to_dbo() {
    let file = unreachable_config("");

    cmd()
        .args(["-c", file.path().to_str().unwrap(), "detect-schema"])
        .assert()
        .success()
        .stdout(predicate::str::diff("dbo\n"));
}

#[test]
fn test_detect_schema_json_output() {
    let file = unreachable_config("");

    cmd()
        .args([
            "-c",
            file.path().to_str().unwrap(),
            "--output-json",
            "detect-schema",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"schema":"dbo"}"#));
}

#[test]
fn test_detect_schema_logs_fallback_at_warn() {
    let file = unreachable_config("");

    cmd()
        .env_remove("RUST_LOG")
        .args([
            "-c",
            file.path().to_str().unwrap(),
            "--verbosity",
            "warn",
            "detect-schema",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Default schema detection failed"));
}

#[test]
fn test_rust_log_overrides_verbosity() {
    let file = unreachable_config("");

    cmd()
        .env("RUST_LOG", "error")
        .args([
            "-c",
            file.path().to_str().unwrap(),
            "--verbosity",
            "debug",
            "detect-schema",
        ])
        .assert()
        .success()
        .stdout(predicate::str::diff("dbo\n"))
        .stderr(predicate::str::contains("Default schema detection failed").not());
}

#[test]
fn test_scaffold_unreachable_server_exits_with_code_2() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("Migrations");
    let file = unreachable_config("scaffold:\n  schema: dbo");

    cmd()
        .args([
            "-c",
            file.path().to_str().unwrap(),
            "scaffold",
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .code(2);

    assert!(!output.exists());
}

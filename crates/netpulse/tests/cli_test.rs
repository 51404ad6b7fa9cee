//! Integration tests for the `netpulse` binary.
//!
//! Argument parsing, inventory listing, config inspection and error exit
//! codes. Nothing here touches the network.
#![allow(clippy::unwrap_used)]

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// `netpulse` with the user's configuration and environment hidden.
fn netpulse_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("netpulse");
    cmd.env("HOME", "/tmp/netpulse-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/netpulse-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("NETPULSE_CONFIG")
        .env_remove("SNMP_COMMUNITY")
        .env_remove("INFLUXDB_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

const TWO_DEVICES: &str = r#"
[credentials]
community = "s3cret"

[credentials.overrides]
"Core" = "c0re"

[[devices]]
id = "core"
name = "Core"
endpoint = "10.0.0.1"
type = "router"

[[devices]]
id = "edge"
name = "Edge"
endpoint = "10.0.0.2:1161"
type = "firewall"
counter_width = 64
"#;

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = netpulse_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = String::from_utf8_lossy(&output.stderr);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    netpulse_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("run")
            .and(predicate::str::contains("poll"))
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("history")),
    );
}

#[test]
fn test_unknown_subcommand_fails() {
    netpulse_cmd().arg("frobnicate").assert().code(2);
}

// ── devices ─────────────────────────────────────────────────────────

#[test]
fn test_devices_lists_configured_inventory() {
    let file = config_file(TWO_DEVICES);
    netpulse_cmd()
        .args(["--config", file.path().to_str().unwrap(), "devices"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Core")
                .and(predicate::str::contains("10.0.0.2:1161"))
                .and(predicate::str::contains("64-bit"))
                .and(predicate::str::contains("override")),
        );
}

#[test]
fn test_devices_falls_back_to_demo_inventory() {
    let file = config_file("");
    let output = netpulse_cmd()
        .args(["--config", file.path().to_str().unwrap(), "devices", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let devices: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = devices
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Router-main", "Switch-3rdFloor"]);
}

// ── config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_masks_secrets() {
    let file = config_file(TWO_DEVICES);
    netpulse_cmd()
        .args(["--config", file.path().to_str().unwrap(), "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("s3cret").not().and(predicate::str::contains("c0re").not()));
}

#[test]
fn test_config_path_echoes_override() {
    netpulse_cmd()
        .args(["--config", "/etc/netpulse/custom.toml", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/etc/netpulse/custom.toml"));
}

// ── Errors ──────────────────────────────────────────────────────────

#[test]
fn test_missing_config_file_fails() {
    netpulse_cmd()
        .args(["--config", "/tmp/netpulse-cli-test-nonexistent/none.toml", "devices"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn test_duplicate_device_ids_are_usage_errors() {
    let file = config_file(
        "[[devices]]\nid = \"a\"\nname = \"A\"\nendpoint = \"10.0.0.1\"\n\
         [[devices]]\nid = \"a\"\nname = \"B\"\nendpoint = \"10.0.0.2\"\n",
    );
    netpulse_cmd()
        .args(["--config", file.path().to_str().unwrap(), "devices"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("duplicate device id"));
}

#[test]
fn test_history_without_token_is_auth_error() {
    let file = config_file("");
    netpulse_cmd()
        .args(["--config", file.path().to_str().unwrap(), "history", "10.0.0.1"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("InfluxDB"));
}

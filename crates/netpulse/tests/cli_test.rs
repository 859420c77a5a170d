//! Integration tests for the `netpulse` CLI binary.
//!
//! Parsing, help, completions, and error exits run without any server;
//! the device commands run against a wiremock server through `--url`.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `netpulse` binary with env isolation.
///
/// Clears all `NETPULSE_*` env vars and points config directories at
/// `home` so tests never touch the user's real configuration.
fn netpulse_cmd(home: &std::path::Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("netpulse");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("NETPULSE_SERVER")
        .env_remove("NETPULSE_URL")
        .env_remove("NETPULSE_OUTPUT")
        .env_remove("NETPULSE_INSECURE")
        .env_remove("NETPULSE_TIMEOUT")
        .env_remove("NETPULSE_DEFAULT_SERVER")
        .env_remove("RUST_LOG");
    cmd
}

fn isolated() -> (tempfile::TempDir, assert_cmd::Command) {
    let home = tempfile::tempdir().unwrap();
    let cmd = netpulse_cmd(home.path());
    (home, cmd)
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn device_json(id: i64, name: &str, ip: &str, status: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "ip_address": ip,
        "device_type": "switch",
        "status": status,
        "cpu_usage": 12.5,
        "memory_usage": 40.0,
        "uptime": 366_150,
        "snmp_community": "public",
        "snmp_version": "2c"
    })
}

async fn fleet_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            device_json(1, "core-sw", "10.0.0.1", "online"),
            device_json(2, "edge-rtr", "10.0.0.2", "warning"),
        ])))
        .mount(&server)
        .await;
    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let (_home, mut cmd) = isolated();
    let output = cmd.output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let (_home, mut cmd) = isolated();
    cmd.arg("--help").assert().success().stdout(
        predicate::str::contains("network devices")
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("stats")),
    );
}

#[test]
fn test_version_flag() {
    let (_home, mut cmd) = isolated();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("netpulse"));
}

#[test]
fn test_devices_subcommands_exist() {
    let (_home, mut cmd) = isolated();
    cmd.args(["devices", "--help"]).assert().success().stdout(
        predicate::str::contains("list")
            .and(predicate::str::contains("add"))
            .and(predicate::str::contains("update"))
            .and(predicate::str::contains("delete"))
            .and(predicate::str::contains("test"))
            .and(predicate::str::contains("metrics")),
    );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let (_home, mut cmd) = isolated();
    cmd.args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let (_home, mut cmd) = isolated();
    cmd.args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let (_home, mut cmd) = isolated();
    let output = cmd.arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_invalid_output_format() {
    let (_home, mut cmd) = isolated();
    let output = cmd
        .args(["--output", "invalid", "devices", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(
        text.contains("possible values") || text.contains("invalid"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_unknown_server_profile() {
    let (_home, mut cmd) = isolated();
    cmd.args(["--server", "lab", "devices", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("lab"));
}

#[test]
fn test_unreachable_server_exits_with_connection_code() {
    let (_home, mut cmd) = isolated();
    cmd.args(["--url", "http://127.0.0.1:9", "--timeout", "2", "devices", "list"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("127.0.0.1:9"));
}

#[test]
fn test_update_without_fields_is_a_usage_error() {
    let (_home, mut cmd) = isolated();
    cmd.args(["--url", "http://127.0.0.1:9", "devices", "update", "3"])
        .assert()
        .code(2);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_without_file() {
    let (_home, mut cmd) = isolated();
    cmd.args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default_server = \"local\""));
}

#[test]
fn test_config_set_then_servers_and_use() {
    let home = tempfile::tempdir().unwrap();

    netpulse_cmd(home.path())
        .args(["--server", "local", "config", "set", "timeout", "12"])
        .assert()
        .success();

    netpulse_cmd(home.path())
        .args(["config", "servers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("* local"));

    netpulse_cmd(home.path())
        .args(["config", "use", "nowhere"])
        .assert()
        .code(1);

    netpulse_cmd(home.path())
        .args(["config", "show", "--output", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"timeout\": 12"));
}

// ── Against a mock server ───────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_list_as_json() {
    let server = fleet_server().await;
    let home = tempfile::tempdir().unwrap();

    let output = netpulse_cmd(home.path())
        .args(["--url", &server.uri(), "-o", "json-compact", "devices", "list"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let devices: Value = serde_json::from_slice(&output.stdout).unwrap();
    let devices = devices.as_array().unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0]["name"], "core-sw");
    assert_eq!(devices[1]["status"], "warning");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stats_counts_the_pulled_fleet() {
    let server = fleet_server().await;
    let home = tempfile::tempdir().unwrap();

    netpulse_cmd(home.path())
        .args(["--url", &server.uri(), "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Total 2  Online 1  Offline 0  Warning 1",
        ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_device_test_prints_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/devices/2/test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "SNMP reachable",
            "system_name": "edge-rtr"
        })))
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();

    netpulse_cmd(home.path())
        .args(["--url", &server.uri(), "devices", "test", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SNMP reachable"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_requires_yes_when_not_interactive() {
    let server = fleet_server().await;
    Mock::given(method("DELETE"))
        .and(path("/api/devices/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(0)
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();

    netpulse_cmd(home.path())
        .args(["--url", &server.uri(), "devices", "delete", "1"])
        .write_stdin("")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_by_ip_with_yes() {
    let server = fleet_server().await;
    Mock::given(method("DELETE"))
        .and(path("/api/devices/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();

    netpulse_cmd(home.path())
        .args(["--url", &server.uri(), "--yes", "devices", "delete", "10.0.0.2"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Device deleted successfully"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_add_accepts_message_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/devices"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "message": "Device created" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([device_json(
            5, "lab-sw", "10.0.0.50", "online"
        )])))
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();

    netpulse_cmd(home.path())
        .args([
            "--url",
            &server.uri(),
            "-o",
            "plain",
            "devices",
            "add",
            "--name",
            "lab-sw",
            "--ip",
            "10.0.0.50",
            "--type",
            "switch",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("5"))
        .stderr(predicate::str::contains("Device lab-sw added successfully"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_add_rejection_shows_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/devices"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "duplicate IP" })),
        )
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();

    netpulse_cmd(home.path())
        .args([
            "--url",
            &server.uri(),
            "devices",
            "add",
            "--name",
            "lab-sw",
            "--ip",
            "10.0.0.50",
            "--type",
            "switch",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("duplicate IP"));
}

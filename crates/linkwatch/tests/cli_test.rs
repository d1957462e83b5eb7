//! Integration tests for the `linkwatch` CLI binary.
//!
//! Configuration is always passed explicitly so tests never touch the
//! user's real config directory; polling tests run against a mock agent.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

fn linkwatch_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("linkwatch");
    cmd.env("HOME", "/tmp/linkwatch-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/linkwatch-cli-test-nonexistent")
        .env_remove("LINKWATCH_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &Path, agent: &str) -> PathBuf {
    let path = dir.join("linkwatch.toml");
    std::fs::write(
        &path,
        format!(
            r#"
title = "Test map"
poll_interval_ms = 250
probe_timeout_ms = 2000

[[targets]]
id = "core1"
x = 100.0
y = 100.0
agent = "{agent}"

  [[targets.interfaces]]
  name = "xe-0"
  in_counter = "1.3.6.1.2.1.31.1.1.1.6.1"
  out_counter = "1.3.6.1.2.1.31.1.1.1.10.1"
  max_bandwidth = 1000000000

[[targets]]
id = "edge1"
x = 400.0
y = 100.0
agent = "{agent}"

  [[targets.interfaces]]
  name = "ge-1"
  in_counter = "1.3.6.1.2.1.31.1.1.1.6.2"
  out_counter = "1.3.6.1.2.1.31.1.1.1.10.2"

[[links]]
id = "core1-edge1"
from = "core1:xe-0"
to = "edge1:ge-1"
label = "1G"
"#
        ),
    )
    .unwrap();
    path
}

async fn mock_agent() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/counters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": {
                "1.3.6.1.2.1.31.1.1.1.6.1": 1000,
                "1.3.6.1.2.1.31.1.1.1.10.1": 2000,
                "1.3.6.1.2.1.31.1.1.1.6.2": 3000,
                "1.3.6.1.2.1.31.1.1.1.10.2": 4000
            }
        })))
        .mount(&server)
        .await;
    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = linkwatch_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    linkwatch_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("poll")
            .and(predicate::str::contains("export"))
            .and(predicate::str::contains("check")),
    );
}

#[test]
fn test_completions_bash() {
    linkwatch_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn test_missing_config_exit_code() {
    linkwatch_cmd()
        .args(["--config", "/tmp/linkwatch-cli-test-nonexistent/none.toml", "check"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("linkwatch init"));
}

#[test]
fn test_check_summarizes_targets() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "http://127.0.0.1:9");
    linkwatch_cmd()
        .arg("--config")
        .arg(&config)
        .arg("check")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("core1")
                .and(predicate::str::contains("xe-0 (1.0 Gbps)"))
                .and(predicate::str::contains("2 targets, 1 links")),
        );
}

#[test]
fn test_check_rejects_unresolved_link() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "http://127.0.0.1:9");
    let text = std::fs::read_to_string(&config).unwrap().replace("edge1:ge-1", "edge1:ge-9");
    std::fs::write(&config, text).unwrap();

    linkwatch_cmd()
        .arg("--config")
        .arg(&config)
        .arg("check")
        .assert()
        .code(3);
}

#[test]
fn test_topology_message() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "http://127.0.0.1:9");
    let output = linkwatch_cmd()
        .arg("--config")
        .arg(&config)
        .arg("topology")
        .output()
        .unwrap();
    assert!(output.status.success());

    let message: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(message["type"], "topology");
    assert_eq!(message["title"], "Test map");
    assert_eq!(message["pollIntervalMs"], 250);
    assert_eq!(message["links"][0]["from"], json!({ "router": "core1", "interface": "xe-0" }));
}

#[test]
fn test_init_refuses_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("new.toml");

    linkwatch_cmd().arg("init").arg(&path).assert().success();
    linkwatch_cmd().arg("--config").arg(&path).arg("check").assert().success();
    linkwatch_cmd().arg("init").arg(&path).assert().code(2);
    linkwatch_cmd().arg("init").arg(&path).arg("--force").assert().success();
}

// ── Polling ─────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_poll_prints_metrics_messages() {
    let server = mock_agent().await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());

    let output = tokio::task::spawn_blocking(move || {
        linkwatch_cmd()
            .arg("--config")
            .arg(&config)
            .args(["poll", "--cycles", "2", "-o", "json-compact"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1]["type"], "metrics");
    let core = &lines[1]["routers"]["core1"];
    assert_eq!(core["status"], "ok");
    // Counters did not move between cycles.
    assert_eq!(core["interfaces"]["xe-0"]["inBps"], 0.0);
    assert_eq!(core["interfaces"]["xe-0"]["fresh"], true);
    // edge1/ge-1 has no capacity: utilization is unknown, not huge.
    assert!(lines[1]["routers"]["edge1"]["interfaces"]["ge-1"]["inUtilization"].is_null());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_writes_svg() {
    let server = mock_agent().await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());
    let out = dir.path().join("maps");

    let out_arg = out.clone();
    let output = tokio::task::spawn_blocking(move || {
        linkwatch_cmd()
            .arg("--config")
            .arg(&config)
            .args(["export", "--cycles", "1", "--out"])
            .arg(&out_arg)
            .output()
            .unwrap()
    })
    .await
    .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let latest = std::fs::read_to_string(out.join("latest.svg")).unwrap();
    assert!(latest.starts_with("<svg"));
    assert!(latest.contains("Test map"));
}

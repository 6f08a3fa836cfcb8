//! Integration tests for the `ouman` CLI binary.
//!
//! Offline commands run without any device; device-bound commands talk to
//! a wiremock server standing in for the controller.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `ouman` binary with env isolation.
///
/// Clears all `OUMAN_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn ouman_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("ouman");
    cmd.env("HOME", "/tmp/ouman-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/ouman-cli-test-nonexistent")
        .env_remove("RUST_LOG")
        .env_remove("OUMAN_PROFILE")
        .env_remove("OUMAN_ADDRESS")
        .env_remove("OUMAN_USERNAME")
        .env_remove("OUMAN_PASSWORD")
        .env_remove("OUMAN_OUTPUT")
        .env_remove("OUMAN_TIMEOUT");
    cmd
}

/// `ouman_cmd` pointed at a mock device with credentials.
fn device_cmd(server: &MockServer) -> assert_cmd::Command {
    let mut cmd = ouman_cmd();
    cmd.env("OUMAN_USERNAME", "user")
        .env("OUMAN_PASSWORD", "secret")
        .args(["--address", &server.uri()]);
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

struct QueryContains(&'static str);

impl Match for QueryContains {
    fn matches(&self, request: &Request) -> bool {
        request.url.query().is_some_and(|q| q.contains(self.0))
    }
}

fn body(raw: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(raw)
}

/// Login, logout, and a detection probe reporting a bare L1 installation.
async fn mock_device() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/login"))
        .and(QueryContains("uid=user;pwd=secret;"))
        .respond_with(body("login?result=ok;\0"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/logout"))
        .respond_with(body("logout?result=ok;\0"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/request"))
        .and(QueryContains("S_140_85;S_261_111;S_295_111;"))
        .respond_with(body(
            "request?S_140_85=off;S_261_111=off;S_295_111=off;\0",
        ))
        .mount(&server)
        .await;

    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = ouman_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    ouman_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("values")
            .and(predicate::str::contains("set"))
            .and(predicate::str::contains("alarms"))
            .and(predicate::str::contains("OUMAN_PASSWORD").not()),
    );
}

#[test]
fn test_version_flag() {
    ouman_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ouman"));
}

// ── Offline commands ────────────────────────────────────────────────

#[test]
fn test_registries_plain() {
    ouman_cmd()
        .args(["registries", "-o", "plain"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("system")
                .and(predicate::str::contains("l1_with_room_sensor"))
                .and(predicate::str::contains("l2_with_room_sensor")),
        );
}

#[test]
fn test_endpoints_of_one_registry() {
    ouman_cmd()
        .args(["endpoints", "--registry", "l1_with_room_sensor", "-o", "json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"l1_room_temperature\"")
                .and(predicate::str::contains("S_102_85"))
                .and(predicate::str::contains("S_134_85").not()),
        );
}

#[test]
fn test_endpoints_unknown_registry() {
    let output = ouman_cmd()
        .args(["endpoints", "--registry", "l3"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("ouman registries"));
}

#[test]
fn test_values_without_config() {
    let output = ouman_cmd().arg("values").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(
        combined_output(&output).contains("No device configured"),
        "{}",
        combined_output(&output)
    );
}

#[test]
fn test_missing_credentials() {
    let output = ouman_cmd()
        .args(["--address", "127.0.0.1:9", "values"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

// ── Device commands ─────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_values_json() {
    let server = mock_device().await;

    Mock::given(method("GET"))
        .and(path("/request"))
        .and(QueryContains("S_227_85;"))
        .respond_with(body("request?S_227_85=-13.3;S_59_85=3;\0"))
        .with_priority(1)
        .mount(&server)
        .await;

    device_cmd(&server)
        .args(["values", "-o", "json-compact"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#""name":"outside_temperature","value":-13.3"#)
                .and(predicate::str::contains(r#""value":"normal_temperature""#)),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_set_confirms_value() {
    let server = mock_device().await;

    Mock::given(method("GET"))
        .and(path("/update"))
        .and(QueryContains("@_S_63_85=30;"))
        .respond_with(body("update?S_63_85=30;\0"))
        .expect(1)
        .mount(&server)
        .await;

    device_cmd(&server)
        .args(["set", "l1_curve_0_temperature", "30", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::diff("30\n"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_set_out_of_range_is_usage_error() {
    let server = mock_device().await;

    Mock::given(method("GET"))
        .and(path("/update"))
        .respond_with(body("update?S_63_85=120;\0"))
        .expect(0)
        .mount(&server)
        .await;

    let output = device_cmd(&server)
        .args(["set", "l1_curve_0_temperature", "120"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("out of bounds"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_set_unknown_endpoint() {
    let server = mock_device().await;

    let output = device_cmd(&server)
        .args(["set", "l2_operation_mode", "automatic"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wrong_password_exit_code() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(body("login?result=error;\0"))
        .mount(&server)
        .await;

    let output = device_cmd(&server).arg("alarms").output().unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_alarms_plain() {
    let server = mock_device().await;

    Mock::given(method("GET"))
        .and(path("/alarms"))
        .respond_with(body("alarms?alarm_1=Supply sensor fault;\0"))
        .mount(&server)
        .await;

    device_cmd(&server)
        .args(["alarms", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alarm_1=Supply sensor fault"));
}

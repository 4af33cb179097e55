//! Integration tests for the `casanet` CLI binary.
//!
//! Argument parsing, help output, completions and error exit codes run
//! without a hub; the rest talk to a wiremock hub.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `casanet` binary with env isolation.
///
/// Clears all `CASANET_*` env vars and points the config and data
/// directories at `home` so tests never touch the user's real files.
fn casanet_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("casanet");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("NO_COLOR", "1")
        .env_remove("CASANET_PROFILE")
        .env_remove("CASANET_HUB")
        .env_remove("CASANET_TOKEN")
        .env_remove("CASANET_OUTPUT")
        .env_remove("CASANET_INSECURE")
        .env_remove("CASANET_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary off the async runtime so a wiremock server can answer.
async fn run_blocking(home: PathBuf, args: Vec<String>) -> std::process::Output {
    tokio::task::spawn_blocking(move || casanet_cmd(&home).args(args).output().unwrap())
        .await
        .unwrap()
}

fn args(server: &MockServer, rest: &[&str]) -> Vec<String> {
    let mut all: Vec<String> = rest.iter().map(|s| (*s).to_owned()).collect();
    all.push("--hub".into());
    all.push(server.uri());
    all
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = casanet_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn help_lists_command_groups() {
    let home = tempfile::tempdir().unwrap();
    casanet_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("timings")
                .and(predicate::str::contains("minions"))
                .and(predicate::str::contains("bluetooth")),
        );
}

#[test]
fn version_flag() {
    let home = tempfile::tempdir().unwrap();
    casanet_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("casanet"));
}

#[test]
fn completions_for_zsh() {
    let home = tempfile::tempdir().unwrap();
    casanet_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("casanet"));
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    let home = tempfile::tempdir().unwrap();
    casanet_cmd(home.path())
        .arg("thermostats")
        .assert()
        .code(2);
}

#[test]
fn invalid_output_format_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    casanet_cmd(home.path())
        .args(["-o", "xml", "timings", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("xml"));
}

#[test]
fn create_requires_a_schedule() {
    let home = tempfile::tempdir().unwrap();
    casanet_cmd(home.path())
        .args(["timings", "create", "-m", "m1"])
        .assert()
        .code(2);
}

// ── Configuration errors ────────────────────────────────────────────

#[test]
fn missing_config_points_at_init() {
    let home = tempfile::tempdir().unwrap();
    casanet_cmd(home.path())
        .args(["timings", "list"])
        .assert()
        .code(2)
        .stderr(
            predicate::str::contains("No hub configured")
                .and(predicate::str::contains("casanet config init")),
        );
}

#[test]
fn unknown_profile_exits_not_found() {
    let home = tempfile::tempdir().unwrap();
    casanet_cmd(home.path())
        .args(["-p", "cabin", "minions", "list"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("cabin"));
}

#[test]
fn config_path_prints_a_toml_path() {
    let home = tempfile::tempdir().unwrap();
    casanet_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_show_masks_plaintext_tokens() {
    let home = tempfile::tempdir().unwrap();
    let path_out = casanet_cmd(home.path())
        .args(["config", "path"])
        .output()
        .unwrap();
    let config_file = PathBuf::from(String::from_utf8(path_out.stdout).unwrap().trim());
    std::fs::create_dir_all(config_file.parent().unwrap()).unwrap();
    std::fs::write(
        &config_file,
        "default_profile = \"home\"\n\n[profiles.home]\nhub = \"http://casanet.local\"\ntoken = \"very-secret\"\n",
    )
    .unwrap();

    casanet_cmd(home.path())
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("casanet.local")
                .and(predicate::str::contains("********"))
                .and(predicate::str::contains("very-secret").not()),
        );
}

#[test]
fn whoami_without_session_exits_auth() {
    let home = tempfile::tempdir().unwrap();
    casanet_cmd(home.path())
        .arg("whoami")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn unreachable_hub_exits_connection() {
    let home = tempfile::tempdir().unwrap();
    casanet_cmd(home.path())
        .args(["--hub", "http://127.0.0.1:1", "--timeout", "2", "minions", "list"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("Could not connect"));
}

// ── Against a hub ───────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn timings_list_prints_hub_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/API/timings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "timingId": "t1",
            "timingName": "Morning",
            "minionId": "m1",
            "isActive": true,
            "timingType": "dailyTimeTrigger",
            "timingProperties": {
                "dailyTimeTrigger": { "hour": 7, "minutes": 30, "days": ["monday"] }
            }
        }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/API/minions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let output = run_blocking(
        home.path().to_owned(),
        args(&server, &["timings", "list", "-o", "json-compact"]),
    )
    .await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let printed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(printed[0]["timingId"], "t1");
    assert_eq!(printed[0]["timingProperties"]["dailyTimeTrigger"]["hour"], 7);
}

#[tokio::test(flavor = "multi_thread")]
async fn minions_list_plain_prints_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/API/minions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "minionId": "m2",
                "name": "Kettle",
                "minionType": "switch",
                "minionStatus": { "switch": { "status": "on" } }
            },
            {
                "minionId": "m1",
                "name": "Amp",
                "minionType": "toggle",
                "minionStatus": { "toggle": { "status": "off" } }
            }
        ])))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let output = run_blocking(
        home.path().to_owned(),
        args(&server, &["minions", "list", "-o", "plain"]),
    )
    .await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8(output.stdout).unwrap();
    let ids: Vec<&str> = stdout.lines().collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"m1") && ids.contains(&"m2"));
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_session_exits_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/API/devices"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let output = run_blocking(home.path().to_owned(), args(&server, &["devices", "list"])).await;

    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_delete_reports_the_action() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/API/timings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "timingId": "t1",
            "minionId": "m1",
            "timingType": "once",
            "timingProperties": { "once": { "date": 1_760_000_000_000_i64 } }
        }])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/API/timings/t1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "disk full" })))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let output = run_blocking(
        home.path().to_owned(),
        args(&server, &["-y", "timings", "delete", "t1"]),
    )
    .await;

    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("Could not delete timing"), "{text}");
    assert!(text.contains("disk full"), "{text}");
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_without_yes_needs_a_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/API/timings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "timingId": "t1",
            "minionId": "m1",
            "timingType": "once",
            "timingProperties": { "once": { "date": 0 } }
        }])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let output = run_blocking(
        home.path().to_owned(),
        args(&server, &["timings", "delete", "t1"]),
    )
    .await;

    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
}

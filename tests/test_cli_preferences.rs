//! CLI contract tests for preference verbs, status, and log maintenance

mod helpers;

use assert_cmd::Command;
use helpers::TestProfile;
use predicates::prelude::*;

fn tortray(profile: &TestProfile) -> Command {
    let mut cmd = Command::cargo_bin("tortray").unwrap();
    cmd.arg("--config-dir").arg(profile.path());
    cmd
}

#[test]
fn test_set_bridge_persists_to_config() {
    let profile = TestProfile::new();
    tortray(&profile)
        .args(["set-bridge", "meek-azure"])
        .assert()
        .success()
        .stdout(predicate::str::contains("meek-azure"));

    assert_eq!(profile.read_config()["bridge"], "meek-azure");
}

#[test]
fn test_set_bridge_leaves_a_log_record() {
    let profile = TestProfile::new();
    tortray(&profile)
        .args(["set-bridge", "snowflake"])
        .assert()
        .success();

    assert!(profile
        .read_log()
        .contains("Bridge mode set to: snowflake"));
}

#[test]
fn test_set_bridge_rejects_unknown_mode() {
    let profile = TestProfile::new();
    tortray(&profile)
        .args(["set-bridge", "carrier-pigeon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_autostart_round_trip() {
    let profile = TestProfile::new();

    tortray(&profile)
        .args(["autostart", "on"])
        .assert()
        .success()
        .stdout(predicate::str::contains("enabled"));
    assert_eq!(profile.read_config()["run_on_launch"], true);

    tortray(&profile)
        .args(["autostart", "off"])
        .assert()
        .success()
        .stdout(predicate::str::contains("disabled"));
    assert_eq!(profile.read_config()["run_on_launch"], false);
}

#[test]
fn test_status_reports_preferences_and_closed_port() {
    let profile = TestProfile::new();
    // Learn a port that nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    profile.write_config(&format!(r#"{{"socks_port": {port}}}"#));

    tortray(&profile)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("bridge mode:   snowflake"))
        .stdout(predicate::str::contains("(unreachable)"))
        .stdout(predicate::str::contains("run on launch: off"));
}

#[test]
fn test_status_sees_a_listening_port() {
    let profile = TestProfile::new();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    profile.write_config(&format!(r#"{{"socks_port": {port}}}"#));

    tortray(&profile)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("(reachable)"));
}

#[test]
fn test_clear_logs_truncates_and_leaves_a_marker() {
    let profile = TestProfile::new();
    std::fs::write(profile.log_path(), "old line one\nold line two\n").unwrap();

    tortray(&profile).arg("clear-logs").assert().success();

    let log = profile.read_log();
    assert!(log.starts_with("Logs cleared: "));
    assert!(!log.contains("old line"));
    assert_eq!(log.lines().count(), 1);
}

//! Smoke tests to verify command wiring

use assert_cmd::Command;
use predicates::prelude::*;

fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[test]
fn test_serve_help() {
    let mut cmd = Command::cargo_bin("tether").unwrap();
    cmd.arg("serve").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Address to bind to"))
        .stdout(predicate::str::contains("--retry-limit"));
}

#[test]
fn test_check_help() {
    let mut cmd = Command::cargo_bin("tether").unwrap();
    cmd.arg("check").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--retry-interval"));
}

#[test]
fn test_check_unreachable_database_fails() {
    let mut cmd = Command::cargo_bin("tether").unwrap();
    let home = tempfile::tempdir().unwrap();
    cmd.env("HOME", home.path())
        .env_remove("DB_DSN")
        .arg("check")
        .arg("--host")
        .arg("127.0.0.1")
        .arg("--port")
        .arg(closed_port().to_string())
        .arg("--retry-limit")
        .arg("2")
        .arg("--retry-interval")
        .arg("0");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Database unavailable after 2 attempt(s)"));
}

#[test]
fn test_check_rejects_bad_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tether.toml");
    std::fs::write(&path, "[database.kwargs]\nno_such_option = 1\n").unwrap();

    let mut cmd = Command::cargo_bin("tether").unwrap();
    cmd.arg("check").arg("--config").arg(&path);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no_such_option"));
}

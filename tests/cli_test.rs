//! CLI smoke tests
//!
//! Runs the built binary with a throwaway config and checks the paths that
//! fail or succeed before any request leaves the process.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

use common::temp_config_file;

const CONFIG: &str = r#"
backend:
  url: "http://127.0.0.1:9"
  anon_key: "anon-key"
assistant:
  mode: polling
  poll_interval_ms: 1000
  max_poll_attempts: 60
"#;

fn marketa() -> Command {
    let mut cmd = Command::cargo_bin("marketa").expect("binary");
    cmd.env_remove("MARKETA_BACKEND_URL")
        .env_remove("MARKETA_ASSISTANT_MODE")
        .env_remove("MARKETA_STREAM_URL");
    cmd
}

#[test]
fn test_help_lists_commands() {
    marketa()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("waitlist"))
        .stdout(predicate::str::contains("campaigns"))
        .stdout(predicate::str::contains("assistant"));
}

#[test]
fn test_empty_waitlist_email_is_rejected() {
    let (_dir, path) = temp_config_file(CONFIG);

    marketa()
        .arg("--config")
        .arg(&path)
        .args(["waitlist", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please enter your email"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let (_dir, path) = temp_config_file(
        r#"
backend:
  url: "ftp://example.com"
"#,
    );

    marketa()
        .arg("--config")
        .arg(&path)
        .args(["waitlist", "ada@example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("backend.url must start with"));
}

/// Without a cached session the dashboard commands stop at the gate; with
/// one, the unreachable backend fails them instead.
#[test]
fn test_campaign_list_fails_without_backend_session() {
    let (_dir, path) = temp_config_file(CONFIG);

    marketa()
        .arg("--config")
        .arg(&path)
        .args(["campaigns", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

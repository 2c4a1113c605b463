//! End-to-end tests of the `pdfsync` binary

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

fn pdfsync() -> Command {
    let mut cmd = Command::cargo_bin("pdfsync").unwrap();
    cmd.env_remove("PDFSYNC_FOLDER_ID")
        .env_remove("PDFSYNC_CLIENT_ID")
        .env_remove("PDFSYNC_CLIENT_SECRET")
        .env_remove("PDFSYNC_CREDENTIALS")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_stage_command_moves_files() {
    let ws = common::workspace();
    common::write_files(&ws.source, &["a.pdf", "b.txt"]);

    pdfsync()
        .arg("stage")
        .arg(&ws.source)
        .arg(&ws.destination)
        .assert()
        .success()
        .stdout(predicate::str::contains("moved: a.pdf"));

    assert_eq!(common::entry_names(&ws.destination), vec!["a.pdf"]);
    assert_eq!(common::entry_names(&ws.source), vec!["b.txt"]);
}

#[test]
fn test_stage_json_output() {
    let ws = common::workspace();
    common::write_files(&ws.source, &["a.pdf"]);

    let output = pdfsync()
        .args(["stage", "--json"])
        .arg(&ws.source)
        .arg(&ws.destination)
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["moved"], serde_json::json!(["a.pdf"]));
    assert_eq!(report["failed"], serde_json::json!([]));
}

#[test]
fn test_stage_dry_run_leaves_files() {
    let ws = common::workspace();
    common::write_files(&ws.source, &["a.pdf"]);

    pdfsync()
        .args(["stage", "--dry-run"])
        .arg(&ws.source)
        .arg(&ws.destination)
        .assert()
        .success();

    assert_eq!(common::entry_names(&ws.source), vec!["a.pdf"]);
    assert!(!ws.destination.exists());
}

#[test]
fn test_stage_missing_source_exits_with_failure() {
    let ws = common::workspace();

    pdfsync()
        .arg("stage")
        .arg(ws.temp.path().join("missing"))
        .arg(&ws.destination)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Directory not found"));
}

#[test]
fn test_publish_without_pdfs_needs_no_credentials() {
    let ws = common::workspace();
    common::write_files(&ws.source, &["notes.txt"]);

    pdfsync()
        .arg("publish")
        .arg(&ws.source)
        .arg("--credentials")
        .arg(ws.temp.path().join("creds.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to upload"));

    assert!(!ws.temp.path().join("creds.json").exists());
}

#[test]
fn test_publish_without_client_id_is_auth_failure() {
    let ws = common::workspace();
    common::write_files(&ws.source, &["a.pdf"]);

    pdfsync()
        .arg("publish")
        .arg(&ws.source)
        .arg("--credentials")
        .arg(ws.temp.path().join("creds.json"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Authentication failed"))
        .stderr(predicate::str::contains("Authentication failed: Authentication failed").not());

    assert_eq!(common::entry_names(&ws.source), vec!["a.pdf"]);
}

#[test]
fn test_publish_dry_run_lists_files_without_authenticating() {
    let ws = common::workspace();
    common::write_files(&ws.source, &["a.pdf", "b.pdf", "notes.txt"]);

    pdfsync()
        .args(["publish", "--dry-run"])
        .arg(&ws.source)
        .arg("--credentials")
        .arg(ws.temp.path().join("creds.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("would upload: a.pdf"))
        .stdout(predicate::str::contains("would upload: b.pdf"))
        .stdout(predicate::str::contains("notes.txt").not())
        .stderr(predicate::str::contains("Authentication failed").not());

    assert!(!ws.temp.path().join("creds.json").exists());
}

#[test]
fn test_publish_dry_run_json_output() {
    let ws = common::workspace();
    common::write_files(&ws.source, &["a.pdf"]);

    let output = pdfsync()
        .args(["publish", "--dry-run", "--json"])
        .arg(&ws.source)
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["would_upload"], serde_json::json!(["a.pdf"]));
}

#[test]
fn test_run_skips_upload_when_destination_empty() {
    let ws = common::workspace();
    common::write_files(&ws.source, &["notes.txt"]);

    pdfsync()
        .arg("run")
        .arg(&ws.source)
        .arg(&ws.destination)
        .arg("--credentials")
        .arg(ws.temp.path().join("creds.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No files found in"));

    assert!(ws.destination.is_dir());
}

#[test]
fn test_quiet_and_verbose_rejected() {
    pdfsync()
        .args(["-q", "-v", "stage", "a", "b"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--quiet"));
}

//! Corruption recovery tests for the pushup binary.
//!
//! These tests verify the CLI survives:
//! - Corrupted state files
//! - Individual bad history entries
//! - Missing data directories

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("pushup"))
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_corrupted_state_file() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("state.json"), "{ invalid json }}}}")
        .expect("Failed to write corrupted state");

    cli()
        .arg("status")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 / 50"));

    // A new session overwrites the corrupt file with a valid snapshot
    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .write_stdin("+\nf\n")
        .assert()
        .success();

    let content = fs::read_to_string(data_dir.join("state.json")).unwrap();
    let state: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(state["stats"]["total_reps"], 1);

    // The unreadable snapshot is kept aside
    let backup = fs::read_to_string(data_dir.join("state.json.corrupt")).unwrap();
    assert_eq!(backup, "{ invalid json }}}}");
}

#[test]
fn test_bad_history_entries_skipped() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let state = r#"{
        "version": 1,
        "stats": { "total_reps": 12, "personal_best": 12, "sessions_completed": 1 },
        "session_history": [
            { "id": "9b2f6c1e-4d1a-4c5e-8f3a-2a1b3c4d5e6f", "count": 12,
              "completed_at": "2026-01-05T08:00:00Z", "duration_seconds": 30.0 },
            { "id": "garbage", "count": "twelve" },
            { "id": "0c6f7a1e-0000-4c5e-8f3a-2a1b3c4d5e6f", "count": 0,
              "completed_at": "2026-01-04T08:00:00Z", "duration_seconds": 5.0 }
        ]
    }"#;
    fs::write(data_dir.join("state.json"), state).unwrap();

    cli()
        .arg("history")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("9b2f6c1e-4d1a-4c5e-8f3a-2a1b3c4d5e6f"))
        .stdout(predicate::str::contains("0c6f7a1e").not());
}

#[test]
fn test_missing_data_dir_is_created_on_save() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("nested/pushup");

    cli()
        .arg("history")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions yet."));

    cli()
        .arg("--data-dir")
        .arg(&data_dir)
        .write_stdin("+\n+\nf\n")
        .assert()
        .success();

    assert!(data_dir.join("state.json").exists());
}

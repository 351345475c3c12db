//! Integration tests for the pushup binary.
//!
//! These tests drive the CLI end to end:
//! - Piped interactive sessions
//! - History, status and achievements listings
//! - Settings, timer mode and countdown changes
//! - CSV export and session deletion

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("pushup"))
}

fn read_state(data_dir: &Path) -> serde_json::Value {
    let content = fs::read_to_string(data_dir.join("state.json")).expect("Failed to read state");
    serde_json::from_str(&content).expect("State is not valid JSON")
}

/// Count three reps and finish the session
fn log_three_reps(data_dir: &Path) {
    cli()
        .arg("session")
        .arg("--data-dir")
        .arg(data_dir)
        .write_stdin("+\n+\n+\nf\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Session saved: 3 push-ups"));
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Push-up counter"));
}

#[test]
fn test_session_persists_history_and_stats() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    log_three_reps(data_dir);

    let state = read_state(data_dir);
    assert_eq!(state["stats"]["total_reps"], 3);
    assert_eq!(state["stats"]["today_total"], 3);
    assert_eq!(state["stats"]["personal_best"], 3);
    assert_eq!(state["stats"]["sessions_completed"], 1);
    assert_eq!(state["session_history"].as_array().unwrap().len(), 1);
    assert_eq!(state["session_history"][0]["count"], 3);
}

#[test]
fn test_default_command_is_session() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("--data-dir")
        .arg(temp_dir.path())
        .write_stdin("+5\nf\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Session saved: 5 push-ups"));
}

#[test]
fn test_decrement_and_unknown_input() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("--data-dir")
        .arg(temp_dir.path())
        .write_stdin("+\n+\n-\nxyz\nf\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Unknown input 'xyz'"))
        .stdout(predicate::str::contains("Session saved: 1 push-ups"));
}

#[test]
fn test_finish_with_zero_reps_saves_nothing() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .write_stdin("f\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to save yet"));

    cli()
        .arg("history")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions yet."));
}

#[test]
fn test_unfinished_set_is_not_saved() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .write_stdin("+\n+\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Unfinished set of 2 reps"));

    let state = read_state(data_dir);
    assert_eq!(state["stats"]["total_reps"], 2);
    assert!(state["session_history"].as_array().unwrap().is_empty());
}

#[test]
fn test_milestone_and_achievement_announced() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("--data-dir")
        .arg(temp_dir.path())
        .write_stdin("+9\n+\nf\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Milestone: 10 push-ups!"))
        .stdout(predicate::str::contains("Achievement unlocked: Getting Started"));
}

#[test]
fn test_history_lists_sessions() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    log_three_reps(data_dir);
    let id = read_state(data_dir)["session_history"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    cli()
        .arg("history")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 push-ups"))
        .stdout(predicate::str::contains(id));
}

#[test]
fn test_status_shows_today_and_best() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    log_three_reps(data_dir);

    cli()
        .arg("status")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 / 50"))
        .stdout(predicate::str::contains("Personal best: 3"));
}

#[test]
fn test_achievements_listing() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .arg("achievements")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Achievements: 0 / 15"))
        .stdout(predicate::str::contains("First Step"));
}

#[test]
fn test_delete_session() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    log_three_reps(data_dir);
    let id = read_state(data_dir)["session_history"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    cli()
        .arg("delete")
        .arg(&id)
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted session"));

    let state = read_state(data_dir);
    assert!(state["session_history"].as_array().unwrap().is_empty());
    // Aggregates survive deletion
    assert_eq!(state["stats"]["total_reps"], 3);

    cli()
        .arg("delete")
        .arg(&id)
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("No session with id"));
}

#[test]
fn test_delete_rejects_bad_id() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("delete")
        .arg("not-a-uuid")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .failure();
}

#[test]
fn test_export_csv() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    let csv_path = data_dir.join("out/history.csv");

    log_three_reps(data_dir);

    cli()
        .arg("export")
        .arg(&csv_path)
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 sessions"));

    let csv = fs::read_to_string(&csv_path).expect("Failed to read CSV");
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("id,count,completed_at,duration_seconds,duration")
    );
    assert!(lines.next().unwrap().contains(",3,"));
    assert!(lines.next().is_none());
}

#[test]
fn test_settings_update() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .arg("settings")
        .arg("--goal")
        .arg("20")
        .arg("--sound")
        .arg("off")
        .arg("--rest-duration")
        .arg("45")
        .arg("--reminder")
        .arg("07:30")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Daily reminder at 07:30"));

    let state = read_state(data_dir);
    assert_eq!(state["settings"]["daily_goal"], 20);
    assert_eq!(state["settings"]["sound_enabled"], false);
    assert_eq!(state["settings"]["rest_duration_secs"], 45);
    assert_eq!(state["settings"]["daily_reminders_enabled"], true);

    cli()
        .arg("settings")
        .arg("--reminder")
        .arg("off")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Daily reminder off"));
}

#[test]
fn test_notification_toggles_silence_session_output() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .arg("settings")
        .arg("--goal")
        .arg("5")
        .arg("--milestones")
        .arg("off")
        .arg("--goal-alerts")
        .arg("off")
        .arg("--streak-reminders")
        .arg("off")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Milestones:     off"));

    let state = read_state(data_dir);
    assert_eq!(state["settings"]["milestone_notifications"], false);
    assert_eq!(state["settings"]["goal_notifications"], false);
    assert_eq!(state["settings"]["streak_reminders"], false);

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .write_stdin("+10
f
")
        .assert()
        .success()
        .stdout(predicate::str::contains("Milestone:").not())
        .stdout(predicate::str::contains("Daily goal of").not());

    assert_eq!(read_state(data_dir)["stats"]["goal_achieved_today"], true);
}

#[test]
fn test_settings_rejects_bad_reminder() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("settings")
        .arg("--reminder")
        .arg("25:99")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .failure();
}

#[test]
fn test_mode_and_countdown() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .arg("mode")
        .arg("counter")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Timer mode: countdown"));

    cli()
        .arg("countdown")
        .arg("--minutes")
        .arg("2")
        .arg("--seconds")
        .arg("75")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Countdown set to 2:59"));

    let state = read_state(data_dir);
    assert_eq!(state["timer_mode"], "counter");
    assert_eq!(state["countdown"]["minutes"], 2);
    assert_eq!(state["countdown"]["seconds"], 59);
}

#[test]
fn test_reset_all_requires_confirmation() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    log_three_reps(data_dir);

    cli()
        .arg("reset-all")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .failure();
    assert_eq!(read_state(data_dir)["stats"]["total_reps"], 3);

    cli()
        .arg("reset-all")
        .arg("--yes")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();

    let state = read_state(data_dir);
    assert_eq!(state["stats"]["total_reps"], 0);
    assert!(state["session_history"].as_array().unwrap().is_empty());
}

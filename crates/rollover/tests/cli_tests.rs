//! Integration tests for the rollover CLI.
//!
//! These tests run the built binary inside temporary directories.

use rstest::{fixture, rstest};
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_rollover_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rollover"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute rollover")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "rollover failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

// ============================================================================
// Test Fixtures
// ============================================================================

#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

#[fixture]
fn initialized_dir() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp directory");
    let output = run_rollover_in_dir(temp.path(), &["init", "--milestone", "14 KW 23", "--quiet"]);
    assert_success(&output);
    temp
}

fn edit(dir: &Path, extra: &str) -> Output {
    run_rollover_in_dir(
        dir,
        &[
            "edit",
            "--total-tickets",
            "6",
            "--closed-tickets",
            "3",
            "--total-hours",
            "40",
            "--closed-hours",
            "18",
            "--extra-hours-closed",
            extra,
        ],
    )
}

// ============================================================================
// Init
// ============================================================================

#[rstest]
fn init_creates_repository(temp_dir: TempDir) {
    let output = run_rollover_in_dir(temp_dir.path(), &["init"]);
    assert_success(&output);
    assert!(stdout(&output).contains("Initialized rollover"));

    let dir = temp_dir.path().join(".rollover");
    assert!(dir.join("config.yaml").is_file());
    assert!(dir.join("cycle.json").is_file());
    assert!(dir.join("history.jsonl").is_file());
}

#[rstest]
fn init_twice_fails(initialized_dir: TempDir) {
    let output = run_rollover_in_dir(initialized_dir.path(), &["init"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("already initialized"));
}

#[rstest]
fn commands_outside_repository_fail(temp_dir: TempDir) {
    let output = run_rollover_in_dir(temp_dir.path(), &["status"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("rollover init"));
}

// ============================================================================
// Status and edit
// ============================================================================

#[rstest]
fn status_json_lists_steps(initialized_dir: TempDir) {
    let output = run_rollover_in_dir(initialized_dir.path(), &["status", "--json"]);
    assert_success(&output);

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["record"]["milestoneName"], "14 KW 23");
    assert_eq!(value["steps"][0]["step"], "end-cycle");
    assert_eq!(value["steps"][0]["status"], "available");
    assert_eq!(value["steps"][1]["status"], "locked");
}

#[rstest]
#[case::tickets_only("0", false)]
#[case::extra_hours("2.5", true)]
fn edit_raises_flags(initialized_dir: TempDir, #[case] extra: &str, #[case] survivors: bool) {
    assert_success(&edit(initialized_dir.path(), extra));

    let output = run_rollover_in_dir(initialized_dir.path(), &["status", "--json"]);
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["record"]["ended"], true);
    assert_eq!(value["record"]["survivorsSet"], survivors);
}

#[rstest]
fn edit_rejects_negative_hours(initialized_dir: TempDir) {
    let output = run_rollover_in_dir(
        initialized_dir.path(),
        &[
            "edit",
            "--total-tickets",
            "1",
            "--closed-tickets",
            "1",
            "--total-hours=-4",
            "--closed-hours",
            "1",
        ],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid edit"));
}

#[rstest]
fn reset_clears_flags_and_keeps_milestone(initialized_dir: TempDir) {
    assert_success(&edit(initialized_dir.path(), "0"));
    assert_success(&run_rollover_in_dir(initialized_dir.path(), &["reset"]));

    let output = run_rollover_in_dir(initialized_dir.path(), &["status", "--json"]);
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["record"]["ended"], false);
    assert_eq!(value["record"]["milestoneName"], "14 KW 23");
}

#[rstest]
fn summary_is_locked_before_prepare(initialized_dir: TempDir) {
    let output = run_rollover_in_dir(initialized_dir.path(), &["summary"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Cannot run"));
}

// ============================================================================
// History, export and import
// ============================================================================

#[rstest]
fn empty_history(initialized_dir: TempDir) {
    let output = run_rollover_in_dir(initialized_dir.path(), &["history"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "No archived cycles.\n");
}

#[rstest]
fn forget_unknown_entry_fails(initialized_dir: TempDir) {
    let output = run_rollover_in_dir(initialized_dir.path(), &["forget", "cycle-missing"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cycle-missing"));
}

#[rstest]
fn export_then_replace_import(initialized_dir: TempDir, temp_dir: TempDir) {
    assert_success(&edit(initialized_dir.path(), "0"));
    let blob_path = temp_dir.path().join("blob.txt");
    let blob_arg = blob_path.to_str().unwrap();
    assert_success(&run_rollover_in_dir(
        initialized_dir.path(),
        &["export", "--output", blob_arg],
    ));

    let target = TempDir::new().unwrap();
    assert_success(&run_rollover_in_dir(target.path(), &["init", "--quiet"]));
    let output = run_rollover_in_dir(
        target.path(),
        &["import", blob_arg, "--strategy", "replace"],
    );
    assert_success(&output);
    assert!(stdout(&output).contains("Import complete"));

    let source_status = run_rollover_in_dir(initialized_dir.path(), &["status", "--json"]);
    let target_status = run_rollover_in_dir(target.path(), &["status", "--json"]);
    assert_eq!(stdout(&source_status), stdout(&target_status));
}

#[rstest]
fn import_rejects_garbage(initialized_dir: TempDir) {
    let blob_path = initialized_dir.path().join("garbage.txt");
    std::fs::write(&blob_path, "not a blob at all").unwrap();

    let output = run_rollover_in_dir(
        initialized_dir.path(),
        &["import", blob_path.to_str().unwrap(), "--strategy", "merge"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Malformed import"));
}

//! Integration tests for the `boxsched` CLI binary.
//!
//! These tests drive the expand, overlaps, check-slots and link subcommands
//! through the real binary with `assert_cmd`, covering stdin/stdout piping,
//! file I/O, exit codes and configuration overrides.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

fn schedules_json_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/schedules.json")
}

fn slots_json_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/slots.json")
}

/// A `boxsched` command isolated from the caller's configuration.
fn boxsched() -> Command {
    let mut cmd = Command::cargo_bin("boxsched").unwrap();
    cmd.env_remove("BOXSCHED_CLEANUP_MINUTES")
        .env_remove("BOXSCHED_LINK_OFFSET_MINUTES")
        .env_remove("BOXSCHED_MAX_RANGE_DAYS")
        .env_remove("RUST_LOG");
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Expand subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn expand_weekly_rule_from_stdin() {
    let input = r#"{"rule":{"type":"weekly","dayOfWeek":[1,2]},"range":{"from":"2022-02-01","to":"2022-02-20"}}"#;

    let output = boxsched()
        .arg("expand")
        .write_stdin(input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let dates: Vec<String> = serde_json::from_slice(&output).unwrap();
    assert_eq!(
        dates,
        ["2022-02-01", "2022-02-07", "2022-02-08", "2022-02-14", "2022-02-15"]
    );
}

#[test]
fn expand_without_rule_lists_every_day() {
    let input = r#"{"range":{"from":"2024-02-28","to":"2024-03-01"}}"#;

    let output = boxsched()
        .arg("expand")
        .write_stdin(input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let dates: Vec<String> = serde_json::from_slice(&output).unwrap();
    assert_eq!(dates, ["2024-02-28", "2024-02-29", "2024-03-01"]);
}

#[test]
fn expand_writes_output_file() {
    let dir = std::env::temp_dir().join("boxsched_cli_test_expand");
    std::fs::create_dir_all(&dir).unwrap();
    let out_path = dir.join("dates.json");
    let input = r#"{"rule":{"type":"monthly","dayOfMonth":[31]},"range":{"from":"2023-01-01","to":"2023-03-31"}}"#;

    boxsched()
        .args(["expand", "-o", out_path.to_str().unwrap()])
        .write_stdin(input)
        .assert()
        .success();

    let written = std::fs::read_to_string(&out_path).unwrap();
    let dates: Vec<String> = serde_json::from_str(&written).unwrap();
    assert_eq!(dates, ["2023-01-31", "2023-02-28", "2023-03-31"]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn expand_rejects_invalid_rule() {
    let input = r#"{"rule":{"type":"weekly","dayOfWeek":[9]},"range":{"from":"2022-02-01","to":"2022-02-20"}}"#;

    boxsched()
        .arg("expand")
        .write_stdin(input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid recurrence rule"))
        .stderr(predicate::str::contains("dayOfWeek"));
}

#[test]
fn expand_rejects_reversed_range() {
    let input = r#"{"range":{"from":"2022-02-20","to":"2022-02-01"}}"#;

    boxsched()
        .arg("expand")
        .write_stdin(input)
        .assert()
        .failure();
}

#[test]
fn expand_enforces_configured_range_limit() {
    let input = r#"{"range":{"from":"2022-02-01","to":"2022-02-10"}}"#;

    boxsched()
        .arg("expand")
        .env("BOXSCHED_MAX_RANGE_DAYS", "5")
        .write_stdin(input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("more than the limit of 5"));
}

#[test]
fn invalid_configuration_fails_fast() {
    boxsched()
        .arg("expand")
        .env("BOXSCHED_CLEANUP_MINUTES", "ten")
        .write_stdin(r#"{"range":{"from":"2022-02-01","to":"2022-02-01"}}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("BOXSCHED_CLEANUP_MINUTES"));
}

#[test]
fn expand_invalid_json_fails() {
    boxsched()
        .arg("expand")
        .write_stdin("{not json}")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse input JSON"));
}

#[test]
fn expand_nonexistent_input_file_fails() {
    boxsched()
        .args(["expand", "-i", "/nonexistent/path/rule.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Overlaps subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn overlaps_reports_same_venue_dates() {
    let output = boxsched()
        .args(["overlaps", "-i", schedules_json_path()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let overlaps: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(
        overlaps,
        serde_json::json!([{ "scheduleId": 2, "conflictingDates": ["2022-02-07"] }])
    );
}

#[test]
fn overlaps_without_others_is_empty() {
    let input = r#"{"schedule":{"id":1,"venueId":5,"rule":null,"range":{"from":"2022-02-01","to":"2022-02-07"}}}"#;

    boxsched()
        .arg("overlaps")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Check-slots subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn check_slots_exits_nonzero_on_persisted_conflict() {
    // Candidate 0 ends at 11:00 and slot 7 starts at 11:05, inside the 10 minute default.
    let output = boxsched()
        .args(["check-slots", "-i", slots_json_path()])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["internal"], serde_json::json!([]));
    assert_eq!(report["persisted"][0]["requestIndex"], 0);
    assert_eq!(report["persisted"][0]["conflicts"][0]["id"], 7);
}

#[test]
fn cleanup_flag_overrides_default_buffer() {
    boxsched()
        .args(["check-slots", "-i", slots_json_path(), "--cleanup-minutes", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""persisted": []"#));
}

#[test]
fn cleanup_env_var_is_honored() {
    boxsched()
        .args(["check-slots", "-i", slots_json_path()])
        .env("BOXSCHED_CLEANUP_MINUTES", "5")
        .assert()
        .success();
}

#[test]
fn check_slots_detects_collisions_within_batch() {
    let input = r#"{
        "candidates": [
            {"boxId": 3, "scheduleId": 1, "start": "10:30:00", "durationMinutes": 30},
            {"boxId": 3, "scheduleId": 1, "start": "10:00:00", "durationMinutes": 30}
        ]
    }"#;

    let output = boxsched()
        .arg("check-slots")
        .write_stdin(input)
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let internal = &report["internal"][0];
    assert_eq!(internal["boxId"], 3);
    assert_eq!(internal["earlierIndex"], 1);
    assert_eq!(internal["laterIndex"], 0);
}

#[test]
fn check_slots_clean_batch_succeeds() {
    let input = r#"{
        "candidates": [
            {"boxId": 3, "scheduleId": 1, "start": "09:00:00", "durationMinutes": 60},
            {"boxId": 3, "scheduleId": 1, "start": "10:10:00", "durationMinutes": 60}
        ],
        "existing": []
    }"#;

    boxsched()
        .arg("check-slots")
        .write_stdin(input)
        .assert()
        .success();
}

#[test]
fn check_slots_rejects_zero_duration() {
    let input = r#"{"candidates":[{"boxId":1,"scheduleId":1,"start":"10:00:00","durationMinutes":0}]}"#;

    boxsched()
        .arg("check-slots")
        .write_stdin(input)
        .assert()
        .failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Link subcommand
// ─────────────────────────────────────────────────────────────────────────────

const PAIR: &str = r#"{
    "first": {"id": 1, "boxId": 1, "scheduleId": 1, "start": "10:00:00", "durationMinutes": 60},
    "second": {"id": 2, "boxId": 2, "scheduleId": 1, "start": "10:15:00", "durationMinutes": 60}
}"#;

#[test]
fn link_uses_offset_flag() {
    let output = boxsched()
        .args(["link", "--offset-minutes", "15"])
        .write_stdin(PAIR)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let pair: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(
        pair,
        serde_json::json!({ "first": 1, "second": 2, "offsetMinutes": 15 })
    );
}

#[test]
fn link_offset_defaults_from_env() {
    boxsched()
        .arg("link")
        .env("BOXSCHED_LINK_OFFSET_MINUTES", "15")
        .write_stdin(PAIR)
        .assert()
        .success();
}

#[test]
fn link_rejects_mismatched_offset() {
    boxsched()
        .arg("link")
        .write_stdin(PAIR)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid slot link"));
}

#[test]
fn link_rejects_half_colliding_with_existing_slot() {
    let input = r#"{
        "first": {"id": 1, "boxId": 1, "scheduleId": 1, "start": "10:00:00", "durationMinutes": 60},
        "second": {"id": 2, "boxId": 2, "scheduleId": 1, "start": "10:00:00", "durationMinutes": 60},
        "existing": [
            {"id": 9, "boxId": 2, "scheduleId": 1, "start": "11:05:00", "durationMinutes": 30}
        ]
    }"#;

    boxsched()
        .arg("link")
        .write_stdin(input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Slot conflicts with existing slots: [9]"));
}

// ─────────────────────────────────────────────────────────────────────────────
// General
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn help_lists_subcommands() {
    boxsched()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("expand"))
        .stdout(predicate::str::contains("overlaps"))
        .stdout(predicate::str::contains("check-slots"))
        .stdout(predicate::str::contains("link"));
}

#[test]
fn verbose_logs_to_stderr_only() {
    let input = r#"{"range":{"from":"2022-02-01","to":"2022-02-02"}}"#;

    let output = boxsched()
        .args(["expand", "--verbose"])
        .write_stdin(input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let dates: Vec<String> = serde_json::from_slice(&output).unwrap();
    assert_eq!(dates.len(), 2);
}

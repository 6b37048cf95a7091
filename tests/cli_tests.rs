//! Integration tests for the CLI interface
//!
//! Tests the main entry point and command parsing logic

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn pipewright() -> Command {
    Command::cargo_bin("pipewright").unwrap()
}

#[test]
fn generate_writes_dronefile() {
    let temp_dir = TempDir::new().unwrap();

    pipewright()
        .args(["generate", "--path"])
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration written"));

    let content = fs::read_to_string(temp_dir.path().join(".drone.yml")).unwrap();
    assert!(content.contains("kind: pipeline"));
}

#[test]
fn ensure_reports_regeneration_then_update() {
    let temp_dir = TempDir::new().unwrap();

    pipewright()
        .args(["ensure", "--path"])
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("regenerated from scratch"));

    pipewright()
        .args(["ensure", "--path"])
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("updated in place"));
}

#[test]
fn repeated_ensure_keeps_one_notification_step() {
    let temp_dir = TempDir::new().unwrap();

    for _ in 0..2 {
        pipewright()
            .env(
                "PIPEWRIGHT_SLACK_WEBHOOK",
                "https://hooks.slack.example/T1/B1",
            )
            .args(["ensure", "--notify", "Slack", "--path"])
            .arg(temp_dir.path())
            .assert()
            .success();
    }

    let content = fs::read_to_string(temp_dir.path().join(".drone.yml")).unwrap();
    assert_eq!(content.matches("name: notification").count(), 1);
}

#[test]
fn workflow_and_files_reach_the_execute_step() {
    let temp_dir = TempDir::new().unwrap();

    pipewright()
        .args([
            "generate",
            "--workflow",
            "shell",
            "--command",
            "make results",
            "--input",
            "raw.dat",
            "--output",
            "out.dat",
            "--path",
        ])
        .arg(temp_dir.path())
        .assert()
        .success();

    let content = fs::read_to_string(temp_dir.path().join(".drone.yml")).unwrap();
    assert!(content.contains("make results"));
    assert!(content.contains("git annex get \"raw.dat\""));
    assert!(content.contains("git push origin"));
}

#[test]
fn missing_settings_file_fails_with_error() {
    let temp_dir = TempDir::new().unwrap();

    pipewright()
        .args(["generate", "--config", "/nonexistent/settings.yml", "--path"])
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("settings file"));
}

#[test]
fn unknown_subcommand_is_rejected() {
    pipewright().arg("frobnicate").assert().failure();
}

//! Integration tests for top-level CLI behavior.

use std::path::Path;
use std::process::{Command, Output};

use epic_sync::adapters::memory::InMemoryIssueTracker;
use epic_sync::context::ServiceContext;
use epic_sync::ports::IssueState;

const EPIC_YAML: &str = "\
title: Inventory
body: Everything about bags.
labels: [ui]
children:
  - title: Bag
    labels: [hud]
  - title: Slots
";

fn run_epic_sync(dir: &Path, args: &[&str], envs: &[(&str, &Path)]) -> Output {
    let bin = env!("CARGO_BIN_EXE_epic-sync");
    let mut command = Command::new(bin);
    command
        .args(args)
        .current_dir(dir)
        .env_remove("EPIC_SYNC_RECORD")
        .env_remove("EPIC_SYNC_REPLAY")
        .env_remove("GITHUB_REPOSITORY")
        .env_remove("RUST_LOG");
    for (key, value) in envs {
        command.env(key, value);
    }
    command.output().expect("failed to run epic-sync binary")
}

fn write_epic(dir: &Path, yaml: &str) -> String {
    let path = dir.join("epic.yml");
    std::fs::write(&path, yaml).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_epic_sync(dir.path(), &["--help"], &[]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("sync"));
    assert!(stdout.contains("check"));
}

#[test]
fn check_prints_summary_for_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_epic(dir.path(), EPIC_YAML);

    let output = run_epic_sync(dir.path(), &["check", "--config", &config], &[]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Epic \"Inventory\" is valid"));
    assert!(stdout.contains("- Bag [epic-child, hud]"));
}

#[test]
fn duplicate_child_titles_exit_with_code_2() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_epic(dir.path(), "title: E\nchildren:\n  - title: A\n  - title: A\n");

    let output = run_epic_sync(dir.path(), &["check", "--config", &config], &[]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("duplicate child title"));
}

#[test]
fn dotenv_can_set_the_log_filter() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_epic(dir.path(), EPIC_YAML);
    std::fs::write(dir.path().join(".env"), "RUST_LOG=epic_sync=debug\n").unwrap();

    let output = run_epic_sync(dir.path(), &["check", "--config", &config], &[]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("loaded .env"));
}

#[test]
fn missing_spec_file_exits_with_code_2() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_epic_sync(dir.path(), &["check", "--config", "nope.yml"], &[]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn invalid_spec_fails_before_any_tracker_call() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_epic(dir.path(), "title: E\nchildren:\n  - title: A\n  - title: A\n");
    let cassette = dir.path().join("does-not-exist.cassette.yaml");

    let output = run_epic_sync(
        dir.path(),
        &["sync", "--config", &config],
        &[("EPIC_SYNC_REPLAY", cassette.as_path())],
    );

    assert_eq!(output.status.code(), Some(2));
    assert!(!String::from_utf8_lossy(&output.stderr).contains("cassette"));
}

#[test]
fn sync_without_repo_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_epic(dir.path(), EPIC_YAML);

    let output = run_epic_sync(dir.path(), &["sync", "--config", &config], &[]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("GITHUB_REPOSITORY"));
}

#[test]
fn dry_run_sync_against_replayed_tracker() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_epic(dir.path(), EPIC_YAML);
    let cassette = dir.path().join("dry-run.cassette.yaml");

    // Capture the reads a dry-run makes against a tracker that already
    // has one of the children.
    {
        let memory = InMemoryIssueTracker::new();
        memory.seed_issue("Bag", IssueState::Closed);
        let ctx = ServiceContext::recording(Box::new(memory), &cassette, "octo/widgets");
        let spec = epic_sync::spec::load(Path::new(&config)).unwrap();
        epic_sync::sync::sync(ctx.issues.as_ref(), &spec, true).unwrap();
    }

    let output = run_epic_sync(
        dir.path(),
        &["sync", "--config", &config, "--dry-run"],
        &[("EPIC_SYNC_REPLAY", cassette.as_path())],
    );
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("(dry run)"));
    assert!(stdout.contains("WOULD CREATE epic Inventory (pending creation)"));
    assert!(stdout.contains("WOULD UPDATE child #1 Bag"));
    assert!(stdout.contains("WOULD CREATE child Slots (pending creation)"));
}

#[test]
fn json_report_is_machine_readable() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_epic(dir.path(), EPIC_YAML);
    let cassette = dir.path().join("json.cassette.yaml");
    {
        let ctx =
            ServiceContext::recording(Box::new(InMemoryIssueTracker::new()), &cassette, "o/r");
        let spec = epic_sync::spec::load(Path::new(&config)).unwrap();
        epic_sync::sync::sync(ctx.issues.as_ref(), &spec, true).unwrap();
    }

    let output = run_epic_sync(
        dir.path(),
        &["sync", "--config", &config, "--dry-run", "--json"],
        &[("EPIC_SYNC_REPLAY", cassette.as_path())],
    );

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["epic_title"], "Inventory");
    assert_eq!(report["dry_run"], true);
    assert!(report["entries"].as_array().unwrap().iter().all(|e| e["outcome"] != "unchanged"));
}

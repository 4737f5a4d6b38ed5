//! End-to-end reconcile behavior against the in-memory tracker.

use chrono::{TimeZone, Utc};

use epic_sync::adapters::memory::InMemoryIssueTracker;
use epic_sync::checklist::BlockMarkers;
use epic_sync::error::{ReconcileError, TrackerError};
use epic_sync::ports::{IssueState, IssueTracker, WriteOutcome};
use epic_sync::spec::{self, EpicSpec};
use epic_sync::sync::{sync, EntityKind, SyncStep};

fn epic() -> EpicSpec {
    spec::parse(
        "\
title: Inventory
body: |
  Everything about bags.
labels: [ui]
label_colors:
  ui: '#1D76DB'
children:
  - title: Bag
    labels: [hud]
  - title: Slots
",
    )
    .unwrap()
}

#[test]
fn second_run_is_a_no_op() {
    let tracker = InMemoryIssueTracker::new();
    let first = sync(&tracker, &epic(), false).unwrap();
    assert!(first.mutation_count() > 0);
    let state = tracker.snapshot();
    let calls = tracker.mutation_count();

    let second = sync(&tracker, &epic(), false).unwrap();

    assert_eq!(second.mutation_count(), 0);
    assert!(second.entries.iter().all(|e| e.outcome == WriteOutcome::Unchanged));
    assert_eq!(tracker.mutation_count(), calls);
    assert_eq!(tracker.snapshot(), state);
}

#[test]
fn existing_issues_are_matched_by_title() {
    let tracker = InMemoryIssueTracker::new();
    let epic_number = tracker.seed_issue_with(
        "Inventory",
        "Hand-written intro.\n",
        &["epic", "ui"],
        IssueState::Open,
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
    );
    let bag = tracker.seed_issue("Bag", IssueState::Closed);

    let report = sync(&tracker, &epic(), false).unwrap();

    assert_eq!(report.epic_number, Some(epic_number));
    let created: Vec<String> = tracker
        .mutations()
        .into_iter()
        .filter(|m| m.starts_with("create_issue"))
        .collect();
    assert_eq!(created, ["create_issue \"Slots\""]);

    let body = tracker.issue(epic_number).unwrap().body;
    let slots = tracker.find_issue_by_title("Slots").unwrap().unwrap().number;
    assert!(body.starts_with("Hand-written intro.\n\n<!-- epic-checklist:start -->"));
    assert!(body.contains(&format!("- [x] #{bag} Bag\n- [ ] #{slots} Slots")));
}

#[test]
fn human_text_around_the_checklist_survives() {
    let tracker = InMemoryIssueTracker::new();
    let number = tracker.seed_issue_with(
        "Inventory",
        "Intro\n<!-- epic-checklist:start -->\nstale\n<!-- epic-checklist:end -->\nOutro",
        &["epic", "ui"],
        IssueState::Open,
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
    );

    sync(&tracker, &epic(), false).unwrap();

    let body = tracker.issue(number).unwrap().body;
    assert!(body.starts_with("Intro\n<!-- epic-checklist:start -->\n- [ ] #"));
    assert!(body.ends_with("\n<!-- epic-checklist:end -->\nOutro"));
    assert!(!body.contains("stale"));
}

#[test]
fn dry_run_against_empty_tracker_plans_everything() {
    let tracker = InMemoryIssueTracker::new();

    let report = sync(&tracker, &epic(), true).unwrap();

    assert_eq!(tracker.mutation_count(), 0);
    assert!(tracker.issues().is_empty());
    let created = report.entries.iter().filter(|e| e.outcome == WriteOutcome::Created).count();
    // 4 labels, epic, 2 children, 2 back-links, child-links
    assert_eq!(created, 10);
    assert!(report.entries.iter().all(|e| e.number.is_none()));
}

#[test]
fn labels_use_spec_colors_and_defaults() {
    let tracker = InMemoryIssueTracker::new();
    sync(&tracker, &epic(), false).unwrap();

    let labels = tracker.snapshot().labels;
    assert_eq!(labels["ui"].color, "1d76db");
    assert_eq!(labels["epic"].color, "6f42c1");
    assert_eq!(labels["hud"].color, "0e8a16");
}

#[test]
fn label_created_by_a_concurrent_run_counts_as_success() {
    let tracker = InMemoryIssueTracker::new();
    tracker.simulate_label_race("hud", "ff0000");

    let report = sync(&tracker, &epic(), false).unwrap();

    let hud = report.entries_of(EntityKind::Label).find(|e| e.name == "hud").unwrap();
    assert_eq!(hud.outcome, WriteOutcome::Unchanged);
    assert_eq!(tracker.snapshot().labels["hud"].color, "ff0000");
}

#[test]
fn abort_reports_step_and_keeps_earlier_mutations() {
    let tracker = InMemoryIssueTracker::new();
    tracker.fail_next(
        "update_issue_body",
        TrackerError::http("PATCH", "/repos/o/r/issues/1", 403, "Resource not accessible"),
    );

    let aborted = sync(&tracker, &epic(), false).unwrap_err();

    assert_eq!(aborted.step, SyncStep::Checklist);
    assert!(matches!(aborted.cause, ReconcileError::Tracker(ref e) if e.status == Some(403)));
    assert_eq!(aborted.report.entries_of(EntityKind::Child).count(), 2);
    assert_eq!(tracker.issues().len(), 3);

    let resumed = sync(&tracker, &epic(), false).unwrap();
    assert_eq!(tracker.issues().len(), 3);
    let changed: Vec<EntityKind> =
        resumed.entries.iter().filter(|e| e.outcome.is_mutation()).map(|e| e.kind).collect();
    assert_eq!(
        changed,
        [EntityKind::Checklist, EntityKind::BackLink, EntityKind::BackLink, EntityKind::ChildLinks]
    );
}

#[test]
fn malformed_back_link_comment_aborts_at_that_child() {
    let tracker = InMemoryIssueTracker::new();
    let bag = tracker.seed_issue("Bag", IssueState::Open);
    tracker.seed_comment(bag, "<!-- linked-to-epic:start -->\nLinked to Epic #9");

    let aborted = sync(&tracker, &epic(), false).unwrap_err();

    assert_eq!(aborted.step, SyncStep::BackLink("Bag".into()));
    assert!(matches!(aborted.cause, ReconcileError::MalformedBlock(_)));
}

#[test]
fn duplicate_remote_titles_resolve_to_earliest_created() {
    let tracker = InMemoryIssueTracker::new();
    let later = tracker.seed_issue_with(
        "Inventory",
        "",
        &[],
        IssueState::Open,
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
    );
    let earlier = tracker.seed_issue_with(
        "Inventory",
        "",
        &[],
        IssueState::Open,
        Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
    );

    let report = sync(&tracker, &epic(), false).unwrap();

    assert_eq!(report.epic_number, Some(earlier));
    assert_eq!(tracker.issue(later).unwrap().body, "");
    assert!(tracker.issue(earlier).unwrap().body.contains("<!-- epic-checklist:start -->"));
}

#[test]
fn existing_back_link_comment_is_rewritten_in_place() {
    let tracker = InMemoryIssueTracker::new();
    let bag = tracker.seed_issue("Bag", IssueState::Open);
    let markers = BlockMarkers::new("linked-to-epic");
    let comment = tracker.seed_comment(bag, &format!("Note from a human\n{}", markers.wrap("Linked to Epic #99")));

    let report = sync(&tracker, &epic(), false).unwrap();

    let comments = tracker.comments(bag);
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].id, comment);
    let epic_number = report.epic_number.unwrap();
    assert_eq!(
        comments[0].body,
        format!("Note from a human\n{}", markers.wrap(&format!("Linked to Epic #{epic_number}")))
    );
}

#[test]
fn repo_label_with_other_casing_converges() {
    let tracker = InMemoryIssueTracker::new();
    tracker.seed_label("Epic", "5319e7");
    let spec = spec::parse("title: Inventory\nchildren:\n  - title: Bag\n").unwrap();

    let first = sync(&tracker, &spec, false).unwrap();
    let epic = tracker.issue(first.epic_number.unwrap()).unwrap();
    assert!(epic.labels.contains("Epic"));
    assert!(!epic.labels.contains("epic"));

    let second = sync(&tracker, &spec, false).unwrap();
    let third = sync(&tracker, &spec, false).unwrap();
    assert_eq!(second.mutation_count(), 0);
    assert_eq!(third.mutation_count(), 0);
}

#[test]
fn existing_issue_with_differently_cased_label_is_unchanged() {
    let tracker = InMemoryIssueTracker::new();
    tracker.seed_label("UI", "1d76db");
    tracker.seed_issue_with(
        "Inventory",
        "",
        &["Epic", "UI"],
        IssueState::Open,
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
    );

    let report = sync(&tracker, &epic(), false).unwrap();

    let entry = report.entries_of(EntityKind::Epic).next().unwrap();
    assert_eq!(entry.outcome, WriteOutcome::Unchanged);
    assert!(!tracker.mutations().iter().any(|m| m.starts_with("add_labels #1")));
}

#[test]
fn children_carry_the_epic_child_label() {
    let tracker = InMemoryIssueTracker::new();
    sync(&tracker, &epic(), false).unwrap();

    for title in ["Bag", "Slots"] {
        let child = tracker.find_issue_by_title(title).unwrap().unwrap();
        assert!(child.labels.contains("epic-child"), "{title}: {:?}", child.labels);
    }
    let epic = tracker.find_issue_by_title("Inventory").unwrap().unwrap();
    assert!(!epic.labels.contains("epic-child"));
}

#[test]
fn owned_labels_are_created_with_descriptions() {
    let tracker = InMemoryIssueTracker::new();
    sync(&tracker, &epic(), false).unwrap();

    let labels = tracker.snapshot().labels;
    assert_eq!(labels["epic"].description.as_deref(), Some("Epic grouping issue"));
    assert_eq!(labels["epic-child"].description.as_deref(), Some("Child of an Epic"));
    assert_eq!(labels["epic-child"].color, "c2e0c6");
    assert_eq!(labels["ui"].description, None);
}

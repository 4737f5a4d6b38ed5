//! Record-replay round-trip integration test.
//!
//! 1. Run a real sync against the in-memory tracker through a recording context.
//! 2. Replay the cassette with `ServiceContext::replaying()`.
//! 3. Assert the replayed report matches the recorded one.
//! 4. Replay a second time and assert determinism.

use epic_sync::adapters::memory::InMemoryIssueTracker;
use epic_sync::cassette::Cassette;
use epic_sync::context::ServiceContext;
use epic_sync::ports::IssueState;
use epic_sync::spec::{self, EpicSpec};
use epic_sync::sync::{sync, ReportEntry};

fn epic() -> EpicSpec {
    spec::parse(
        "title: Inventory\nbody: Bags.\nchildren:\n  - title: Bag\n    labels: [hud]\n  - title: Slots\n",
    )
    .unwrap()
}

fn replay(path: &std::path::Path) -> Vec<ReportEntry> {
    let ctx = ServiceContext::replaying(path).expect("cassette should load");
    sync(ctx.issues.as_ref(), &epic(), false).expect("replayed sync should succeed").entries
}

#[test]
fn record_then_replay_produces_identical_reports() {
    let dir = tempfile::tempdir().unwrap();
    let cassette_path = dir.path().join("roundtrip.cassette.yaml");

    let memory = InMemoryIssueTracker::new();
    memory.seed_issue("Slots", IssueState::Closed);
    let recorded = {
        let ctx = ServiceContext::recording(Box::new(memory), &cassette_path, "octo/widgets");
        sync(ctx.issues.as_ref(), &epic(), false).expect("recorded sync should succeed")
    };

    let cassette = Cassette::load(&cassette_path).unwrap();
    assert_eq!(cassette.repo, "octo/widgets");
    assert!(cassette.interactions.iter().any(|i| i.method == "create_issue"));

    let first = replay(&cassette_path);
    assert_eq!(first, recorded.entries);

    let second = replay(&cassette_path);
    assert_eq!(second, first, "replay must be deterministic");
}

#[test]
fn replaying_a_failure_aborts_the_same_way() {
    let dir = tempfile::tempdir().unwrap();
    let cassette_path = dir.path().join("failure.cassette.yaml");

    let memory = InMemoryIssueTracker::new();
    memory.fail_next(
        "create_comment",
        epic_sync::error::TrackerError::http("POST", "/repos/o/r/issues/2/comments", 403, "Forbidden"),
    );
    let recorded = {
        let ctx = ServiceContext::recording(Box::new(memory), &cassette_path, "o/r");
        sync(ctx.issues.as_ref(), &epic(), false).unwrap_err()
    };

    let ctx = ServiceContext::replaying(&cassette_path).unwrap();
    let replayed = sync(ctx.issues.as_ref(), &epic(), false).unwrap_err();

    assert_eq!(replayed.step, recorded.step);
    assert_eq!(replayed.report.entries, recorded.report.entries);
    assert_eq!(replayed.cause, recorded.cause);
}

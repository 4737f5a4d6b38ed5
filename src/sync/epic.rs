//! Reconciles an Epic definition against the tracker.
//!
//! Idempotent: every step reads before it writes, so re-running against an
//! unchanged tracker makes no mutating calls. Issues are matched to the
//! definition by exact title.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use super::report::{EntityKind, SyncReport};
use crate::adapters::dry_run::DryRunIssueTracker;
use crate::checklist::{
    back_link_text, checklist_lines, child_links_text, BlockMarkers, ChecklistItem,
    BACK_LINK_MARKER, CHECKLIST_MARKER, CHILD_LINKS_MARKER,
};
use crate::error::ReconcileError;
use crate::ports::issues::{IssueTracker, RemoteIssue, WriteOutcome};
use crate::spec::EpicSpec;

/// The reconcile step that was running when a sync stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStep {
    /// Ensuring repository labels.
    Labels,
    /// Finding or creating the Epic.
    Epic,
    /// Finding or creating the child with this title.
    Child(String),
    /// Rewriting the checklist in the Epic body.
    Checklist,
    /// Writing the back-link comment on the child with this title.
    BackLink(String),
    /// Writing the child-links comment on the Epic.
    ChildLinks,
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Labels => f.write_str("labels"),
            Self::Epic => f.write_str("epic"),
            Self::Child(title) => write!(f, "child \"{title}\""),
            Self::Checklist => f.write_str("checklist"),
            Self::BackLink(title) => write!(f, "back-link on \"{title}\""),
            Self::ChildLinks => f.write_str("child-links"),
        }
    }
}

/// A sync that stopped part-way through.
///
/// Whatever `report` lists as created or updated has already been applied.
/// Re-running the sync picks up from there.
#[derive(Debug, Error)]
#[error("sync aborted at {step}: {cause}")]
pub struct SyncAborted {
    /// Step that failed.
    pub step: SyncStep,
    /// Everything done before the failure.
    pub report: SyncReport,
    /// Why the step failed.
    #[source]
    pub cause: ReconcileError,
}

struct Failure {
    step: SyncStep,
    cause: ReconcileError,
}

fn at<E: Into<ReconcileError>>(step: SyncStep) -> impl FnOnce(E) -> Failure {
    move |cause| Failure { step, cause: cause.into() }
}

/// Brings the tracker in line with `spec`.
///
/// Steps, in order: labels, Epic, children (file order), checklist block in
/// the Epic body, back-link comment on each child, child-links comment on
/// the Epic. With `dry_run` every call goes through [`DryRunIssueTracker`],
/// so reads are real and writes are only reported.
///
/// # Errors
///
/// Returns [`SyncAborted`] at the first failing step, carrying the partial
/// report.
pub fn sync(
    tracker: &dyn IssueTracker,
    spec: &EpicSpec,
    dry_run: bool,
) -> Result<SyncReport, SyncAborted> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("sync", %run_id, epic = %spec.title);
    let _entered = span.enter();

    let shim;
    let tracker: &dyn IssueTracker = if dry_run {
        shim = DryRunIssueTracker::new(tracker);
        &shim
    } else {
        tracker
    };

    let mut report = SyncReport::new(run_id, &spec.title, dry_run);
    match reconcile(tracker, spec, &mut report) {
        Ok(()) => {
            tracing::info!(changes = report.mutation_count(), dry_run, "sync finished");
            Ok(report)
        }
        Err(Failure { step, cause }) => {
            tracing::error!(step = %step, error = %cause, "sync aborted");
            Err(SyncAborted { step, report, cause })
        }
    }
}

fn reconcile(
    tracker: &dyn IssueTracker,
    spec: &EpicSpec,
    report: &mut SyncReport,
) -> Result<(), Failure> {
    for label in spec.all_labels() {
        let (_, outcome) = tracker
            .ensure_label(label, spec.color_for(label), EpicSpec::description_for(label))
            .map_err(at(SyncStep::Labels))?;
        report.record(EntityKind::Label, label, None, outcome);
    }

    let (epic, outcome) =
        find_or_create(tracker, &spec.title, &spec.body_template, &spec.labels)
            .map_err(at(SyncStep::Epic))?;
    report.epic_number = epic.known_number();
    report.record(EntityKind::Epic, &spec.title, epic.known_number(), outcome);

    let mut children = Vec::with_capacity(spec.children.len());
    for child in &spec.children {
        let (issue, outcome) = find_or_create(tracker, &child.title, &child.body, &child.labels)
            .map_err(at(SyncStep::Child(child.title.clone())))?;
        report.record(EntityKind::Child, &child.title, issue.known_number(), outcome);
        children.push(issue);
    }
    let items: Vec<ChecklistItem> = children
        .iter()
        .map(|issue| ChecklistItem::new(issue.title.clone(), issue.known_number(), issue.state))
        .collect();

    let outcome = write_checklist(tracker, &epic, &items).map_err(at(SyncStep::Checklist))?;
    report.record(EntityKind::Checklist, &spec.title, epic.known_number(), outcome);

    let back_markers = BlockMarkers::new(BACK_LINK_MARKER);
    let back_link = back_link_text(epic.known_number());
    for child in &children {
        let outcome = tracker
            .add_or_update_comment(child.number, &back_markers, &back_link)
            .map_err(at(SyncStep::BackLink(child.title.clone())))?;
        report.record(EntityKind::BackLink, &child.title, child.known_number(), outcome);
    }

    let outcome = tracker
        .add_or_update_comment(
            epic.number,
            &BlockMarkers::new(CHILD_LINKS_MARKER),
            &child_links_text(&items),
        )
        .map_err(at(SyncStep::ChildLinks))?;
    report.record(EntityKind::ChildLinks, &spec.title, epic.known_number(), outcome);

    Ok(())
}

/// Finds the issue titled `title`, creating it when missing.
///
/// An existing issue keeps its title and body; only labels it lacks are
/// added. Label names compare case-insensitively, since the tracker reports
/// its own spelling.
fn find_or_create(
    tracker: &dyn IssueTracker,
    title: &str,
    body: &str,
    labels: &BTreeSet<String>,
) -> Result<(RemoteIssue, WriteOutcome), ReconcileError> {
    let Some(existing) = tracker.find_issue_by_title(title)? else {
        let created = tracker.create_issue(title, body, labels)?;
        return Ok((created, WriteOutcome::Created));
    };

    let present: BTreeSet<String> = existing.labels.iter().map(|l| l.to_lowercase()).collect();
    let missing: BTreeSet<String> =
        labels.iter().filter(|l| !present.contains(&l.to_lowercase())).cloned().collect();
    if missing.is_empty() {
        return Ok((existing, WriteOutcome::Unchanged));
    }
    tracker.add_labels(existing.number, &missing)?;
    Ok((existing, WriteOutcome::Updated))
}

fn write_checklist(
    tracker: &dyn IssueTracker,
    epic: &RemoteIssue,
    items: &[ChecklistItem],
) -> Result<WriteOutcome, ReconcileError> {
    let body = BlockMarkers::new(CHECKLIST_MARKER).replace_in(&epic.body, &checklist_lines(items))?;
    if body == epic.body {
        return Ok(WriteOutcome::Unchanged);
    }
    tracker.update_issue_body(epic.number, &body)?;
    Ok(WriteOutcome::Updated)
}

//! What a sync did (or would do), entity by entity.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::ports::issues::WriteOutcome;

/// Kind of remote entity a report entry is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    /// A repository label.
    Label,
    /// The Epic issue itself.
    Epic,
    /// A child issue.
    Child,
    /// The checklist block in the Epic body.
    Checklist,
    /// The back-link comment on a child.
    BackLink,
    /// The child-links comment on the Epic.
    ChildLinks,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Label => "label",
            Self::Epic => "epic",
            Self::Child => "child",
            Self::Checklist => "checklist",
            Self::BackLink => "back-link",
            Self::ChildLinks => "child-links",
        })
    }
}

/// One line of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    /// What was reconciled.
    pub kind: EntityKind,
    /// Label name or issue title.
    pub name: String,
    /// Issue the entry lives on, when it has a real number.
    pub number: Option<u64>,
    /// What happened.
    pub outcome: WriteOutcome,
}

impl ReportEntry {
    fn target(&self) -> String {
        match (self.kind, self.number) {
            (EntityKind::Label, _) => self.name.clone(),
            (_, Some(number)) => format!("#{number} {}", self.name),
            (_, None) => format!("{} (pending creation)", self.name),
        }
    }
}

/// Everything a single sync run touched, in the order it was touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Identifies this run in logs.
    pub run_id: Uuid,
    /// Title of the Epic being synced.
    pub epic_title: String,
    /// Epic number once known; `None` before step 2 or in a dry-run
    /// that would create it.
    pub epic_number: Option<u64>,
    /// Whether mutations were only planned.
    pub dry_run: bool,
    /// Entries in reconcile order.
    pub entries: Vec<ReportEntry>,
}

impl SyncReport {
    /// Starts an empty report.
    #[must_use]
    pub fn new(run_id: Uuid, epic_title: &str, dry_run: bool) -> Self {
        Self {
            run_id,
            epic_title: epic_title.to_string(),
            epic_number: None,
            dry_run,
            entries: Vec::new(),
        }
    }

    /// Appends an entry and logs it when it is a mutation.
    pub fn record(
        &mut self,
        kind: EntityKind,
        name: &str,
        number: Option<u64>,
        outcome: WriteOutcome,
    ) {
        let entry = ReportEntry { kind, name: name.to_string(), number, outcome };
        if outcome.is_mutation() {
            tracing::info!(
                kind = %kind,
                target = %entry.target(),
                "{}",
                verb(outcome, self.dry_run).to_lowercase()
            );
        } else {
            tracing::debug!(kind = %kind, target = %entry.target(), "unchanged");
        }
        self.entries.push(entry);
    }

    /// Number of mutating calls made (or planned, in a dry-run).
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_mutation()).count()
    }

    /// Entries of one kind, in order.
    pub fn entries_of(&self, kind: EntityKind) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }
}

fn verb(outcome: WriteOutcome, dry_run: bool) -> &'static str {
    match (outcome, dry_run) {
        (WriteOutcome::Created, false) => "CREATED",
        (WriteOutcome::Updated, false) => "UPDATED",
        (WriteOutcome::Created, true) => "WOULD CREATE",
        (WriteOutcome::Updated, true) => "WOULD UPDATE",
        (WriteOutcome::Unchanged, _) => "UNCHANGED",
    }
}

/// Formats a report as a human-readable summary.
#[must_use]
pub fn format_report(report: &SyncReport) -> String {
    let epic = match report.epic_number {
        Some(number) => format!("#{number} {}", report.epic_title),
        None => report.epic_title.clone(),
    };
    let mode = if report.dry_run { " (dry run)" } else { "" };

    let mut lines = vec![format!("Epic {epic}{mode}")];
    lines.extend(
        report
            .entries
            .iter()
            .map(|e| format!("  {} {} {}", verb(e.outcome, report.dry_run), e.kind, e.target())),
    );
    let changes = report.mutation_count();
    lines.push(match (changes, report.dry_run) {
        (0, _) => "Already in sync.".to_string(),
        (n, true) => format!("{n} change(s) planned."),
        (n, false) => format!("{n} change(s) applied."),
    });
    lines.join("\n")
}

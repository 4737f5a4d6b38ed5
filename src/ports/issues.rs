//! Issue tracker port for Epic and child issues.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checklist::BlockMarkers;
use crate::error::{MalformedBlockError, ReconcileError, TrackerError};

/// Result of a tracker call.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Number given to issues that only exist in a dry-run plan.
///
/// Real tracker numbers start at 1.
pub const PENDING_ISSUE_NUMBER: u64 = 0;

/// Open or closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    /// Work still outstanding.
    Open,
    /// Work done (or abandoned).
    Closed,
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Closed => "closed",
        })
    }
}

/// An issue as the tracker reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIssue {
    /// Tracker-assigned number, rendered as `#<number>`.
    pub number: u64,
    /// Exact title.
    pub title: String,
    /// Current body (empty when the tracker has none).
    pub body: String,
    /// Open or closed.
    pub state: IssueState,
    /// Label names currently applied.
    pub labels: BTreeSet<String>,
    /// Creation time, used to pick between issues sharing a title.
    pub created_at: DateTime<Utc>,
}

impl RemoteIssue {
    /// Whether this issue was only planned by a dry-run.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.number == PENDING_ISSUE_NUMBER
    }

    /// The number, unless the issue is pending.
    #[must_use]
    pub fn known_number(&self) -> Option<u64> {
        (!self.is_pending()).then_some(self.number)
    }
}

/// A repository label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Label name.
    pub name: String,
    /// Hex color without `#`.
    pub color: String,
    /// Short description shown next to the label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An issue comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Tracker-assigned comment id.
    pub id: u64,
    /// Comment text.
    pub body: String,
}

/// What a write-or-skip operation ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOutcome {
    /// Something new was created.
    Created,
    /// Something existing was changed.
    Updated,
    /// Remote state already matched; nothing was written.
    Unchanged,
}

impl WriteOutcome {
    /// Whether a mutating call was made (or would have been, in a dry-run).
    #[must_use]
    pub fn is_mutation(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Manages issues, labels and comments in an external tracker.
///
/// Implementors provide the primitive calls. [`IssueTracker::ensure_label`]
/// and [`IssueTracker::add_or_update_comment`] are built on top of them so
/// wrappers (dry-run, recording) only have to intercept primitives.
pub trait IssueTracker: Send + Sync {
    /// Looks up a label by name. Names match case-insensitively, and the
    /// returned label carries the repository's spelling.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracker cannot be queried.
    fn get_label(&self, name: &str) -> TrackerResult<Option<Label>>;

    /// Creates a label.
    ///
    /// # Errors
    ///
    /// Returns an error if creation fails, including when the label already
    /// exists (see [`TrackerError::is_already_exists`]).
    fn create_label(
        &self,
        name: &str,
        color: &str,
        description: Option<&str>,
    ) -> TrackerResult<Label>;

    /// Finds the issue whose title is exactly `title`.
    ///
    /// When several issues share the title, the earliest-created wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracker cannot be queried.
    fn find_issue_by_title(&self, title: &str) -> TrackerResult<Option<RemoteIssue>>;

    /// Fetches an issue by number.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracker cannot be queried.
    fn get_issue(&self, number: u64) -> TrackerResult<Option<RemoteIssue>>;

    /// Creates an issue and returns it with its assigned number.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue cannot be created.
    fn create_issue(
        &self,
        title: &str,
        body: &str,
        labels: &BTreeSet<String>,
    ) -> TrackerResult<RemoteIssue>;

    /// Replaces an issue's body.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue cannot be found or updated.
    fn update_issue_body(&self, number: u64, body: &str) -> TrackerResult<()>;

    /// Adds labels to an issue, keeping the ones it already has. A label
    /// the issue carries under another casing is not added twice.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue cannot be found or updated.
    fn add_labels(&self, number: u64, labels: &BTreeSet<String>) -> TrackerResult<()>;

    /// Lists the comments on an issue, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracker cannot be queried.
    fn list_comments(&self, number: u64) -> TrackerResult<Vec<Comment>>;

    /// Adds a comment to an issue.
    ///
    /// # Errors
    ///
    /// Returns an error if the comment cannot be created.
    fn create_comment(&self, number: u64, body: &str) -> TrackerResult<Comment>;

    /// Replaces a comment's text.
    ///
    /// # Errors
    ///
    /// Returns an error if the comment cannot be found or updated.
    fn update_comment(&self, comment_id: u64, body: &str) -> TrackerResult<()>;

    /// Returns the label `name`, creating it with `color` and `description`
    /// when missing. An existing label is never recolored.
    ///
    /// A creation that fails because another run created the label first is
    /// reported as [`WriteOutcome::Unchanged`].
    ///
    /// # Errors
    ///
    /// Returns an error if the label neither exists nor can be created.
    fn ensure_label(
        &self,
        name: &str,
        color: &str,
        description: Option<&str>,
    ) -> TrackerResult<(Label, WriteOutcome)> {
        if let Some(label) = self.get_label(name)? {
            return Ok((label, WriteOutcome::Unchanged));
        }
        match self.create_label(name, color, description) {
            Ok(label) => Ok((label, WriteOutcome::Created)),
            Err(err) if err.is_already_exists() => {
                tracing::debug!(label = name, "label created concurrently, re-reading");
                match self.get_label(name)? {
                    Some(label) => Ok((label, WriteOutcome::Unchanged)),
                    None => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Writes `text` into the managed block of the comment marked with
    /// `markers`, creating the comment when there is none.
    ///
    /// Text around the block inside an existing comment is preserved. No
    /// call is made when the comment already has exactly this content.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::MalformedBlock`] when a comment carries only
    /// one of the markers, and [`ReconcileError::Tracker`] when a tracker
    /// call fails.
    fn add_or_update_comment(
        &self,
        issue_number: u64,
        markers: &BlockMarkers,
        text: &str,
    ) -> Result<WriteOutcome, ReconcileError> {
        let comments = self.list_comments(issue_number)?;
        let Some(existing) = comments.iter().find(|c| markers.appears_in(&c.body)) else {
            self.create_comment(issue_number, &markers.wrap(text))?;
            return Ok(WriteOutcome::Created);
        };

        let updated = markers.replace_in(&existing.body, text).map_err(|e| MalformedBlockError {
            problem: format!("{} (comment {} on #{issue_number})", e.problem, existing.id),
            ..e
        })?;
        if updated == existing.body {
            return Ok(WriteOutcome::Unchanged);
        }
        self.update_comment(existing.id, &updated)?;
        Ok(WriteOutcome::Updated)
    }
}

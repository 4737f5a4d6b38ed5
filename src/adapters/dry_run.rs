//! Dry-run shim for the `IssueTracker` port.
//!
//! Reads go to the wrapped tracker; every mutation is logged and answered
//! with a synthetic result so the reconciler can carry on planning.

use std::collections::BTreeSet;

use chrono::Utc;

use crate::ports::issues::{
    Comment, IssueState, IssueTracker, Label, RemoteIssue, TrackerResult, PENDING_ISSUE_NUMBER,
};

/// Wraps a tracker and swallows every mutating call.
pub struct DryRunIssueTracker<'a> {
    inner: &'a dyn IssueTracker,
}

impl<'a> DryRunIssueTracker<'a> {
    /// Creates a shim over `inner`.
    #[must_use]
    pub fn new(inner: &'a dyn IssueTracker) -> Self {
        Self { inner }
    }
}

impl IssueTracker for DryRunIssueTracker<'_> {
    fn get_label(&self, name: &str) -> TrackerResult<Option<Label>> {
        self.inner.get_label(name)
    }

    fn create_label(
        &self,
        name: &str,
        color: &str,
        description: Option<&str>,
    ) -> TrackerResult<Label> {
        tracing::info!(label = name, color, "dry-run: would create label");
        Ok(Label {
            name: name.to_string(),
            color: color.to_string(),
            description: description.map(str::to_string),
        })
    }

    fn find_issue_by_title(&self, title: &str) -> TrackerResult<Option<RemoteIssue>> {
        self.inner.find_issue_by_title(title)
    }

    fn get_issue(&self, number: u64) -> TrackerResult<Option<RemoteIssue>> {
        if number == PENDING_ISSUE_NUMBER {
            return Ok(None);
        }
        self.inner.get_issue(number)
    }

    fn create_issue(
        &self,
        title: &str,
        body: &str,
        labels: &BTreeSet<String>,
    ) -> TrackerResult<RemoteIssue> {
        tracing::info!(title, "dry-run: would create issue");
        Ok(RemoteIssue {
            number: PENDING_ISSUE_NUMBER,
            title: title.to_string(),
            body: body.to_string(),
            state: IssueState::Open,
            labels: labels.clone(),
            created_at: Utc::now(),
        })
    }

    fn update_issue_body(&self, number: u64, _body: &str) -> TrackerResult<()> {
        tracing::info!(number, "dry-run: would update issue body");
        Ok(())
    }

    fn add_labels(&self, number: u64, labels: &BTreeSet<String>) -> TrackerResult<()> {
        tracing::info!(number, ?labels, "dry-run: would add labels");
        Ok(())
    }

    fn list_comments(&self, number: u64) -> TrackerResult<Vec<Comment>> {
        if number == PENDING_ISSUE_NUMBER {
            return Ok(Vec::new());
        }
        self.inner.list_comments(number)
    }

    fn create_comment(&self, number: u64, body: &str) -> TrackerResult<Comment> {
        tracing::info!(number, "dry-run: would add comment");
        Ok(Comment { id: 0, body: body.to_string() })
    }

    fn update_comment(&self, comment_id: u64, _body: &str) -> TrackerResult<()> {
        tracing::info!(comment_id, "dry-run: would update comment");
        Ok(())
    }
}

//! Recording adapter for the `IssueTracker` port.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use serde_json::json;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::issues::{Comment, IssueTracker, Label, RemoteIssue, TrackerResult};

const PORT: &str = "issues";

/// Records every primitive tracker call while delegating to an inner tracker.
pub struct RecordingIssueTracker {
    inner: Box<dyn IssueTracker>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingIssueTracker {
    /// Wraps `inner`, appending each call to `recorder`.
    pub fn new(inner: Box<dyn IssueTracker>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }

    fn record<T: serde::Serialize>(
        &self,
        method: &str,
        input: &serde_json::Value,
        result: TrackerResult<T>,
    ) -> TrackerResult<T> {
        record_result(&self.recorder, PORT, method, input, &result);
        result
    }
}

impl IssueTracker for RecordingIssueTracker {
    fn get_label(&self, name: &str) -> TrackerResult<Option<Label>> {
        self.record("get_label", &json!({ "name": name }), self.inner.get_label(name))
    }

    fn create_label(
        &self,
        name: &str,
        color: &str,
        description: Option<&str>,
    ) -> TrackerResult<Label> {
        let input = json!({ "name": name, "color": color, "description": description });
        self.record("create_label", &input, self.inner.create_label(name, color, description))
    }

    fn find_issue_by_title(&self, title: &str) -> TrackerResult<Option<RemoteIssue>> {
        let result = self.inner.find_issue_by_title(title);
        self.record("find_issue_by_title", &json!({ "title": title }), result)
    }

    fn get_issue(&self, number: u64) -> TrackerResult<Option<RemoteIssue>> {
        self.record("get_issue", &json!({ "number": number }), self.inner.get_issue(number))
    }

    fn create_issue(
        &self,
        title: &str,
        body: &str,
        labels: &BTreeSet<String>,
    ) -> TrackerResult<RemoteIssue> {
        let input = json!({ "title": title, "body": body, "labels": labels });
        self.record("create_issue", &input, self.inner.create_issue(title, body, labels))
    }

    fn update_issue_body(&self, number: u64, body: &str) -> TrackerResult<()> {
        let input = json!({ "number": number, "body": body });
        self.record("update_issue_body", &input, self.inner.update_issue_body(number, body))
    }

    fn add_labels(&self, number: u64, labels: &BTreeSet<String>) -> TrackerResult<()> {
        let input = json!({ "number": number, "labels": labels });
        self.record("add_labels", &input, self.inner.add_labels(number, labels))
    }

    fn list_comments(&self, number: u64) -> TrackerResult<Vec<Comment>> {
        self.record("list_comments", &json!({ "number": number }), self.inner.list_comments(number))
    }

    fn create_comment(&self, number: u64, body: &str) -> TrackerResult<Comment> {
        let input = json!({ "number": number, "body": body });
        self.record("create_comment", &input, self.inner.create_comment(number, body))
    }

    fn update_comment(&self, comment_id: u64, body: &str) -> TrackerResult<()> {
        let input = json!({ "comment_id": comment_id, "body": body });
        self.record("update_comment", &input, self.inner.update_comment(comment_id, body))
    }
}

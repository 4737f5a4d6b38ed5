//! Replaying adapter for the `IssueTracker` port.

use std::collections::BTreeSet;
use std::sync::Mutex;

use super::{next_output, replay_result};
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::issues::{Comment, IssueTracker, Label, RemoteIssue, TrackerResult};

const PORT: &str = "issues";

/// Serves recorded tracker results from a cassette.
///
/// Arguments are not compared against the recording; calls are matched by
/// method name and order only.
pub struct ReplayingIssueTracker {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingIssueTracker {
    /// Create a replaying tracker backed by the given replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }

    fn replay<T: serde::de::DeserializeOwned>(&self, method: &str) -> TrackerResult<T> {
        let output = next_output(&self.replayer, PORT, method)?;
        replay_result(PORT, method, output)
    }
}

impl IssueTracker for ReplayingIssueTracker {
    fn get_label(&self, _name: &str) -> TrackerResult<Option<Label>> {
        self.replay("get_label")
    }

    fn create_label(
        &self,
        _name: &str,
        _color: &str,
        _description: Option<&str>,
    ) -> TrackerResult<Label> {
        self.replay("create_label")
    }

    fn find_issue_by_title(&self, _title: &str) -> TrackerResult<Option<RemoteIssue>> {
        self.replay("find_issue_by_title")
    }

    fn get_issue(&self, _number: u64) -> TrackerResult<Option<RemoteIssue>> {
        self.replay("get_issue")
    }

    fn create_issue(
        &self,
        _title: &str,
        _body: &str,
        _labels: &BTreeSet<String>,
    ) -> TrackerResult<RemoteIssue> {
        self.replay("create_issue")
    }

    fn update_issue_body(&self, _number: u64, _body: &str) -> TrackerResult<()> {
        self.replay("update_issue_body")
    }

    fn add_labels(&self, _number: u64, _labels: &BTreeSet<String>) -> TrackerResult<()> {
        self.replay("add_labels")
    }

    fn list_comments(&self, _number: u64) -> TrackerResult<Vec<Comment>> {
        self.replay("list_comments")
    }

    fn create_comment(&self, _number: u64, _body: &str) -> TrackerResult<Comment> {
        self.replay("create_comment")
    }

    fn update_comment(&self, _comment_id: u64, _body: &str) -> TrackerResult<()> {
        self.replay("update_comment")
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::cassette::format::{Cassette, Interaction};

    fn tracker(interactions: Vec<(&str, serde_json::Value)>) -> ReplayingIssueTracker {
        let cassette = Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            repo: "o/r".into(),
            interactions: interactions
                .into_iter()
                .zip(0..)
                .map(|((method, output), seq)| Interaction {
                    seq,
                    port: PORT.into(),
                    method: method.into(),
                    input: json!({}),
                    output,
                })
                .collect(),
        };
        ReplayingIssueTracker::new(CassetteReplayer::new(&cassette))
    }

    #[test]
    fn replays_recorded_values() {
        let tracker = tracker(vec![
            ("get_label", json!({ "Ok": null })),
            ("create_label", json!({ "Ok": { "name": "epic", "color": "6f42c1" } })),
        ]);
        assert_eq!(tracker.get_label("epic").unwrap(), None);
        assert_eq!(tracker.create_label("epic", "6f42c1", None).unwrap().color, "6f42c1");
    }

    #[test]
    fn unit_results_replay() {
        let tracker = tracker(vec![("update_issue_body", json!({ "Ok": null }))]);
        assert!(tracker.update_issue_body(1, "x").is_ok());
    }

    #[test]
    fn missing_recording_is_an_error_not_a_panic() {
        let tracker = tracker(vec![]);
        let err = tracker.get_issue(3).unwrap_err();
        assert_eq!(err.method, "replay");
        assert!(err.message.contains("cassette exhausted"));
    }
}

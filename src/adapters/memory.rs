//! In-memory adapter for the `IssueTracker` port.
//!
//! Behaves like a small GitHub repository held in a `Mutex`: numbers are
//! assigned sequentially, every mutating call is logged, and failures can be
//! injected per method. Label names match case-insensitively and issues
//! carry the repository's spelling, as on GitHub. Used by tests and for
//! offline experiments.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::error::TrackerError;
use crate::ports::issues::{
    Comment, IssueState, IssueTracker, Label, RemoteIssue, TrackerResult,
};

/// Everything the tracker holds, for before/after comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSnapshot {
    /// Labels keyed by lowercased name.
    pub labels: BTreeMap<String, Label>,
    /// Issues in creation order.
    pub issues: Vec<RemoteIssue>,
    /// Comments per issue number.
    pub comments: BTreeMap<u64, Vec<Comment>>,
}

#[derive(Debug)]
struct State {
    labels: BTreeMap<String, Label>,
    issues: Vec<RemoteIssue>,
    comments: BTreeMap<u64, Vec<Comment>>,
    next_number: u64,
    next_comment_id: u64,
    mutations: Vec<String>,
    failures: HashMap<String, VecDeque<TrackerError>>,
    label_races: HashMap<String, String>,
}

/// Issue tracker that lives entirely in memory.
#[derive(Debug)]
pub struct InMemoryIssueTracker {
    state: Mutex<State>,
}

impl Default for InMemoryIssueTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn label_key(name: &str) -> String {
    name.to_lowercase()
}

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default()
}

impl InMemoryIssueTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                labels: BTreeMap::new(),
                issues: Vec::new(),
                comments: BTreeMap::new(),
                next_number: 1,
                next_comment_id: 1,
                mutations: Vec::new(),
                failures: HashMap::new(),
                label_races: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("in-memory tracker lock poisoned")
    }

    /// Adds an issue without counting it as a mutation. Returns its number.
    pub fn seed_issue(&self, title: &str, state: IssueState) -> u64 {
        let mut guard = self.lock();
        let created_at = epoch() + Duration::minutes(i64::try_from(guard.next_number).unwrap_or(0));
        insert_issue(&mut guard, title, "", &BTreeSet::new(), state, created_at)
    }

    /// Adds an issue with an explicit body, labels and creation time.
    pub fn seed_issue_with(
        &self,
        title: &str,
        body: &str,
        labels: &[&str],
        state: IssueState,
        created_at: DateTime<Utc>,
    ) -> u64 {
        let labels = labels.iter().map(|l| (*l).to_string()).collect();
        insert_issue(&mut self.lock(), title, body, &labels, state, created_at)
    }

    /// Adds a comment without counting it as a mutation. Returns its id.
    pub fn seed_comment(&self, number: u64, body: &str) -> u64 {
        insert_comment(&mut self.lock(), number, body)
    }

    /// Adds a label without counting it as a mutation.
    pub fn seed_label(&self, name: &str, color: &str) {
        self.lock().labels.insert(
            label_key(name),
            Label { name: name.into(), color: color.into(), description: None },
        );
    }

    /// Closes an issue, as a human would on the tracker.
    pub fn close_issue(&self, number: u64) {
        if let Some(issue) = self.lock().issues.iter_mut().find(|i| i.number == number) {
            issue.state = IssueState::Closed;
        }
    }

    /// Makes the next call to `method` fail with `error`.
    pub fn fail_next(&self, method: &str, error: TrackerError) {
        self.lock().failures.entry(method.to_string()).or_default().push_back(error);
    }

    /// Makes the next `create_label(name)` behave as if another run created
    /// the label first: the label appears with `color`, but the call
    /// reports HTTP 422.
    pub fn simulate_label_race(&self, name: &str, color: &str) {
        self.lock().label_races.insert(label_key(name), color.to_string());
    }

    /// Number of mutating calls made so far.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.lock().mutations.len()
    }

    /// Log of mutating calls, e.g. `create_issue "Epic"`.
    #[must_use]
    pub fn mutations(&self) -> Vec<String> {
        self.lock().mutations.clone()
    }

    /// Fetches an issue by number.
    #[must_use]
    pub fn issue(&self, number: u64) -> Option<RemoteIssue> {
        self.lock().issues.iter().find(|i| i.number == number).cloned()
    }

    /// All issues in creation order.
    #[must_use]
    pub fn issues(&self) -> Vec<RemoteIssue> {
        self.lock().issues.clone()
    }

    /// Comments on one issue.
    #[must_use]
    pub fn comments(&self, number: u64) -> Vec<Comment> {
        self.lock().comments.get(&number).cloned().unwrap_or_default()
    }

    /// Full copy of the tracker contents.
    #[must_use]
    pub fn snapshot(&self) -> TrackerSnapshot {
        let guard = self.lock();
        TrackerSnapshot {
            labels: guard.labels.clone(),
            issues: guard.issues.clone(),
            comments: guard.comments.clone(),
        }
    }

    fn take_failure(&self, method: &str) -> TrackerResult<()> {
        let mut guard = self.lock();
        match guard.failures.get_mut(method).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn not_found(method: &str, endpoint: String) -> TrackerError {
        TrackerError::http(method, endpoint, 404, "Not Found")
    }
}

fn insert_issue(
    state: &mut State,
    title: &str,
    body: &str,
    labels: &BTreeSet<String>,
    issue_state: IssueState,
    created_at: DateTime<Utc>,
) -> u64 {
    let number = state.next_number;
    state.next_number += 1;
    let labels = labels.iter().map(|name| spelled(state, name)).collect();
    state.issues.push(RemoteIssue {
        number,
        title: title.to_string(),
        body: body.to_string(),
        state: issue_state,
        labels,
        created_at,
    });
    number
}

/// The repository's spelling of `name`, or `name` itself when unknown.
fn spelled(state: &State, name: &str) -> String {
    state.labels.get(&label_key(name)).map_or_else(|| name.to_string(), |label| label.name.clone())
}

fn insert_comment(state: &mut State, number: u64, body: &str) -> u64 {
    let id = state.next_comment_id;
    state.next_comment_id += 1;
    state.comments.entry(number).or_default().push(Comment { id, body: body.to_string() });
    id
}

impl IssueTracker for InMemoryIssueTracker {
    fn get_label(&self, name: &str) -> TrackerResult<Option<Label>> {
        self.take_failure("get_label")?;
        Ok(self.lock().labels.get(&label_key(name)).cloned())
    }

    fn create_label(
        &self,
        name: &str,
        color: &str,
        description: Option<&str>,
    ) -> TrackerResult<Label> {
        self.take_failure("create_label")?;
        let mut guard = self.lock();
        let key = label_key(name);
        if let Some(winner_color) = guard.label_races.remove(&key) {
            let winner = Label { name: name.into(), color: winner_color, description: None };
            guard.labels.insert(key.clone(), winner);
        }
        if guard.labels.contains_key(&key) {
            return Err(TrackerError::http("POST", "/labels", 422, "already_exists"));
        }
        let label = Label {
            name: name.to_string(),
            color: color.to_string(),
            description: description.map(str::to_string),
        };
        guard.labels.insert(key, label.clone());
        guard.mutations.push(format!("create_label {name:?}"));
        Ok(label)
    }

    fn find_issue_by_title(&self, title: &str) -> TrackerResult<Option<RemoteIssue>> {
        self.take_failure("find_issue_by_title")?;
        Ok(self
            .lock()
            .issues
            .iter()
            .filter(|issue| issue.title == title)
            .min_by_key(|issue| (issue.created_at, issue.number))
            .cloned())
    }

    fn get_issue(&self, number: u64) -> TrackerResult<Option<RemoteIssue>> {
        self.take_failure("get_issue")?;
        Ok(self.issue(number))
    }

    fn create_issue(
        &self,
        title: &str,
        body: &str,
        labels: &BTreeSet<String>,
    ) -> TrackerResult<RemoteIssue> {
        self.take_failure("create_issue")?;
        let mut guard = self.lock();
        let created_at = epoch() + Duration::minutes(i64::try_from(guard.next_number).unwrap_or(0));
        let number = insert_issue(&mut guard, title, body, labels, IssueState::Open, created_at);
        guard.mutations.push(format!("create_issue {title:?}"));
        let issue = guard.issues.iter().find(|i| i.number == number).cloned();
        issue.ok_or_else(|| Self::not_found("POST", "/issues".to_string()))
    }

    fn update_issue_body(&self, number: u64, body: &str) -> TrackerResult<()> {
        self.take_failure("update_issue_body")?;
        let mut guard = self.lock();
        let issue = guard
            .issues
            .iter_mut()
            .find(|i| i.number == number)
            .ok_or_else(|| Self::not_found("PATCH", format!("/issues/{number}")))?;
        issue.body = body.to_string();
        guard.mutations.push(format!("update_issue_body #{number}"));
        Ok(())
    }

    fn add_labels(&self, number: u64, labels: &BTreeSet<String>) -> TrackerResult<()> {
        self.take_failure("add_labels")?;
        let mut guard = self.lock();
        let spellings: Vec<String> = labels.iter().map(|name| spelled(&guard, name)).collect();
        let issue = guard
            .issues
            .iter_mut()
            .find(|i| i.number == number)
            .ok_or_else(|| Self::not_found("POST", format!("/issues/{number}/labels")))?;
        for name in spellings {
            let key = label_key(&name);
            if !issue.labels.iter().any(|have| label_key(have) == key) {
                issue.labels.insert(name);
            }
        }
        guard.mutations.push(format!("add_labels #{number}"));
        Ok(())
    }

    fn list_comments(&self, number: u64) -> TrackerResult<Vec<Comment>> {
        self.take_failure("list_comments")?;
        Ok(self.comments(number))
    }

    fn create_comment(&self, number: u64, body: &str) -> TrackerResult<Comment> {
        self.take_failure("create_comment")?;
        let mut guard = self.lock();
        if !guard.issues.iter().any(|i| i.number == number) {
            return Err(Self::not_found("POST", format!("/issues/{number}/comments")));
        }
        let id = insert_comment(&mut guard, number, body);
        guard.mutations.push(format!("create_comment #{number}"));
        Ok(Comment { id, body: body.to_string() })
    }

    fn update_comment(&self, comment_id: u64, body: &str) -> TrackerResult<()> {
        self.take_failure("update_comment")?;
        let mut guard = self.lock();
        let comment = guard
            .comments
            .values_mut()
            .flat_map(|list| list.iter_mut())
            .find(|c| c.id == comment_id)
            .ok_or_else(|| Self::not_found("PATCH", format!("/issues/comments/{comment_id}")))?;
        comment.body = body.to_string();
        guard.mutations.push(format!("update_comment {comment_id}"));
        Ok(())
    }
}

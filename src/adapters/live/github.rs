//! Live adapter for the `IssueTracker` port using the GitHub REST API.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::{Method, Url};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};

use super::retry::RetryPolicy;
use crate::config::{RepoSlug, Settings};
use crate::error::{Error, Result, TrackerError};
use crate::ports::issues::{Comment, IssueState, IssueTracker, Label, RemoteIssue, TrackerResult};

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PAGE_SIZE: usize = 100;

/// Issue tracker backed by a GitHub repository.
pub struct GitHubIssueTracker {
    client: Client,
    base: Url,
    repo: RepoSlug,
    token: Option<String>,
    retry: RetryPolicy,
}

impl GitHubIssueTracker {
    /// Creates a tracker for `settings.repo` at `settings.api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the API URL is not a usable base URL or
    /// the HTTP client cannot be built.
    pub fn new(settings: &Settings) -> Result<Self> {
        let base = Url::parse(&settings.api_url)
            .map_err(|e| Error::Config(format!("invalid API URL `{}`: {e}", settings.api_url)))?;
        if base.cannot_be_a_base() {
            return Err(Error::Config(format!("API URL `{}` cannot be a base", settings.api_url)));
        }
        let client = Client::builder()
            .user_agent(concat!("epic-sync/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {e}")))?;
        if settings.token.is_none() {
            tracing::warn!("no GitHub token configured; requests are unauthenticated");
        }
        Ok(Self {
            client,
            base,
            repo: settings.repo.clone(),
            token: settings.token.clone(),
            retry: RetryPolicy::default(),
        })
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// `<base>/repos/<owner>/<name>/<segments...>` with each segment escaped.
    fn repo_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["repos", self.repo.owner.as_str(), self.repo.name.as_str()])
                .extend(segments);
        }
        url
    }

    fn request<T: DeserializeOwned>(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&serde_json::Value>,
    ) -> TrackerResult<T> {
        let what = format!("{method} {}", url.path());
        self.retry.run(&what, || self.request_once(method, url, body))
    }

    fn request_once<T: DeserializeOwned>(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&serde_json::Value>,
    ) -> TrackerResult<T> {
        let endpoint = url.path();
        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .map_err(|e| TrackerError::transport(method.as_str(), endpoint, e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .map_err(|e| TrackerError::transport(method.as_str(), endpoint, e.to_string()))?;
        tracing::debug!(method = %method, endpoint, status, "github request");

        if !(200..300).contains(&status) {
            return Err(TrackerError::http(method.as_str(), endpoint, status, error_message(&text)));
        }
        serde_json::from_str(&text).map_err(|e| {
            TrackerError::http(method.as_str(), endpoint, status, format!("unexpected response: {e}"))
        })
    }

    /// Fetches every page of a list endpoint, stopping at the first short page.
    fn paged<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
        mut visit: impl FnMut(Vec<T>),
    ) -> TrackerResult<()> {
        let mut page = 1_u32;
        loop {
            let mut url = self.repo_url(segments);
            {
                let mut pairs = url.query_pairs_mut();
                pairs.extend_pairs(query);
                pairs.append_pair("per_page", &PAGE_SIZE.to_string());
                pairs.append_pair("page", &page.to_string());
            }
            let batch: Vec<T> = self.request(&Method::GET, &url, None)?;
            let len = batch.len();
            visit(batch);
            if len < PAGE_SIZE {
                return Ok(());
            }
            page += 1;
        }
    }
}

fn not_found_as_none<T>(result: TrackerResult<T>) -> TrackerResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.status == Some(404) => Ok(None),
        Err(err) => Err(err),
    }
}

/// GitHub error bodies look like `{"message": "...", "errors": [...]}`.
fn error_message(text: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
        #[serde(default)]
        errors: Vec<serde_json::Value>,
    }

    match serde_json::from_str::<ErrorBody>(text) {
        Ok(body) if body.errors.is_empty() => body.message,
        Ok(body) => {
            let details: Vec<String> = body
                .errors
                .iter()
                .map(|e| match e.get("code").and_then(serde_json::Value::as_str) {
                    Some(code) => code.to_string(),
                    None => e.to_string(),
                })
                .collect();
            format!("{} ({})", body.message, details.join(", "))
        }
        Err(_) if text.trim().is_empty() => "empty response".to_string(),
        Err(_) => text.trim().to_string(),
    }
}

/// Earliest-created issue, lowest number on ties.
fn earliest(candidates: impl IntoIterator<Item = RemoteIssue>) -> Option<RemoteIssue> {
    candidates.into_iter().min_by_key(|issue| (issue.created_at, issue.number))
}

#[derive(Deserialize)]
struct LabelDto {
    name: String,
    color: String,
    #[serde(default)]
    description: Option<String>,
}

impl From<LabelDto> for Label {
    fn from(dto: LabelDto) -> Self {
        Self { name: dto.name, color: dto.color, description: dto.description }
    }
}

#[derive(Deserialize)]
struct LabelRef {
    name: String,
}

#[derive(Deserialize)]
struct IssueDto {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    state: IssueState,
    #[serde(default)]
    labels: Vec<LabelRef>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    pull_request: Option<IgnoredAny>,
}

impl From<IssueDto> for RemoteIssue {
    fn from(dto: IssueDto) -> Self {
        Self {
            number: dto.number,
            title: dto.title,
            body: dto.body.unwrap_or_default(),
            state: dto.state,
            labels: dto.labels.into_iter().map(|l| l.name).collect(),
            created_at: dto.created_at,
        }
    }
}

#[derive(Deserialize)]
struct CommentDto {
    id: u64,
    #[serde(default)]
    body: Option<String>,
}

impl From<CommentDto> for Comment {
    fn from(dto: CommentDto) -> Self {
        Self { id: dto.id, body: dto.body.unwrap_or_default() }
    }
}

#[derive(Serialize)]
struct NewIssue<'a> {
    title: &'a str,
    body: &'a str,
    labels: &'a BTreeSet<String>,
}

fn to_json(value: &impl Serialize) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

impl IssueTracker for GitHubIssueTracker {
    fn get_label(&self, name: &str) -> TrackerResult<Option<Label>> {
        let url = self.repo_url(&["labels", name]);
        not_found_as_none(self.request::<LabelDto>(&Method::GET, &url, None))
            .map(|found| found.map(Label::from))
    }

    fn create_label(
        &self,
        name: &str,
        color: &str,
        description: Option<&str>,
    ) -> TrackerResult<Label> {
        let url = self.repo_url(&["labels"]);
        let mut body = serde_json::json!({ "name": name, "color": color });
        if let Some(description) = description {
            body["description"] = description.into();
        }
        self.request::<LabelDto>(&Method::POST, &url, Some(&body)).map(Label::from)
    }

    /// Lists every issue in the repository, oldest first, and keeps exact
    /// title matches. Costs one request per 100 issues on each lookup.
    fn find_issue_by_title(&self, title: &str) -> TrackerResult<Option<RemoteIssue>> {
        let mut matches = Vec::new();
        self.paged::<IssueDto>(
            &["issues"],
            &[("state", "all"), ("sort", "created"), ("direction", "asc")],
            |batch| {
                matches.extend(
                    batch
                        .into_iter()
                        .filter(|dto| dto.pull_request.is_none() && dto.title == title)
                        .map(RemoteIssue::from),
                );
            },
        )?;
        if matches.len() > 1 {
            tracing::warn!(title, count = matches.len(), "several issues share this title");
        }
        Ok(earliest(matches))
    }

    fn get_issue(&self, number: u64) -> TrackerResult<Option<RemoteIssue>> {
        let url = self.repo_url(&["issues", &number.to_string()]);
        not_found_as_none(self.request::<IssueDto>(&Method::GET, &url, None))
            .map(|found| found.map(RemoteIssue::from))
    }

    fn create_issue(
        &self,
        title: &str,
        body: &str,
        labels: &BTreeSet<String>,
    ) -> TrackerResult<RemoteIssue> {
        let url = self.repo_url(&["issues"]);
        let payload = to_json(&NewIssue { title, body, labels });
        self.request::<IssueDto>(&Method::POST, &url, Some(&payload)).map(RemoteIssue::from)
    }

    fn update_issue_body(&self, number: u64, body: &str) -> TrackerResult<()> {
        let url = self.repo_url(&["issues", &number.to_string()]);
        let payload = serde_json::json!({ "body": body });
        self.request::<IgnoredAny>(&Method::PATCH, &url, Some(&payload)).map(|_| ())
    }

    fn add_labels(&self, number: u64, labels: &BTreeSet<String>) -> TrackerResult<()> {
        let url = self.repo_url(&["issues", &number.to_string(), "labels"]);
        let payload = serde_json::json!({ "labels": labels });
        self.request::<IgnoredAny>(&Method::POST, &url, Some(&payload)).map(|_| ())
    }

    fn list_comments(&self, number: u64) -> TrackerResult<Vec<Comment>> {
        let mut comments = Vec::new();
        self.paged::<CommentDto>(&["issues", &number.to_string(), "comments"], &[], |batch| {
            comments.extend(batch.into_iter().map(Comment::from));
        })?;
        Ok(comments)
    }

    fn create_comment(&self, number: u64, body: &str) -> TrackerResult<Comment> {
        let url = self.repo_url(&["issues", &number.to_string(), "comments"]);
        let payload = serde_json::json!({ "body": body });
        self.request::<CommentDto>(&Method::POST, &url, Some(&payload)).map(Comment::from)
    }

    fn update_comment(&self, comment_id: u64, body: &str) -> TrackerResult<()> {
        let url = self.repo_url(&["issues", "comments", &comment_id.to_string()]);
        let payload = serde_json::json!({ "body": body });
        self.request::<IgnoredAny>(&Method::PATCH, &url, Some(&payload)).map(|_| ())
    }
}

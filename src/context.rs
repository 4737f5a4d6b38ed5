//! Service context bundling the tracker port.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use crate::adapters::live::GitHubIssueTracker;
use crate::adapters::recording::RecordingIssueTracker;
use crate::adapters::replaying::ReplayingIssueTracker;
use crate::cassette::format::Cassette;
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::replayer::CassetteReplayer;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::ports::issues::IssueTracker;

/// Name stamped into cassettes captured by the CLI.
const SESSION_NAME: &str = "epic-sync-session";

/// Holds the tracker a command works against.
///
/// Constructors wire up different adapter implementations (live,
/// recording, replaying, or any tracker supplied by the caller).
pub struct ServiceContext {
    /// Issue tracker for labels, issues and comments.
    pub issues: Box<dyn IssueTracker>,
    /// Optional cassette recorder; written to disk on drop.
    recorder: Option<Arc<Mutex<CassetteRecorder>>>,
}

impl ServiceContext {
    /// Creates a context talking to GitHub.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the GitHub client cannot be set up.
    pub fn live(settings: &Settings) -> Result<Self> {
        Ok(Self::with_tracker(Box::new(GitHubIssueTracker::new(settings)?)))
    }

    /// Wraps `inner` so every call is captured to a cassette at `path`.
    ///
    /// The cassette is written when the context is dropped, so a run that
    /// aborts half-way still leaves its calls on disk.
    #[must_use]
    pub fn recording(inner: Box<dyn IssueTracker>, path: &Path, repo: &str) -> Self {
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(path, SESSION_NAME, repo)));
        Self {
            issues: Box::new(RecordingIssueTracker::new(inner, Arc::clone(&recorder))),
            recorder: Some(recorder),
        }
    }

    /// Creates a context that serves every tracker call from a cassette.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cassette`] if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self> {
        let cassette = Cassette::load(path).map_err(Error::Cassette)?;
        tracing::debug!(
            cassette = %path.display(),
            interactions = cassette.interactions.len(),
            "replaying tracker calls"
        );
        Ok(Self::with_tracker(Box::new(ReplayingIssueTracker::new(CassetteReplayer::new(
            &cassette,
        )))))
    }

    /// Creates a context around an arbitrary tracker.
    #[must_use]
    pub fn with_tracker(issues: Box<dyn IssueTracker>) -> Self {
        Self { issues, recorder: None }
    }
}

impl Drop for ServiceContext {
    fn drop(&mut self) {
        let Some(recorder) = self.recorder.take() else {
            return;
        };
        let guard = recorder.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.save() {
            Ok(path) => {
                tracing::info!(cassette = %path.display(), calls = guard.len(), "recording saved");
            }
            Err(e) => tracing::warn!(cassette = %guard.path().display(), error = %e, "failed to write cassette"),
        }
    }
}

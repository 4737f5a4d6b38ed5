//! Error taxonomy for loading specs, talking to the tracker and reconciling.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sync::SyncAborted;

/// A failed call against the remote issue tracker.
///
/// `status` is `None` when no HTTP response was received at all
/// (connection refused, timeout, TLS failure).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{method} {endpoint} failed ({}): {message}", describe_status(.status))]
pub struct TrackerError {
    /// HTTP method or port method name.
    pub method: String,
    /// Endpoint path that was called.
    pub endpoint: String,
    /// HTTP status, if a response came back.
    pub status: Option<u16>,
    /// Response body or transport error text.
    pub message: String,
}

#[allow(clippy::ref_option)]
fn describe_status(status: &Option<u16>) -> String {
    status.map_or_else(|| "no response".to_string(), |code| format!("HTTP {code}"))
}

impl TrackerError {
    /// Builds an error for a response with the given status.
    pub fn http(
        method: impl Into<String>,
        endpoint: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            endpoint: endpoint.into(),
            status: Some(status),
            message: message.into(),
        }
    }

    /// Builds an error for a call that never got a response.
    pub fn transport(
        method: impl Into<String>,
        endpoint: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self { method: method.into(), endpoint: endpoint.into(), status: None, message: message.into() }
    }

    /// Network failures, rate limiting and server errors are worth another attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self.status {
            None => true,
            Some(code) => code == 429 || (500..=599).contains(&code),
        }
    }

    /// GitHub answers 422 when a label with the same name already exists.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        self.status == Some(422)
    }
}

/// Markers of a managed block are present but inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("managed block {start} .. {end} is malformed: {problem}")]
pub struct MalformedBlockError {
    /// Start marker that was searched for.
    pub start: String,
    /// End marker that was searched for.
    pub end: String,
    /// What was wrong with the markers.
    pub problem: String,
}

/// Anything a single reconcile step can fail with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// The tracker call failed after retries, or with a non-retryable status.
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    /// A managed block in a body or comment needs manual repair.
    #[error(transparent)]
    MalformedBlock(#[from] MalformedBlockError),
}

/// Top-level error returned by [`crate::run`].
#[derive(Debug, Error)]
pub enum Error {
    /// The spec file could not be read.
    #[error("cannot read spec file {}: {source}", .path.display())]
    SpecFile {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The spec file was read but is not a valid Epic definition.
    #[error("invalid spec {}: {message}", .path.display())]
    SpecParse {
        /// Path of the offending spec.
        path: PathBuf,
        /// What is wrong with it.
        message: String,
    },

    /// Flags or environment are missing or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// A cassette could not be read or written.
    #[error("cassette error: {0}")]
    Cassette(String),

    /// A lookup outside the reconcile loop failed.
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// The reconciler stopped part-way through.
    #[error(transparent)]
    Aborted(Box<SyncAborted>),
}

impl From<SyncAborted> for Error {
    fn from(aborted: SyncAborted) -> Self {
        Self::Aborted(Box::new(aborted))
    }
}

impl Error {
    /// Process exit code for this error.
    ///
    /// Operator mistakes (bad spec, bad flags) exit with 2, failures while
    /// talking to the tracker exit with 1.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::SpecFile { .. } | Self::SpecParse { .. } | Self::Config(_) => 2,
            Self::Cassette(_) | Self::Tracker(_) | Self::Aborted(_) => 1,
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

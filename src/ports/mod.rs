//! Port traits defining external boundaries.
//!
//! The only boundary a sync crosses is the remote issue tracker.
//! Implementations live in `src/adapters/`.

pub mod issues;

pub use issues::{
    Comment, IssueState, IssueTracker, Label, RemoteIssue, TrackerResult, WriteOutcome,
    PENDING_ISSUE_NUMBER,
};

//! Live adapters for real external interactions.

pub mod github;
pub mod retry;

pub use github::GitHubIssueTracker;
pub use retry::RetryPolicy;

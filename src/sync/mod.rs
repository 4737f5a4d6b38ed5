//! Reconciling an Epic definition against the issue tracker.

mod epic;
mod report;

pub use epic::{sync, SyncAborted, SyncStep};
pub use report::{format_report, EntityKind, ReportEntry, SyncReport};

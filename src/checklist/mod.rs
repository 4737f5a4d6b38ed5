//! Renders the Epic checklist and the link comments.
//!
//! Everything rendered here ends up inside a managed block (see
//! [`block`]), so repeated runs overwrite their own output and nothing else.

pub mod block;

use serde::Serialize;

pub use block::{replace_managed_block, BlockMarkers};

use crate::ports::issues::IssueState;

/// Marker name of the checklist block in the Epic body.
pub const CHECKLIST_MARKER: &str = "epic-checklist";

/// Marker name of the child-links comment on the Epic.
pub const CHILD_LINKS_MARKER: &str = "epic-child-links";

/// Marker name of the back-link comment on each child.
pub const BACK_LINK_MARKER: &str = "linked-to-epic";

/// Line rendered when an Epic has no children.
pub const EMPTY_CHECKLIST_LINE: &str = "- [ ] No child issues linked yet.";

/// One child as it appears in the checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    /// Child issue title.
    pub title: String,
    /// Issue number, or `None` while the issue is only planned (dry-run).
    pub number: Option<u64>,
    /// Open or closed on the tracker.
    pub state: IssueState,
}

impl ChecklistItem {
    /// Convenience constructor.
    pub fn new(title: impl Into<String>, number: Option<u64>, state: IssueState) -> Self {
        Self { title: title.into(), number, state }
    }
}

/// Renders one checklist line per item, in input order.
///
/// `- [x] #<n> <title>` for closed issues, `- [ ] #<n> <title>` for open
/// ones and `- [ ] <title> (pending creation)` when there is no number yet.
#[must_use]
pub fn checklist_lines(items: &[ChecklistItem]) -> String {
    if items.is_empty() {
        return EMPTY_CHECKLIST_LINE.to_string();
    }
    items
        .iter()
        .map(|item| match item.number {
            Some(number) => {
                let mark = if item.state == IssueState::Closed { 'x' } else { ' ' };
                format!("- [{mark}] #{number} {}", item.title)
            }
            None => format!("- [ ] {} (pending creation)", item.title),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders the checklist wrapped in the `epic-checklist` markers.
#[must_use]
pub fn render_checklist(items: &[ChecklistItem]) -> String {
    BlockMarkers::new(CHECKLIST_MARKER).wrap(&checklist_lines(items))
}

/// Text of the back-link comment left on each child.
#[must_use]
pub fn back_link_text(epic_number: Option<u64>) -> String {
    match epic_number {
        Some(number) => format!("Linked to Epic #{number}"),
        None => "Linked to Epic (pending creation)".to_string(),
    }
}

/// Text of the child-links comment left on the Epic.
#[must_use]
pub fn child_links_text(items: &[ChecklistItem]) -> String {
    if items.is_empty() {
        return "No child issues linked yet.".to_string();
    }
    items
        .iter()
        .map(|item| match item.number {
            Some(number) => format!("- #{number} {} [{}]", item.title, item.state),
            None => format!("- {} (pending creation)", item.title),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

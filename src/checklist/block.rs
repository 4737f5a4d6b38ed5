//! Marker-delimited managed blocks inside issue bodies and comments.
//!
//! A block looks like:
//!
//! ```text
//! <!-- epic-checklist:start -->
//! ...owned by epic-sync, rewritten wholesale...
//! <!-- epic-checklist:end -->
//! ```
//!
//! Text outside the markers belongs to humans and is never touched.

use crate::error::MalformedBlockError;

/// A start/end marker pair identifying one kind of managed block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMarkers {
    /// Opening delimiter, e.g. `<!-- epic-checklist:start -->`.
    pub start: String,
    /// Closing delimiter, e.g. `<!-- epic-checklist:end -->`.
    pub end: String,
}

impl BlockMarkers {
    /// Builds the HTML-comment marker pair for `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self { start: format!("<!-- {name}:start -->"), end: format!("<!-- {name}:end -->") }
    }

    /// Wraps `content` in this marker pair, one marker per line.
    #[must_use]
    pub fn wrap(&self, content: &str) -> String {
        format!("{}\n{content}\n{}", self.start, self.end)
    }

    /// Inner text for [`replace_managed_block`] that puts `content` on its
    /// own lines between the markers.
    #[must_use]
    pub fn inner(content: &str) -> String {
        format!("\n{content}\n")
    }

    /// Whether `text` mentions either marker.
    #[must_use]
    pub fn appears_in(&self, text: &str) -> bool {
        text.contains(&self.start) || text.contains(&self.end)
    }

    /// Replaces this block's content in `text`; see [`replace_managed_block`].
    ///
    /// # Errors
    ///
    /// Returns [`MalformedBlockError`] when the markers are inconsistent.
    pub fn replace_in(&self, text: &str, content: &str) -> Result<String, MalformedBlockError> {
        replace_managed_block(text, &self.start, &self.end, &Self::inner(content))
    }
}

/// Replaces everything strictly between `marker_start` and `marker_end`
/// with `new_inner`.
///
/// - both markers present exactly once, start before end: replace
/// - neither marker present: append `marker_start + new_inner + marker_end`
///   separated from existing text by a blank line
/// - anything else: error, `original_text` is left alone
///
/// # Errors
///
/// Returns [`MalformedBlockError`] when only one marker is present, the end
/// marker comes first, or either marker occurs more than once.
pub fn replace_managed_block(
    original_text: &str,
    marker_start: &str,
    marker_end: &str,
    new_inner: &str,
) -> Result<String, MalformedBlockError> {
    let malformed = |problem: &str| MalformedBlockError {
        start: marker_start.to_string(),
        end: marker_end.to_string(),
        problem: problem.to_string(),
    };

    let starts = original_text.matches(marker_start).count();
    let ends = original_text.matches(marker_end).count();

    match (starts, ends) {
        (0, 0) => Ok(append_block(original_text, marker_start, marker_end, new_inner)),
        (1, 1) => {
            let start_at = original_text.find(marker_start).ok_or_else(|| malformed("start marker vanished"))?;
            let end_at = original_text.find(marker_end).ok_or_else(|| malformed("end marker vanished"))?;
            let inner_from = start_at + marker_start.len();
            if end_at < inner_from {
                return Err(malformed("end marker appears before start marker"));
            }
            let mut out = String::with_capacity(original_text.len() + new_inner.len());
            out.push_str(&original_text[..inner_from]);
            out.push_str(new_inner);
            out.push_str(&original_text[end_at..]);
            Ok(out)
        }
        (_, 0) => Err(malformed("start marker present without end marker")),
        (0, _) => Err(malformed("end marker present without start marker")),
        _ => Err(malformed("marker pair appears more than once")),
    }
}

fn append_block(original: &str, start: &str, end: &str, inner: &str) -> String {
    let separator = if original.is_empty() {
        ""
    } else if original.ends_with('\n') {
        "\n"
    } else {
        "\n\n"
    };
    format!("{original}{separator}{start}{inner}{end}")
}

//! Core Epic definition types.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// Label every Epic carries, whether or not the file lists it.
pub const EPIC_LABEL: &str = "epic";

/// Label every child carries, whether or not the file lists it.
pub const EPIC_CHILD_LABEL: &str = "epic-child";

/// Color for the `epic` label unless `label_colors` overrides it.
pub const DEFAULT_EPIC_COLOR: &str = "6f42c1";

/// Color for the `epic-child` label unless `label_colors` overrides it.
pub const DEFAULT_EPIC_CHILD_COLOR: &str = "c2e0c6";

/// Color for every other label unless `label_colors` overrides it.
pub const DEFAULT_LABEL_COLOR: &str = "0e8a16";

/// A child issue belonging to the Epic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildSpec {
    /// Exact issue title; identity key on the tracker.
    pub title: String,
    /// Body used when the issue is first created.
    pub body: String,
    /// Labels the issue must carry. Always contains [`EPIC_CHILD_LABEL`].
    pub labels: BTreeSet<String>,
}

/// A validated Epic definition.
///
/// Built fresh from the Epic file on every run; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpicSpec {
    /// Exact Epic title; identity key on the tracker.
    pub title: String,
    /// Body used when the Epic is first created. May already contain
    /// managed-block markers.
    pub body_template: String,
    /// Labels the Epic must carry. Always contains [`EPIC_LABEL`].
    pub labels: BTreeSet<String>,
    /// Children in the order they appear in the file.
    pub children: Vec<ChildSpec>,
    /// Per-label color overrides (hex, no leading `#`).
    pub label_colors: BTreeMap<String, String>,
}

impl EpicSpec {
    /// Every label referenced by the Epic or any child, sorted.
    #[must_use]
    pub fn all_labels(&self) -> BTreeSet<&str> {
        self.labels
            .iter()
            .chain(self.children.iter().flat_map(|child| child.labels.iter()))
            .map(String::as_str)
            .collect()
    }

    /// Color to use when a label has to be created.
    #[must_use]
    pub fn color_for<'a>(&'a self, label: &str) -> &'a str {
        if let Some(color) = self.label_colors.get(label) {
            return color;
        }
        match label {
            EPIC_LABEL => DEFAULT_EPIC_COLOR,
            EPIC_CHILD_LABEL => DEFAULT_EPIC_CHILD_COLOR,
            _ => DEFAULT_LABEL_COLOR,
        }
    }

    /// Description given to a label this tool adds on its own.
    #[must_use]
    pub fn description_for(label: &str) -> Option<&'static str> {
        match label {
            EPIC_LABEL => Some("Epic grouping issue"),
            EPIC_CHILD_LABEL => Some("Child of an Epic"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    fn sample() -> EpicSpec {
        EpicSpec {
            title: "Epic".into(),
            body_template: String::new(),
            labels: labels(&["epic", "ui"]),
            children: vec![
                ChildSpec { title: "A".into(), body: String::new(), labels: labels(&["hud", "ui"]) },
                ChildSpec { title: "B".into(), body: String::new(), labels: labels(&["audio"]) },
            ],
            label_colors: BTreeMap::from([("ui".to_string(), "1d76db".to_string())]),
        }
    }

    #[test]
    fn all_labels_is_sorted_union() {
        let spec = sample();
        let all: Vec<&str> = spec.all_labels().into_iter().collect();
        assert_eq!(all, vec!["audio", "epic", "hud", "ui"]);
    }

    #[test]
    fn color_prefers_override_then_defaults() {
        let spec = sample();
        assert_eq!(spec.color_for("ui"), "1d76db");
        assert_eq!(spec.color_for("epic"), DEFAULT_EPIC_COLOR);
        assert_eq!(spec.color_for("hud"), DEFAULT_LABEL_COLOR);
        assert_eq!(spec.color_for("epic-child"), DEFAULT_EPIC_CHILD_COLOR);
    }

    #[test]
    fn only_owned_labels_get_descriptions() {
        assert_eq!(EpicSpec::description_for("epic"), Some("Epic grouping issue"));
        assert_eq!(EpicSpec::description_for("epic-child"), Some("Child of an Epic"));
        assert_eq!(EpicSpec::description_for("ui"), None);
    }
}

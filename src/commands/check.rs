//! `epic-sync check` command.

use std::path::Path;

use crate::error::Result;
use crate::spec::{self, EpicSpec};

/// Load and validate an Epic file, printing a summary.
///
/// # Errors
///
/// Returns a spec error if the file cannot be read or is invalid.
pub fn run(config: &Path) -> Result<()> {
    let spec = spec::load(config)?;
    println!("{}", summarize(&spec));
    Ok(())
}

/// Human-readable outline of an Epic definition.
#[must_use]
pub fn summarize(spec: &EpicSpec) -> String {
    let join = |labels: &std::collections::BTreeSet<String>| {
        labels.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    };

    let mut lines = vec![
        format!("Epic \"{}\" is valid", spec.title),
        format!("  labels: {}", join(&spec.labels)),
        format!("  children ({}):", spec.children.len()),
    ];
    for child in &spec.children {
        if child.labels.is_empty() {
            lines.push(format!("    - {}", child.title));
        } else {
            lines.push(format!("    - {} [{}]", child.title, join(&child.labels)));
        }
    }
    lines.join("\n")
}

//! Reads and validates Epic definition files.
//!
//! Accepts both a flat document and one nested under a top-level `epic:`
//! key. Validation happens before anything touches the tracker.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::epic_spec::{ChildSpec, EpicSpec, EPIC_CHILD_LABEL, EPIC_LABEL};
use crate::error::{Error, Result};

/// Raw document shape, before validation.
#[derive(Debug, Default, Deserialize)]
struct EpicDocument {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    label_colors: BTreeMap<String, String>,
    #[serde(default)]
    children: Vec<ChildDocument>,
}

#[derive(Debug, Deserialize)]
struct ChildDocument {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SpecFile {
    Nested { epic: EpicDocument },
    Flat(EpicDocument),
}

/// Loads the Epic definition at `path`.
///
/// # Errors
///
/// Returns [`Error::SpecFile`] when the file cannot be read and
/// [`Error::SpecParse`] when it is not a valid Epic definition.
pub fn load(path: &Path) -> Result<EpicSpec> {
    let contents = std::fs::read_to_string(path)
        .map_err(|source| Error::SpecFile { path: path.to_path_buf(), source })?;
    parse(&contents).map_err(|message| Error::SpecParse { path: path.to_path_buf(), message })
}

/// Parses and validates an Epic definition from YAML text.
///
/// # Errors
///
/// Returns a description of the first problem found.
pub fn parse(yaml: &str) -> std::result::Result<EpicSpec, String> {
    if yaml.trim().is_empty() {
        return validate(EpicDocument::default());
    }
    let document = match serde_yaml::from_str::<SpecFile>(yaml) {
        Ok(SpecFile::Nested { epic } | SpecFile::Flat(epic)) => epic,
        Err(e) => return Err(format!("not a valid Epic document: {e}")),
    };
    validate(document)
}

fn validate(document: EpicDocument) -> std::result::Result<EpicSpec, String> {
    let title = required_title(document.title, "title")?;

    let mut labels = label_set(document.labels, "labels")?;
    insert_label(&mut labels, EPIC_LABEL);

    let mut seen = HashSet::new();
    let mut children = Vec::with_capacity(document.children.len());
    for (index, child) in document.children.into_iter().enumerate() {
        let field = format!("children[{index}].title");
        let child_title = required_title(child.title, &field)?;
        if child_title == title {
            return Err(format!("{field} `{child_title}` is the same as the Epic title"));
        }
        if !seen.insert(child_title.clone()) {
            return Err(format!("duplicate child title `{child_title}`"));
        }
        let mut child_labels = label_set(child.labels, &format!("children[{index}].labels"))?;
        insert_label(&mut child_labels, EPIC_CHILD_LABEL);
        children.push(ChildSpec {
            title: child_title,
            body: child.body.unwrap_or_default(),
            labels: child_labels,
        });
    }

    let mut label_colors = BTreeMap::new();
    for (label, color) in document.label_colors {
        label_colors.insert(label.clone(), normalize_color(&label, &color)?);
    }

    Ok(EpicSpec {
        title,
        body_template: document.body.unwrap_or_default(),
        labels,
        children,
        label_colors,
    })
}

/// GitHub trims issue titles, so the stored title is trimmed too.
fn required_title(value: Option<String>, field: &str) -> std::result::Result<String, String> {
    match value.as_deref().map(str::trim) {
        Some("") => Err(format!("`{field}` must not be blank")),
        Some(title) => Ok(title.to_string()),
        None => Err(format!("missing required field `{field}`")),
    }
}

fn label_set(labels: Vec<String>, field: &str) -> std::result::Result<BTreeSet<String>, String> {
    let mut set = BTreeSet::new();
    for label in labels {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(format!("`{field}` contains a blank label"));
        }
        insert_label(&mut set, trimmed);
    }
    Ok(set)
}

/// Label names are case-insensitive on the tracker; the first spelling wins.
fn insert_label(set: &mut BTreeSet<String>, name: &str) {
    if !set.iter().any(|have| have.to_lowercase() == name.to_lowercase()) {
        set.insert(name.to_string());
    }
}

fn normalize_color(label: &str, color: &str) -> std::result::Result<String, String> {
    let hex = color.trim().trim_start_matches('#');
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(hex.to_ascii_lowercase())
    } else {
        Err(format!("label color for `{label}` must be six hex digits, got `{color}`"))
    }
}

/// Finds the Epic file in `dir` whose title matches `title`.
///
/// Files are visited in name order; files that fail to load are skipped.
///
/// # Errors
///
/// Returns [`Error::Config`] when `dir` cannot be listed.
pub fn discover_by_title(dir: &Path, title: &str) -> Result<Option<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| Error::Config(format!("cannot list configs dir {}: {e}", dir.display())))?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().and_then(|ext| ext.to_str()).is_some_and(|ext| ext == "yml" || ext == "yaml")
        })
        .collect();
    candidates.sort();

    let wanted = title.trim();
    for path in candidates {
        match load(&path) {
            Ok(spec) if spec.title.trim() == wanted => return Ok(Some(path)),
            Ok(_) => {}
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "skipping unreadable spec"),
        }
    }
    Ok(None)
}

//! Epic definition types and the YAML loader.
//!
//! An Epic file is the local, declarative half of a sync: the title is the
//! identity key, children are kept in file order.

mod epic_spec;
mod loader;

pub use epic_spec::{
    ChildSpec, EpicSpec, DEFAULT_EPIC_CHILD_COLOR, DEFAULT_EPIC_COLOR, DEFAULT_LABEL_COLOR,
    EPIC_CHILD_LABEL, EPIC_LABEL,
};
pub use loader::{discover_by_title, load, parse};

//! Implementations of the port traits.
//!
//! `live` talks to GitHub, `memory` backs tests, `dry_run` wraps another
//! tracker, and `recording`/`replaying` capture and serve cassettes.

pub mod dry_run;
pub mod live;
pub mod memory;
pub mod recording;
pub mod replaying;

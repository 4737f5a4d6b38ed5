//! Cassette format for recording and replaying tracker interactions.
//!
//! Set `EPIC_SYNC_RECORD=<file>` to capture every tracker call of a run,
//! and `EPIC_SYNC_REPLAY=<file>` to serve a run from a capture instead of
//! the network.

pub mod format;
pub mod recorder;
pub mod replayer;

pub use format::{Cassette, Interaction};
pub use recorder::CassetteRecorder;
pub use replayer::CassetteReplayer;

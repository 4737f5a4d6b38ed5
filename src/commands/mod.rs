//! Command dispatch and handlers.

pub mod check;
pub mod sync;

use crate::cli::Command;
use crate::error::Result;

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns the handler's error; see [`crate::Error::exit_code`] for how it
/// maps to the process exit status.
pub fn dispatch(command: &Command) -> Result<()> {
    match command {
        Command::Sync(args) => sync::run(args),
        Command::Check { config } => check::run(config),
    }
}

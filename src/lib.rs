//! Core library entry for the `epic-sync` CLI.
//!
//! Keeps an Epic issue, its child issues, the checklist in the Epic body and
//! the link comments between them in line with a YAML definition.

pub mod adapters;
pub mod cassette;
pub mod checklist;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod ports;
pub mod spec;
pub mod sync;

pub use error::{Error, Result};

/// Run a parsed command line.
///
/// Loads `.env` (so it can set `RUST_LOG`), installs logging, then
/// dispatches.
///
/// # Errors
///
/// Returns the command's error; [`Error::exit_code`] gives the matching
/// process exit status.
pub fn run(cli: &cli::Cli) -> Result<()> {
    let dotenv = config::load_dotenv();
    logging::init(cli.log_level.as_deref())?;
    config::report_dotenv(&dotenv);
    commands::dispatch(&cli.command)
}

//! Binary entrypoint for the `epic-sync` CLI.

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let cli = epic_sync::cli::Cli::parse();
    match epic_sync::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

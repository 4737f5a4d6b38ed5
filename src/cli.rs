//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI parser for `epic-sync`.
#[derive(Debug, Parser)]
#[command(
    name = "epic-sync",
    version,
    about = "Synchronize an Epic issue and its child issues from a YAML definition"
)]
pub struct Cli {
    /// Log level (`info`, `debug`, ...) or a full filter directive.
    /// Defaults to `RUST_LOG`, then `info`.
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create or update the Epic, its children, checklist and link comments.
    Sync(SyncArgs),
    /// Validate an Epic definition without contacting the tracker.
    Check {
        /// Path to the Epic YAML file.
        #[arg(long, value_name = "PATH")]
        config: PathBuf,
    },
}

/// Arguments for `epic-sync sync`.
#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Path to the Epic YAML file.
    #[arg(long, value_name = "PATH", required_unless_present = "epic_number")]
    pub config: Option<PathBuf>,

    /// Sync the Epic with this issue number, locating its file by title.
    #[arg(long, value_name = "N", conflicts_with = "config")]
    pub epic_number: Option<u64>,

    /// Directory searched for Epic files with `--epic-number`.
    #[arg(long, value_name = "DIR", default_value = "configs/epics")]
    pub configs_dir: PathBuf,

    /// Target repository as OWNER/NAME. Falls back to `GITHUB_REPOSITORY`.
    #[arg(long, value_name = "OWNER/NAME")]
    pub repo: Option<String>,

    /// API token. Falls back to `GITHUB_TOKEN`, then `GH_TOKEN`.
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// API base URL. Falls back to `GITHUB_API_URL`, then api.github.com.
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Report what would change without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Capture every tracker call of this run to a cassette file.
    #[arg(long, env = "EPIC_SYNC_RECORD", value_name = "FILE", hide = true)]
    pub record: Option<PathBuf>,

    /// Serve tracker calls from a cassette file instead of the network.
    #[arg(long, env = "EPIC_SYNC_REPLAY", value_name = "FILE", hide = true, conflicts_with = "record")]
    pub replay: Option<PathBuf>,
}

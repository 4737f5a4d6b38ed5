//! `epic-sync sync` command.

use crate::adapters::live::GitHubIssueTracker;
use crate::cli::SyncArgs;
use crate::config::{Settings, SettingsFlags};
use crate::context::ServiceContext;
use crate::error::{Error, Result};
use crate::ports::issues::IssueTracker;
use crate::spec::{self, EpicSpec};
use crate::sync::{format_report, sync, SyncReport};

/// Execute the `sync` command.
///
/// With `--config` the file is validated before any tracker call. With
/// `--epic-number` the Epic is read first and its file located by title.
///
/// # Errors
///
/// Returns a spec or configuration error before anything is written, or
/// [`Error::Aborted`] after printing the partial report.
pub fn run(args: &SyncArgs) -> Result<()> {
    let preloaded = args.config.as_deref().map(spec::load).transpose()?;
    let ctx = context(args)?;
    let spec = match preloaded {
        Some(spec) => spec,
        None => locate_spec(args, ctx.issues.as_ref())?,
    };

    match sync(ctx.issues.as_ref(), &spec, args.dry_run) {
        Ok(report) => {
            print_report(&report, args.json);
            Ok(())
        }
        Err(aborted) => {
            print_report(&aborted.report, args.json);
            Err(aborted.into())
        }
    }
}

fn context(args: &SyncArgs) -> Result<ServiceContext> {
    if let Some(path) = &args.replay {
        return ServiceContext::replaying(path);
    }
    let settings = Settings::resolve(&SettingsFlags {
        repo: args.repo.as_deref(),
        token: args.token.as_deref(),
        api_url: args.api_url.as_deref(),
    })?;
    tracing::debug!(?settings, "resolved settings");
    match &args.record {
        Some(path) => {
            let live = GitHubIssueTracker::new(&settings)?;
            Ok(ServiceContext::recording(Box::new(live), path, &settings.repo.to_string()))
        }
        None => ServiceContext::live(&settings),
    }
}

fn locate_spec(args: &SyncArgs, tracker: &dyn IssueTracker) -> Result<EpicSpec> {
    let Some(number) = args.epic_number else {
        return Err(Error::Config("either --config or --epic-number is required".into()));
    };
    let epic = tracker
        .get_issue(number)?
        .ok_or_else(|| Error::Config(format!("issue #{number} does not exist")))?;
    let path = spec::discover_by_title(&args.configs_dir, &epic.title)?.ok_or_else(|| {
        Error::Config(format!(
            "no Epic file in {} has the title \"{}\" of issue #{number}",
            args.configs_dir.display(),
            epic.title
        ))
    })?;
    tracing::info!(number, path = %path.display(), "located Epic file");
    spec::load(&path)
}

fn print_report(report: &SyncReport, json: bool) {
    if json {
        match serde_json::to_string_pretty(report) {
            Ok(text) => {
                println!("{text}");
                return;
            }
            Err(e) => tracing::warn!(error = %e, "cannot render report as JSON"),
        }
    }
    println!("{}", format_report(report));
}

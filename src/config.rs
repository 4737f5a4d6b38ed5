//! Connection settings resolved from flags, environment and `.env`.
//!
//! Precedence: command-line flag, then process environment, then a `.env`
//! file in the working directory (loaded without overriding real
//! environment variables).

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Primary token variable.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";
/// Token variable consulted when [`TOKEN_ENV`] is unset.
pub const FALLBACK_TOKEN_ENV: &str = "GH_TOKEN";
/// Repository slug variable (`owner/name`).
pub const REPO_ENV: &str = "GITHUB_REPOSITORY";
/// API base URL variable.
pub const API_URL_ENV: &str = "GITHUB_API_URL";
/// API base URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// A repository identified as `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    /// Account or organization.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl FromStr for RepoSlug {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let invalid = || Error::Config(format!("invalid repo `{trimmed}`: expected OWNER/NAME"));
        let (owner, name) = trimmed.split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        Ok(Self { owner: owner.to_string(), name: name.to_string() })
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Values given on the command line, before environment fallback.
#[derive(Debug, Clone, Default)]
pub struct SettingsFlags<'a> {
    /// `--repo`
    pub repo: Option<&'a str>,
    /// `--token`
    pub token: Option<&'a str>,
    /// `--api-url`
    pub api_url: Option<&'a str>,
}

/// Everything needed to reach the tracker.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    /// Target repository.
    pub repo: RepoSlug,
    /// Bearer token; requests go unauthenticated without one.
    pub token: Option<String>,
    /// API base URL without trailing slash.
    pub api_url: String,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("repo", &self.repo)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl Settings {
    /// Resolves settings from flags and the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no repository is configured or the
    /// slug is malformed.
    pub fn resolve(flags: &SettingsFlags<'_>) -> Result<Self> {
        Self::resolve_with(flags, |key| std::env::var(key).ok())
    }

    /// Resolves settings with an explicit environment lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Settings::resolve`].
    pub fn resolve_with(
        flags: &SettingsFlags<'_>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let repo = flags
            .repo
            .map(str::to_string)
            .or_else(|| non_empty(env(REPO_ENV)))
            .ok_or_else(|| Error::Config(format!("--repo not given and {REPO_ENV} is not set")))?
            .parse()?;

        let token = flags
            .token
            .map(str::to_string)
            .or_else(|| non_empty(env(TOKEN_ENV)))
            .or_else(|| non_empty(env(FALLBACK_TOKEN_ENV)));

        let api_url = flags
            .api_url
            .map(str::to_string)
            .or_else(|| non_empty(env(API_URL_ENV)))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self { repo, token, api_url })
    }
}

/// What happened when looking for a `.env` file.
#[derive(Debug)]
pub enum DotenvStatus {
    /// Variables were loaded from this file.
    Loaded(PathBuf),
    /// No `.env` file was found.
    Absent,
    /// A `.env` file exists but could not be used.
    Unreadable(dotenvy::Error),
}

/// Loads `.env` from the working directory, if there is one.
///
/// Runs before logging is installed so `RUST_LOG` may come from `.env`;
/// pass the result to [`report_dotenv`] once the subscriber is up.
#[must_use]
pub fn load_dotenv() -> DotenvStatus {
    match dotenvy::dotenv() {
        Ok(path) => DotenvStatus::Loaded(path),
        Err(e) if e.not_found() => DotenvStatus::Absent,
        Err(e) => DotenvStatus::Unreadable(e),
    }
}

/// Logs the outcome of [`load_dotenv`].
pub fn report_dotenv(status: &DotenvStatus) {
    match status {
        DotenvStatus::Loaded(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        DotenvStatus::Absent => {}
        DotenvStatus::Unreadable(e) => tracing::warn!(error = %e, "ignoring unreadable .env"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn parses_repo_slug() {
        let slug: RepoSlug = "owner/repo".parse().unwrap();
        assert_eq!(slug.owner, "owner");
        assert_eq!(slug.name, "repo");
        assert_eq!(slug.to_string(), "owner/repo");
    }

    #[test]
    fn rejects_malformed_repo_slugs() {
        for raw in ["", "owner", "/repo", "owner/", "a/b/c"] {
            assert!(raw.parse::<RepoSlug>().is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn flags_take_precedence_over_environment() {
        let flags = SettingsFlags { repo: Some("flag/repo"), token: Some("flag-token"), api_url: None };
        let env = env_of(&[(REPO_ENV, "env/repo"), (TOKEN_ENV, "env-token")]);
        let settings = Settings::resolve_with(&flags, env).unwrap();
        assert_eq!(settings.repo.to_string(), "flag/repo");
        assert_eq!(settings.token.as_deref(), Some("flag-token"));
        assert_eq!(settings.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn environment_fills_missing_flags() {
        let env = env_of(&[
            (REPO_ENV, "env/repo"),
            (FALLBACK_TOKEN_ENV, "gh-token"),
            (API_URL_ENV, "https://ghe.example.com/api/v3/"),
        ]);
        let settings = Settings::resolve_with(&SettingsFlags::default(), env).unwrap();
        assert_eq!(settings.repo.to_string(), "env/repo");
        assert_eq!(settings.token.as_deref(), Some("gh-token"));
        assert_eq!(settings.api_url, "https://ghe.example.com/api/v3");
    }

    #[test]
    fn github_token_wins_over_gh_token() {
        let env = env_of(&[(REPO_ENV, "o/r"), (TOKEN_ENV, "primary"), (FALLBACK_TOKEN_ENV, "fallback")]);
        let settings = Settings::resolve_with(&SettingsFlags::default(), env).unwrap();
        assert_eq!(settings.token.as_deref(), Some("primary"));
    }

    #[test]
    fn missing_repo_is_a_config_error() {
        let err = Settings::resolve_with(&SettingsFlags::default(), env_of(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn debug_output_redacts_token() {
        let flags = SettingsFlags { repo: Some("o/r"), token: Some("s3cret"), api_url: None };
        let settings = Settings::resolve_with(&flags, env_of(&[])).unwrap();
        assert!(!format!("{settings:?}").contains("s3cret"));
    }
}

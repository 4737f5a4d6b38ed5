//! Tracing subscriber setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{Error, Result};

/// Filter used when neither `--log-level` nor `RUST_LOG` is given.
const DEFAULT_FILTER: &str = "epic_sync=info";

/// Builds the filter: `--log-level`, else `RUST_LOG`, else [`DEFAULT_FILTER`].
///
/// A bare level such as `debug` applies to this crate only, so HTTP client
/// internals stay quiet.
///
/// # Errors
///
/// Returns [`Error::Config`] when `level` is not a valid filter.
pub fn filter(level: Option<&str>) -> Result<EnvFilter> {
    match level {
        Some(level) => {
            let directive = if level.contains('=') || level.contains(',') {
                level.to_string()
            } else {
                level
                    .parse::<tracing::Level>()
                    .map_err(|_| Error::Config(format!("invalid log level `{level}`")))?;
                format!("epic_sync={}", level.to_ascii_lowercase())
            };
            EnvFilter::try_new(&directive)
                .map_err(|e| Error::Config(format!("invalid log level `{level}`: {e}")))
        }
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

/// Installs a compact stderr subscriber.
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
///
/// # Errors
///
/// Returns [`Error::Config`] when `level` is not a valid filter.
pub fn init(level: Option<&str>) -> Result<()> {
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false).compact();
    let _ = tracing_subscriber::registry().with(filter(level)?).with(stderr_layer).try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_levels() {
        for level in ["trace", "debug", "info", "WARN", "error"] {
            assert!(filter(Some(level)).is_ok(), "{level}");
        }
    }

    #[test]
    fn accepts_full_directives() {
        assert!(filter(Some("epic_sync=debug,reqwest=warn")).is_ok());
    }

    #[test]
    fn rejects_unknown_levels() {
        assert!(matches!(filter(Some("loud")), Err(Error::Config(_))));
    }

    #[test]
    fn init_twice_is_harmless() {
        init(Some("info")).unwrap();
        init(Some("debug")).unwrap();
    }
}

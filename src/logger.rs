//! Logging initialisation via tracing-subscriber.
//!
//! Output goes to stderr so it never interleaves with the console transcript
//! on stdout. The filter is picked once, in this order:
//!
//! 1. `-v` flags on the command line
//! 2. `RUST_LOG`, which may hold a full directive (`falcon_chat=debug,reqwest=warn`)
//! 3. `log_level` from config, already overridden by `FALCON_LOG_LEVEL`
//!
//! CLI and config values are plain level names; config validates its own
//! with [`parse_level`] at load time.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Where the active filter came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSource {
    Cli,
    RustLog,
    Config,
}

/// Pick the filter for `cli_level`, the raw `RUST_LOG` value and the
/// configured level. A blank or unparseable `RUST_LOG` is skipped.
pub fn resolve_filter(
    cli_level: Option<&str>,
    rust_log: Option<&str>,
    config_level: &str,
) -> Result<(EnvFilter, FilterSource), AppError> {
    if let Some(level) = cli_level {
        return Ok((level_filter(level)?, FilterSource::Cli));
    }

    if let Some(directive) = rust_log.map(str::trim).filter(|d| !d.is_empty()) {
        if let Ok(filter) = EnvFilter::try_new(directive) {
            return Ok((filter, FilterSource::RustLog));
        }
    }

    Ok((level_filter(config_level)?, FilterSource::Config))
}

/// Install the global subscriber. Call once, after config is loaded.
pub fn init(cli_level: Option<&str>, config_level: &str) -> Result<FilterSource, AppError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let (filter, source) = resolve_filter(cli_level, rust_log.as_deref(), config_level)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))?;

    Ok(source)
}

/// Parse a log level string into a [`LevelFilter`], rejecting unknown values.
pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    if level.is_empty() {
        return Err(AppError::Logger("log level must not be empty".into()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("unrecognised log level: '{level}'")))
}

fn level_filter(level: &str) -> Result<EnvFilter, AppError> {
    parse_level(level)?;
    Ok(EnvFilter::new(level))
}

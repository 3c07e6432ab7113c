// src/logging.rs

//! Operational logging for `tickjob`.
//!
//! `--log-level` wins when given. Otherwise `TICKJOB_LOG` is read as an
//! `EnvFilter` directive string, so both `debug` and
//! `tickjob::engine=trace,info` work. With neither, `info` is used.
//!
//! Everything goes to stderr; job output has its own sink in
//! [`crate::runlog`].

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable holding the filter directives.
pub const LOG_ENV_VAR: &str = "TICKJOB_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber. Fails if one is already set.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    fmt()
        .with_env_filter(build_filter(cli_level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("initialising logging: {e}"))?;

    Ok(())
}

/// Filter for the given CLI level, falling back to `TICKJOB_LOG` and then
/// to `info`. Unparsable directives in the variable are ignored.
pub fn build_filter(cli_level: Option<LogLevel>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(tracing::Level::from(level).as_str().to_ascii_lowercase());
    }
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

// src/cli.rs

//! CLI argument parsing using `clap`.

use std::net::SocketAddr;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `tickjob`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tickjob",
    version,
    about = "Run commands on fixed intervals and keep their latest output.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML, or JSON with a `.json` extension).
    ///
    /// Default: `tickjob.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "tickjob.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// Overrides `TICKJOB_LOG`; the default is `info`.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Serve the dashboard on this address, overriding `[config].dashboard`.
    #[arg(long, value_name = "ADDR")]
    pub dashboard: Option<SocketAddr>,

    /// Parse + validate, print the jobs, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

// src/lib.rs

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod job;
pub mod logging;
pub mod runlog;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dashboard::DashboardState;
use crate::engine::{run_ticker, Scheduler};
use crate::exec::ProcessRunner;
use crate::runlog::RunLogSink;
use crate::types::format_duration_secs;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the run log sink
/// - scheduler + process runner
/// - (optional) dashboard
/// - Ctrl-C handling
/// - the tick loop, and waiting for in-flight runs on shutdown
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    info!(path = %config_path.display(), "using configuration");

    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let sink = RunLogSink::open(cfg.config.log_file.as_deref());
    let scheduler = Scheduler::new(
        cfg.jobs.clone(),
        ProcessRunner::new(),
        sink,
        cfg.config.scheduler_options(),
    );
    let shutdown = scheduler.shutdown_token();

    let dashboard_addr = match args.dashboard {
        Some(addr) => Some(addr),
        None => cfg.config.dashboard_addr().context("parsing [config].dashboard")?,
    };

    let dashboard_handle = dashboard_addr.map(|addr| {
        let state = Arc::new(DashboardState::new(scheduler.jobs().to_vec(), cfg.clone()));
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = dashboard::serve(addr, state, shutdown).await {
                error!(error = %e, "dashboard server failed");
            }
        })
    });

    // Ctrl-C → graceful shutdown.
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl-C received; shutting down");
            shutdown.cancel();
        });
    }

    run_ticker(&scheduler, cfg.config.tick_period()).await;
    scheduler.shutdown().await;

    if let Some(handle) = dashboard_handle {
        let _ = handle.await;
    }

    info!("tickjob exiting");
    Ok(())
}

/// Simple dry-run output: print global settings and every job.
fn print_dry_run(cfg: &ConfigFile) {
    println!("tickjob dry-run");
    println!(
        "  config.tick = {} ({})",
        cfg.config.tick,
        format_duration_secs(cfg.config.tick_period())
    );
    println!("  config.history_limit = {}", cfg.config.history_limit);
    println!("  config.max_concurrent = {}", cfg.config.max_concurrent);
    if let Some(ref path) = cfg.config.log_file {
        println!("  config.log_file = {}", path.display());
    }
    println!();

    println!("jobs ({}):", cfg.jobs.len());
    for (idx, job) in cfg.jobs.iter().enumerate() {
        println!("  [{idx}] {}", job.display_name());
        println!("      command: {}", job.command_line());
        if !job.interval.is_empty() {
            println!("      interval: {}", job.interval);
        }
        if let Some(ref delay) = job.startup_delay {
            println!("      startup_delay: {delay}");
        }
        if !job.dir.is_empty() {
            println!("      dir: {}", job.dir);
        }
        if let Some(ref env_file) = job.env_file {
            println!("      env_file: {}", env_file.display());
        }
        if let Some(ref timeout) = job.timeout {
            println!("      timeout: {timeout}");
        }
        if job.disabled {
            println!("      disabled: true");
        }
    }
}

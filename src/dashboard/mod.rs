// src/dashboard/mod.rs

//! Read-only HTTP dashboard.
//!
//! Routes:
//! - `GET /`              job index
//! - `GET /logs?idx=<n>`  last run of the job at position `n`
//! - `GET /config`        the loaded configuration as TOML
//!
//! Handlers only use `JobState`'s read accessors.

pub mod views;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ConfigFile;
use crate::job::JobState;

/// Shared state behind every dashboard handler.
#[derive(Debug)]
pub struct DashboardState {
    pub jobs: Vec<Arc<JobState>>,
    pub config: ConfigFile,
}

impl DashboardState {
    pub fn new(jobs: Vec<Arc<JobState>>, config: ConfigFile) -> Self {
        Self { jobs, config }
    }
}

pub fn router(state: Arc<DashboardState>) -> Router {
    Router::new()
        .route("/", get(views::index_handler))
        .route("/logs", get(views::logs_handler))
        .route("/config", get(views::config_handler))
        .with_state(state)
}

/// Serve the dashboard on `addr` until `shutdown` fires.
pub async fn serve(
    addr: SocketAddr,
    state: Arc<DashboardState>,
    shutdown: CancellationToken,
) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding dashboard to {addr}"))?;
    info!(%addr, "dashboard listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("dashboard server")?;

    info!("dashboard stopped");
    Ok(())
}

// src/config/validate.rs

use crate::config::model::ConfigFile;
use crate::errors::{Result, TickjobError};

/// Check the invariants a config must satisfy before anything is started.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    validate_global_config(cfg)?;
    Ok(())
}

fn ensure_has_jobs(cfg: &ConfigFile) -> Result<()> {
    if cfg.jobs.is_empty() {
        return Err(TickjobError::ConfigError(
            "config must contain at least one [[job]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &ConfigFile) -> Result<()> {
    // An invalid tick is not fatal; `ConfigSection::tick_period` logs and
    // falls back to the default.

    if let Err(e) = cfg.config.dashboard_addr() {
        return Err(TickjobError::ConfigError(format!(
            "[config].dashboard must be a socket address like \"127.0.0.1:8080\" (got {:?}: {e})",
            cfg.config.dashboard.as_deref().unwrap_or_default()
        )));
    }

    Ok(())
}

// src/config/model.rs

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::SchedulerOptions;
use crate::job::JobDefinition;
use crate::types::parse_duration;

/// Tick period used when `[config].tick` is missing, zero or invalid.
pub const DEFAULT_TICK: Duration = Duration::from_secs(60);

/// Top-level configuration as read from a TOML (or JSON) file.
///
/// ```toml
/// [config]
/// tick = "1m"
/// log_file = "tickjob.log"
/// history_limit = 100
///
/// [[job]]
/// name = "backup"
/// interval = "1h"
/// command = "/usr/local/bin/backup"
/// ```
///
/// All sections are optional and have reasonable defaults; validation
/// requires at least one job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Global behaviour from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Jobs from `[[job]]`, in file order. Their positions are the indices
    /// the dashboard uses.
    #[serde(default, rename = "job", alias = "jobs")]
    pub jobs: Vec<JobDefinition>,
}

/// `[config]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSection {
    /// How often every job is checked, e.g. `"1m"` or `"30s"`.
    #[serde(default = "default_tick")]
    pub tick: String,

    /// Where the per-run output log goes. Stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// Run records kept per job; `0` keeps everything.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Simultaneous executions across all jobs; `0` means one per job.
    #[serde(default)]
    pub max_concurrent: usize,

    /// Listen address for the read-only dashboard, e.g. `"127.0.0.1:8080"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard: Option<String>,
}

fn default_tick() -> String {
    "1m".to_string()
}

fn default_history_limit() -> usize {
    100
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            tick: default_tick(),
            log_file: None,
            history_limit: default_history_limit(),
            max_concurrent: 0,
            dashboard: None,
        }
    }
}

impl ConfigSection {
    /// Effective tick period. A bad or zero value is logged and replaced by
    /// [`DEFAULT_TICK`].
    pub fn tick_period(&self) -> Duration {
        match parse_duration(&self.tick) {
            Ok(d) if !d.is_zero() => d,
            Ok(_) => {
                warn!(tick = %self.tick, "tick must be positive; using default");
                DEFAULT_TICK
            }
            Err(e) => {
                warn!(tick = %self.tick, error = %e, "invalid tick duration; using default");
                DEFAULT_TICK
            }
        }
    }

    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            history_limit: self.history_limit,
            max_concurrent: self.max_concurrent,
        }
    }

    /// Parsed dashboard address, if one is configured.
    pub fn dashboard_addr(&self) -> Result<Option<SocketAddr>, std::net::AddrParseError> {
        self.dashboard.as_deref().map(str::parse).transpose()
    }
}

impl ConfigFile {
    /// Render the configuration as TOML for display. Serialization errors
    /// are returned as the text itself.
    pub fn to_pretty_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_else(|e| e.to_string())
    }
}

// src/job/definition.rs

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One `[[job]]` entry.
///
/// ```toml
/// [[job]]
/// name = "backup"
/// interval = "1h"
/// startup_delay = "30s"
/// command = "/usr/local/bin/backup"
/// args = ["--fast"]
/// dir = "/var/backups"
/// env_file = "/etc/backup.env"
/// ```
///
/// Duration fields stay as strings here. They are parsed once when the
/// [`JobState`](crate::job::JobState) is built, and a bad value is logged
/// rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefinition {
    /// Display name; may be empty, in which case the command is shown.
    #[serde(default)]
    pub name: String,

    /// Minimum time between the starts of two runs. Empty means zero.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub interval: String,

    /// Defers the first run after startup by this long.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup_delay: Option<String>,

    /// Executable to launch. Not run through a shell.
    #[serde(default)]
    pub command: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Working directory; empty inherits the runner's.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dir: String,

    /// File of `KEY=VALUE` lines added to the child's environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_file: Option<PathBuf>,

    /// Kill the process if it runs longer than this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    #[serde(default)]
    pub disabled: bool,
}

impl JobDefinition {
    /// The name if set, otherwise the command.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.command
        } else {
            &self.name
        }
    }

    /// Command line as a single string, for logs and views.
    pub fn command_line(&self) -> String {
        let mut line = self.command.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

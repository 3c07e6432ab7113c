#![allow(dead_code)]

use tickjob::config::{ConfigFile, ConfigSection};
use tickjob::job::JobDefinition;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: ConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: ConfigFile {
                config: ConfigSection::default(),
                jobs: Vec::new(),
            },
        }
    }

    pub fn with_job(mut self, job: JobDefinition) -> Self {
        self.config.jobs.push(job);
        self
    }

    pub fn tick(mut self, tick: &str) -> Self {
        self.config.config.tick = tick.to_string();
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.config.history_limit = limit;
        self
    }

    pub fn build(self) -> ConfigFile {
        self.config
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobDefinition`.
pub struct JobDefinitionBuilder {
    job: JobDefinition,
}

impl JobDefinitionBuilder {
    pub fn new(command: &str) -> Self {
        Self {
            job: JobDefinition {
                command: command.to_string(),
                ..JobDefinition::default()
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.job.name = name.to_string();
        self
    }

    pub fn interval(mut self, interval: &str) -> Self {
        self.job.interval = interval.to_string();
        self
    }

    pub fn startup_delay(mut self, delay: &str) -> Self {
        self.job.startup_delay = Some(delay.to_string());
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.job.args.push(arg.to_string());
        self
    }

    pub fn dir(mut self, dir: &str) -> Self {
        self.job.dir = dir.to_string();
        self
    }

    pub fn env_file(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.job.env_file = Some(path.into());
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.job.timeout = Some(timeout.to_string());
        self
    }

    pub fn disabled(mut self, val: bool) -> Self {
        self.job.disabled = val;
        self
    }

    pub fn build(self) -> JobDefinition {
        self.job
    }
}

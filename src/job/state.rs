// src/job/state.rs

//! One job's run history, in-flight marker and due-check.
//!
//! A job is either Idle or Running. [`JobState::claim_if_due`] moves it from
//! Idle to Running under the same write lock that decides it is due, so two
//! concurrent evaluations can never both dispatch it. [`JobState::complete`]
//! appends the finished record and moves it back to Idle. Readers (the
//! dashboard) take the read lock and only ever see whole records.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::job::definition::JobDefinition;
use crate::job::record::{History, RunRecord};
use crate::types::{parse_duration, OutputStream};

#[derive(Debug)]
struct JobInner {
    history: History,
    in_flight: bool,
    /// Set on the first evaluation when a startup delay applies. Until the
    /// job has run once it is not due before this instant.
    deferred_until: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct JobState {
    definition: JobDefinition,
    interval: Duration,
    startup_delay: Option<Duration>,
    deadline: Option<Duration>,
    inner: RwLock<JobInner>,
}

impl JobState {
    /// Build the state for one job. Unparsable durations are logged here:
    /// a bad `interval` counts as zero, a bad `startup_delay` or `timeout`
    /// is ignored.
    pub fn new(definition: JobDefinition, history_limit: usize) -> Self {
        let name = definition.display_name().to_string();

        let interval = if definition.interval.trim().is_empty() {
            Duration::ZERO
        } else {
            match parse_duration(&definition.interval) {
                Ok(d) => d,
                Err(e) => {
                    warn!(
                        job = %name,
                        interval = %definition.interval,
                        error = %e,
                        "invalid interval; treating as zero"
                    );
                    Duration::ZERO
                }
            }
        };

        let startup_delay =
            parse_optional(&name, "startup_delay", definition.startup_delay.as_deref());
        let deadline = parse_optional(&name, "timeout", definition.timeout.as_deref());

        if definition.command.trim().is_empty() && !definition.disabled {
            warn!(job = %name, "job has an empty command and will never run");
        }

        Self {
            definition,
            interval,
            startup_delay,
            deadline,
            inner: RwLock::new(JobInner {
                history: History::new(history_limit),
                in_flight: false,
                deferred_until: None,
            }),
        }
    }

    /// Decide whether the job is due at `now` and, if so, mark it Running.
    ///
    /// Returns `true` only to the one caller that performed the Idle → Running
    /// transition; the caller must then dispatch the run and eventually call
    /// [`complete`](Self::complete).
    ///
    /// - disabled jobs and jobs with an empty command are never due;
    /// - a Running job is never due;
    /// - with history, due iff `last start + interval < now`;
    /// - without history, due immediately unless a startup delay was armed by
    ///   the first evaluation, in which case due once `now >= first + delay`.
    pub fn claim_if_due(&self, now: DateTime<Utc>, first_evaluation: bool) -> bool {
        if self.definition.disabled {
            return false;
        }
        if self.definition.command.trim().is_empty() {
            debug!(job = %self.name(), "empty command; skipping");
            return false;
        }

        let mut inner = self.inner.write();
        if inner.in_flight {
            return false;
        }

        if first_evaluation && inner.history.is_empty() && inner.deferred_until.is_none() {
            if let Some(delay) = self.startup_delay {
                let until = add_std(now, delay).unwrap_or(DateTime::<Utc>::MAX_UTC);
                debug!(job = %self.name(), until = %until.to_rfc3339(), "startup delay armed");
                inner.deferred_until = Some(until);
            }
        }

        let due = match (inner.history.last(), inner.deferred_until) {
            (Some(last), _) => match add_std(last.started_at, self.interval) {
                Some(next) => next < now,
                None => false,
            },
            (None, Some(until)) => now >= until,
            (None, None) => true,
        };

        if due {
            inner.in_flight = true;
        }
        due
    }

    /// Append a finished run and return the job to Idle.
    pub fn complete(&self, record: RunRecord) -> Arc<RunRecord> {
        let record = Arc::new(record);
        let mut inner = self.inner.write();
        inner.history.push(Arc::clone(&record));
        inner.in_flight = false;
        record
    }

    pub fn definition(&self) -> &JobDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        self.definition.display_name()
    }

    pub fn is_disabled(&self) -> bool {
        self.definition.disabled
    }

    pub fn is_running(&self) -> bool {
        self.inner.read().in_flight
    }

    /// Effective interval after parsing.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn startup_delay(&self) -> Option<Duration> {
        self.startup_delay
    }

    /// Execution deadline from `timeout`, if any.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub fn last_run(&self) -> Option<Arc<RunRecord>> {
        self.inner.read().history.last().cloned()
    }

    pub fn last_run_time(&self) -> Option<DateTime<Utc>> {
        self.inner.read().history.last().map(|r| r.started_at)
    }

    pub fn last_run_duration(&self) -> Option<Duration> {
        self.inner.read().history.last().map(|r| r.duration)
    }

    pub fn last_output(&self, stream: OutputStream) -> Option<String> {
        self.inner
            .read()
            .history
            .last()
            .map(|r| r.output_lossy(stream).into_owned())
    }

    /// Snapshot of the retained history, oldest first.
    pub fn history(&self) -> Vec<Arc<RunRecord>> {
        self.inner.read().history.iter().cloned().collect()
    }

    pub fn run_count(&self) -> usize {
        self.inner.read().history.len()
    }
}

fn parse_optional(job: &str, field: &str, value: Option<&str>) -> Option<Duration> {
    let value = value?;
    match parse_duration(value) {
        Ok(d) => Some(d),
        Err(e) => {
            warn!(job = %job, field, value = %value, error = %e, "invalid duration; ignoring");
            None
        }
    }
}

fn add_std(at: DateTime<Utc>, d: Duration) -> Option<DateTime<Utc>> {
    TimeDelta::from_std(d)
        .ok()
        .and_then(|delta| at.checked_add_signed(delta))
}

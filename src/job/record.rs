// src/job/record.rs

use std::borrow::Cow;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::types::OutputStream;

/// How a single execution ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    /// The process ran and exited with a non-zero status. `-1` when it was
    /// terminated by a signal and has no exit code.
    NonZeroExit(i32),
    /// The process could not be started, or was stopped before it exited
    /// (`"cancelled"`, `"deadline exceeded"`).
    LaunchFailure(String),
}

impl RunOutcome {
    pub fn launch_failure(reason: impl Into<String>) -> Self {
        RunOutcome::LaunchFailure(reason.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success)
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Success => f.write_str("success"),
            RunOutcome::NonZeroExit(code) => write!(f, "exit status {code}"),
            RunOutcome::LaunchFailure(reason) => write!(f, "launch failure: {reason}"),
        }
    }
}

/// Immutable record of one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub outcome: RunOutcome,
}

impl RunRecord {
    /// A record for a run that never produced output.
    pub fn failed_launch(
        started_at: DateTime<Utc>,
        duration: Duration,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            started_at,
            duration,
            stdout: Vec::new(),
            stderr: Vec::new(),
            outcome: RunOutcome::launch_failure(reason),
        }
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        TimeDelta::from_std(self.duration)
            .ok()
            .and_then(|d| self.started_at.checked_add_signed(d))
            .unwrap_or(self.started_at)
    }

    pub fn output(&self, stream: OutputStream) -> &[u8] {
        match stream {
            OutputStream::Stdout => &self.stdout,
            OutputStream::Stderr => &self.stderr,
        }
    }

    /// Captured output decoded as UTF-8, replacing invalid sequences.
    pub fn output_lossy(&self, stream: OutputStream) -> Cow<'_, str> {
        String::from_utf8_lossy(self.output(stream))
    }
}

/// Append-only run history with an optional retention cap.
///
/// With a cap of `n`, only the newest `n` records are kept and the oldest is
/// evicted on overflow. Insertion order is chronological order.
#[derive(Debug, Clone, Default)]
pub struct History {
    records: VecDeque<Arc<RunRecord>>,
    limit: Option<usize>,
}

impl History {
    /// `limit == 0` keeps every record.
    pub fn new(limit: usize) -> Self {
        Self {
            records: VecDeque::new(),
            limit: (limit > 0).then_some(limit),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(0)
    }

    pub fn push(&mut self, record: Arc<RunRecord>) {
        if let Some(limit) = self.limit {
            while self.records.len() >= limit {
                self.records.pop_front();
            }
        }
        self.records.push_back(record);
    }

    pub fn last(&self) -> Option<&Arc<RunRecord>> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<RunRecord>> {
        self.records.iter()
    }
}

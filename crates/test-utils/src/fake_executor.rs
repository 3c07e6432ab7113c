use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use tickjob::exec::{Executor, RunRequest};
use tickjob::job::{RunOutcome, RunRecord};

/// A fake executor that:
/// - records every request it was asked to run
/// - immediately returns a record with the configured outcome and stdout.
#[derive(Clone)]
pub struct FakeExecutor {
    requests: Arc<Mutex<Vec<RunRequest>>>,
    outcome: RunOutcome,
    stdout: Vec<u8>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            outcome: RunOutcome::Success,
            stdout: Vec::new(),
        }
    }

    pub fn with_outcome(mut self, outcome: RunOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn with_stdout(mut self, stdout: &str) -> Self {
        self.stdout = stdout.as_bytes().to_vec();
        self
    }

    /// Shared handle to the recorded requests; stays valid after the
    /// executor is moved into a scheduler.
    pub fn requests(&self) -> Arc<Mutex<Vec<RunRequest>>> {
        Arc::clone(&self.requests)
    }
}

impl Default for FakeExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for FakeExecutor {
    fn execute(
        &self,
        request: RunRequest,
        _cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = RunRecord> + Send + '_>> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(request);
            RunRecord {
                started_at: Utc::now(),
                duration: Duration::ZERO,
                stdout: self.stdout.clone(),
                stderr: Vec::new(),
                outcome: self.outcome.clone(),
            }
        })
    }
}

/// Counters shared between a [`GatedExecutor`] and the test.
#[derive(Default)]
pub struct GateStats {
    pub started: AtomicUsize,
    pub running: AtomicUsize,
    pub peak: AtomicUsize,
}

/// An executor whose runs block until the test releases them.
///
/// Each run waits for one permit from `release`, or returns
/// `LaunchFailure("cancelled")` if its token fires first.
#[derive(Clone)]
pub struct GatedExecutor {
    gate: Arc<Semaphore>,
    stats: Arc<GateStats>,
}

impl GatedExecutor {
    pub fn new() -> Self {
        Self {
            gate: Arc::new(Semaphore::new(0)),
            stats: Arc::new(GateStats::default()),
        }
    }

    /// Let `n` blocked (or future) runs finish.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn stats(&self) -> Arc<GateStats> {
        Arc::clone(&self.stats)
    }
}

impl Default for GatedExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for GatedExecutor {
    fn execute(
        &self,
        _request: RunRequest,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = RunRecord> + Send + '_>> {
        Box::pin(async move {
            let started_at = Utc::now();
            self.stats.started.fetch_add(1, Ordering::SeqCst);
            let now_running = self.stats.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.stats.peak.fetch_max(now_running, Ordering::SeqCst);

            let outcome = tokio::select! {
                permit = self.gate.acquire() => {
                    if let Ok(permit) = permit {
                        permit.forget();
                    }
                    RunOutcome::Success
                }
                _ = cancel.cancelled() => RunOutcome::launch_failure("cancelled"),
            };

            self.stats.running.fetch_sub(1, Ordering::SeqCst);
            RunRecord {
                started_at,
                duration: (Utc::now() - started_at).to_std().unwrap_or_default(),
                stdout: Vec::new(),
                stderr: Vec::new(),
                outcome,
            }
        })
    }
}

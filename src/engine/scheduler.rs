// src/engine/scheduler.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::exec::{load_env_file, Executor, RunRequest};
use crate::job::{JobDefinition, JobState, RunRecord};
use crate::runlog::RunLogSink;

/// Knobs from `[config]` that shape the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Records kept per job; `0` keeps all of them.
    pub history_limit: usize,
    /// Simultaneous executions across all jobs; `0` means one per job.
    pub max_concurrent: usize,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            history_limit: 100,
            max_concurrent: 0,
        }
    }
}

/// Owns every job and dispatches the due ones on each tick.
///
/// `tick` only evaluates due-checks; each claimed job runs as its own
/// tracked Tokio task, so a slow job never holds up the next tick. All runs
/// share a shutdown token: cancelling it kills in-flight processes and stops
/// further dispatch.
pub struct Scheduler<E: Executor> {
    jobs: Vec<Arc<JobState>>,
    executor: Arc<E>,
    sink: RunLogSink,
    tracker: TaskTracker,
    shutdown: CancellationToken,
    permits: Option<Arc<Semaphore>>,
}

impl<E: Executor> std::fmt::Debug for Scheduler<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("jobs", &self.jobs.len())
            .field("in_flight", &self.tracker.len())
            .finish_non_exhaustive()
    }
}

impl<E: Executor> Scheduler<E> {
    pub fn new(
        definitions: Vec<JobDefinition>,
        executor: E,
        sink: RunLogSink,
        options: SchedulerOptions,
    ) -> Self {
        let jobs = definitions
            .into_iter()
            .map(|def| Arc::new(JobState::new(def, options.history_limit)))
            .collect();
        let permits =
            (options.max_concurrent > 0).then(|| Arc::new(Semaphore::new(options.max_concurrent)));

        Self {
            jobs,
            executor: Arc::new(executor),
            sink,
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
            permits,
        }
    }

    pub fn jobs(&self) -> &[Arc<JobState>] {
        &self.jobs
    }

    pub fn job(&self, idx: usize) -> Option<&Arc<JobState>> {
        self.jobs.get(idx)
    }

    /// Token that stops the tick loop and cancels running jobs.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Number of executions currently dispatched and not yet recorded.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Evaluate every job once and dispatch the due ones.
    ///
    /// Returns the indices of the dispatched jobs. Never waits on a running
    /// job. Once shutdown has begun nothing is dispatched.
    pub fn tick(&self, now: DateTime<Utc>, first_evaluation: bool) -> Vec<usize> {
        if self.shutdown.is_cancelled() {
            debug!("shutdown in progress; not dispatching");
            return Vec::new();
        }

        let mut dispatched = Vec::new();
        for (idx, job) in self.jobs.iter().enumerate() {
            if job.claim_if_due(now, first_evaluation) {
                info!(job = %job.name(), idx, "triggered");
                self.dispatch(Arc::clone(job));
                dispatched.push(idx);
            }
        }
        dispatched
    }

    fn dispatch(&self, job: Arc<JobState>) {
        let executor = Arc::clone(&self.executor);
        let sink = self.sink.clone();
        let cancel = self.shutdown.child_token();
        let permits = self.permits.clone();

        self.tracker.spawn(async move {
            let _permit = match permits {
                Some(sem) => tokio::select! {
                    permit = sem.acquire_owned() => permit.ok(),
                    _ = cancel.cancelled() => None,
                },
                None => None,
            };

            let request = resolve_request(&job).await;
            let record = executor.execute(request, cancel).await;
            log_completion(&job, &record);
            sink.write_record(&job.definition().command, &record);
            job.complete(record);
        });
    }

    /// Wait for every dispatched run to be recorded, without shutting down.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Cancel running jobs, stop dispatching and wait until every in-flight
    /// run has been recorded.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.tracker.close();
        debug!(in_flight = self.tracker.len(), "waiting for in-flight runs");
        self.tracker.wait().await;
        info!("all in-flight runs finished");
    }
}

/// Build the request for a job, adding its environment file if it has one.
/// An unreadable file is logged and the job runs with the base environment.
async fn resolve_request(job: &JobState) -> RunRequest {
    let definition = job.definition();
    let mut request = RunRequest::from_definition(definition, job.deadline());

    if let Some(path) = &definition.env_file {
        match load_env_file(path).await {
            Ok(vars) => {
                debug!(job = %job.name(), path = %path.display(), vars = vars.len(), "loaded environment file");
                request.env.extend(vars);
            }
            Err(e) => {
                warn!(
                    job = %job.name(),
                    path = %path.display(),
                    error = %e,
                    "error reading environment file; using base environment"
                );
            }
        }
    }

    request
}

fn log_completion(job: &JobState, record: &RunRecord) {
    if record.outcome.is_success() {
        info!(
            job = %job.name(),
            elapsed_ms = record.duration.as_millis() as u64,
            "run finished"
        );
    } else {
        warn!(
            job = %job.name(),
            outcome = %record.outcome,
            elapsed_ms = record.duration.as_millis() as u64,
            "run failed"
        );
    }
}

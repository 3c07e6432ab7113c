// src/exec/backend.rs

//! Pluggable executor abstraction.
//!
//! The scheduler talks to an `Executor` instead of spawning processes
//! itself. Production uses [`ProcessRunner`]; tests can provide their own
//! implementation that records requests and returns canned records.

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::exec::runner::{ProcessRunner, RunRequest};
use crate::job::RunRecord;

/// Trait abstracting how a single job run is executed.
pub trait Executor: Send + Sync + 'static {
    /// Execute one request to completion.
    ///
    /// Implementations must not fail: every problem is reported through the
    /// returned record's outcome. When `cancel` fires the run should stop and
    /// report `LaunchFailure("cancelled")`.
    fn execute(
        &self,
        request: RunRequest,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = RunRecord> + Send + '_>>;
}

impl Executor for ProcessRunner {
    fn execute(
        &self,
        request: RunRequest,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = RunRecord> + Send + '_>> {
        Box::pin(self.run(request, cancel))
    }
}

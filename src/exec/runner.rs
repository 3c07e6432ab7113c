// src/exec/runner.rs

//! Single-process runner with fully buffered output.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::job::{JobDefinition, RunOutcome, RunRecord};

/// Set to `1` in every child's environment so jobs can tell they were
/// launched by tickjob.
pub const LAUNCH_MARKER_VAR: &str = "TICKJOB_EXEC";

/// How long to keep draining a pipe after the process is gone. A grandchild
/// that inherited the pipe can hold it open indefinitely.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Everything needed to launch one process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
    pub command: String,
    pub args: Vec<String>,
    /// `None` inherits the runner's working directory.
    pub working_dir: Option<PathBuf>,
    /// Added on top of the inherited environment, in order.
    pub env: Vec<(String, String)>,
    pub deadline: Option<Duration>,
}

impl RunRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            env: vec![(LAUNCH_MARKER_VAR.to_string(), "1".to_string())],
            ..Default::default()
        }
    }

    /// Request for a job, before its environment file is resolved.
    pub fn from_definition(definition: &JobDefinition, deadline: Option<Duration>) -> Self {
        let mut request = Self::new(definition.command.clone());
        request.args = definition.args.clone();
        if !definition.dir.is_empty() {
            request.working_dir = Some(PathBuf::from(&definition.dir));
        }
        request.deadline = deadline;
        request
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Launches a command as a child process and records the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run the request to completion and describe what happened.
    ///
    /// Never fails: spawn errors, cancellation and deadline expiry all end up
    /// in the record's outcome. The child is killed if `cancel` fires or the
    /// deadline passes first. `duration` spans spawn to exit (or kill), and
    /// stdout/stderr hold everything the child wrote until then.
    pub async fn run(&self, request: RunRequest, cancel: CancellationToken) -> RunRecord {
        let started_at = Utc::now();
        let clock = Instant::now();

        if request.command.trim().is_empty() {
            return RunRecord::failed_launch(started_at, clock.elapsed(), "empty command");
        }
        if cancel.is_cancelled() {
            return RunRecord::failed_launch(started_at, clock.elapsed(), "cancelled");
        }

        let mut cmd = Command::new(&request.command);
        cmd.args(&request.args)
            .envs(request.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &request.working_dir {
            cmd.current_dir(dir);
        }

        info!(cmd = %request.command, args = ?request.args, "starting process");

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(cmd = %request.command, error = %e, "failed to launch process");
                return RunRecord::failed_launch(started_at, clock.elapsed(), e.to_string());
            }
        };

        let stdout = Capture::spawn(child.stdout.take());
        let stderr = Capture::spawn(child.stderr.take());

        let deadline = async {
            match request.deadline {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending::<()>().await,
            }
        };

        let outcome = tokio::select! {
            status = child.wait() => match status {
                Ok(status) => outcome_from_status(status),
                Err(e) => RunOutcome::launch_failure(format!("waiting for process: {e}")),
            },
            _ = cancel.cancelled() => {
                info!(cmd = %request.command, "cancellation requested; killing process");
                terminate(&mut child, &request.command).await;
                RunOutcome::launch_failure("cancelled")
            }
            _ = deadline => {
                warn!(cmd = %request.command, deadline = ?request.deadline, "deadline exceeded; killing process");
                terminate(&mut child, &request.command).await;
                RunOutcome::launch_failure("deadline exceeded")
            }
        };
        let duration = clock.elapsed();

        info!(
            cmd = %request.command,
            outcome = %outcome,
            elapsed_ms = duration.as_millis() as u64,
            "process finished"
        );

        RunRecord {
            started_at,
            duration,
            stdout: stdout.finish().await,
            stderr: stderr.finish().await,
            outcome,
        }
    }
}

fn outcome_from_status(status: ExitStatus) -> RunOutcome {
    if status.success() {
        RunOutcome::Success
    } else {
        RunOutcome::NonZeroExit(status.code().unwrap_or(-1))
    }
}

async fn terminate(child: &mut Child, cmd: &str) {
    if let Err(e) = child.kill().await {
        warn!(cmd = %cmd, error = %e, "failed to kill child process");
    }
}

/// Background reader that drains one pipe into a shared buffer, so whatever
/// arrived is still available if the reader has to be abandoned.
struct Capture {
    buf: Arc<Mutex<Vec<u8>>>,
    handle: Option<JoinHandle<()>>,
}

impl Capture {
    fn spawn<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let handle = pipe.map(|mut pipe| {
            let buf = Arc::clone(&buf);
            tokio::spawn(async move {
                let mut chunk = [0u8; 8192];
                loop {
                    match pipe.read(&mut chunk).await {
                        Ok(0) => break,
                        Ok(n) => buf.lock().extend_from_slice(&chunk[..n]),
                        Err(e) => {
                            debug!(error = %e, "reading child output failed");
                            break;
                        }
                    }
                }
            })
        });
        Self { buf, handle }
    }

    async fn finish(mut self) -> Vec<u8> {
        if let Some(mut handle) = self.handle.take() {
            if tokio::time::timeout(OUTPUT_DRAIN_GRACE, &mut handle)
                .await
                .is_err()
            {
                debug!("output pipe still open after exit; keeping what was read");
                handle.abort();
            }
        }
        std::mem::take(&mut *self.buf.lock())
    }
}

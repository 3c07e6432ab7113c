// src/runlog.rs

//! Per-run diagnostic log.
//!
//! Every completed run writes two lines, one per captured stream:
//!
//! ```text
//! [tickjob] 2026/10/19 12:00:00 command: /usr/bin/backup, time: 2026-10-19T12:00:00+00:00, stdout: "done\n"
//! [tickjob] 2026/10/19 12:00:00 command: /usr/bin/backup, time: 2026-10-19T12:00:00+00:00, stderr: ""
//! ```
//!
//! This is separate from the `tracing` output set up in [`crate::logging`].
//! The sink is a cloneable handle; both lines of a record are written under
//! one lock so concurrent jobs never interleave.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, SecondsFormat, Utc};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::job::RunRecord;
use crate::types::OutputStream;

const PREFIX: &str = "[tickjob]";

#[derive(Clone)]
pub struct RunLogSink {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl fmt::Debug for RunLogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunLogSink").finish_non_exhaustive()
    }
}

impl RunLogSink {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Discards everything.
    pub fn sink() -> Self {
        Self::new(io::sink())
    }

    /// Open the configured log file, or stdout when none is configured.
    ///
    /// An existing file is first moved aside (see [`rotate_and_create`]). If
    /// that fails the error is logged and stdout is used instead.
    pub fn open(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::stdout();
        };
        match rotate_and_create(path) {
            Ok(file) => {
                info!(path = %path.display(), "writing run log");
                Self::new(file)
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "error initializing run log; falling back to stdout"
                );
                Self::stdout()
            }
        }
    }

    /// Write the stdout and stderr lines for one finished run.
    pub fn write_record(&self, command: &str, record: &RunRecord) {
        let stamp = Local::now().format("%Y/%m/%d %H:%M:%S");
        let time = record
            .started_at
            .with_timezone(&Local)
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut writer = self.writer.lock();
        let result = [OutputStream::Stdout, OutputStream::Stderr]
            .into_iter()
            .try_for_each(|stream| {
                writeln!(
                    writer,
                    "{PREFIX} {stamp} command: {command}, time: {time}, {stream}: {:?}",
                    record.output_lossy(stream)
                )
            })
            .and_then(|_| writer.flush());

        if let Err(e) = result {
            warn!(command = %command, error = %e, "failed to write run log");
        }
    }
}

/// Create `path` fresh, first renaming an existing file to
/// `<path>.<unix-millis>`.
pub fn rotate_and_create(path: &Path) -> io::Result<File> {
    if path.exists() {
        let rotated = rotated_path(path, Utc::now().timestamp_millis());
        fs::rename(path, &rotated)?;
        info!(from = %path.display(), to = %rotated.display(), "rotated previous run log");
    }
    File::create(path)
}

fn rotated_path(path: &Path, millis: i64) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{millis}"));
    PathBuf::from(name)
}

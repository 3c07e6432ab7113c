// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running job commands, using
//! `tokio::process::Command`, and turning each run into a `RunRecord`.
//!
//! - [`runner`] launches one process and captures its output.
//! - [`env_file`] reads the optional per-job `KEY=VALUE` file.
//! - [`backend`] provides the `Executor` trait the scheduler depends on, so
//!   tests can replace real processes with a fake.

pub mod backend;
pub mod env_file;
pub mod runner;

pub use backend::Executor;
pub use env_file::{load_env_file, parse_env};
pub use runner::{ProcessRunner, RunRequest, LAUNCH_MARKER_VAR};

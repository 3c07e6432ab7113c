// src/job/mod.rs

//! Per-job state for the periodic runner.
//!
//! - [`definition`] is the decoded, immutable job configuration.
//! - [`record`] holds the immutable [`RunRecord`] of a single execution and
//!   the bounded [`History`] a job keeps of them.
//! - [`state`] owns one job's history and in-flight marker and decides when
//!   the job is due.

pub mod definition;
pub mod record;
pub mod state;

pub use definition::JobDefinition;
pub use record::{History, RunOutcome, RunRecord};
pub use state::JobState;

// src/engine/mod.rs

//! Scheduling engine for tickjob.
//!
//! - [`scheduler`] owns every [`JobState`](crate::job::JobState), runs the
//!   due-check on each tick and dispatches due jobs as tracked tasks.
//! - [`runtime`] is the periodic driver that calls `tick` and handles
//!   shutdown.

pub mod runtime;
pub mod scheduler;

pub use runtime::run_ticker;
pub use scheduler::{Scheduler, SchedulerOptions};

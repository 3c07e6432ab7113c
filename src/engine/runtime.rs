// src/engine/runtime.rs

use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::exec::Executor;

use super::scheduler::Scheduler;

/// Shortest period the tick loop accepts; `tokio::time::interval` rejects zero.
const MIN_TICK: Duration = Duration::from_millis(1);

/// Drive `scheduler` on a fixed period until its shutdown token fires.
///
/// The first tick happens immediately and is the only one evaluated with
/// `first_evaluation = true`. Ticks that fall behind are delayed rather than
/// bunched up.
pub async fn run_ticker<E: Executor>(scheduler: &Scheduler<E>, period: Duration) {
    let shutdown = scheduler.shutdown_token();
    let mut ticker = tokio::time::interval(period.max(MIN_TICK));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(period = ?period, jobs = scheduler.jobs().len(), "tick loop started");

    let mut first_evaluation = true;
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("shutdown requested; stopping tick loop");
                break;
            }
            _ = ticker.tick() => {
                let now = Utc::now();
                let dispatched = scheduler.tick(now, first_evaluation);
                debug!(
                    time = %now.to_rfc3339(),
                    first_evaluation,
                    dispatched = ?dispatched,
                    "check complete"
                );
                first_evaluation = false;
            }
        }
    }
}

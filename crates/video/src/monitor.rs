//! The polling loop, expressed as a cancellable scheduled task rather than
//! a recursive timer chain: every tick checks the adapter's terminal state,
//! and the sleep between ticks goes through an injectable scheduler so
//! tests drive `poll()` directly without real timers.

use std::time::Duration;

use async_trait::async_trait;

use crate::adapter::{TickOutcome, VideoAdapter, POLL_PERIOD};

/// Sleep seam for the poll loop.
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn sleep(&self, period: Duration);
}

/// Production scheduler backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, period: Duration) {
        tokio::time::sleep(period).await;
    }
}

/// Drives an adapter's poll to a terminal state, sleeping one poll period
/// between ticks. Returns the terminal outcome.
pub async fn run_monitor(
    adapter: &mut (dyn VideoAdapter + '_),
    scheduler: &dyn Scheduler,
) -> TickOutcome {
    loop {
        let outcome = adapter.poll().await;
        if outcome.is_terminal() {
            return outcome;
        }
        scheduler.sleep(POLL_PERIOD).await;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

use async_trait::async_trait;

use crate::adapter::{
    threshold_reached, CompletionCallback, CompletionLatch, PlaybackEvent, TickOutcome,
    VideoAdapter,
};

/// Adapter over a native media element. Entirely event-driven: progress and
/// end notifications arrive as [`PlaybackEvent`]s, no platform API to poll.
pub struct Html5Adapter {
    threshold: f64,
    latch: CompletionLatch,
}

impl Html5Adapter {
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            latch: CompletionLatch::new(),
        }
    }
}

#[async_trait]
impl VideoAdapter for Html5Adapter {
    fn on_complete(&self, callback: CompletionCallback) {
        self.latch.on_complete(callback);
    }

    fn handle_event(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::TimeUpdate { current, duration } => {
                if !self.latch.is_completed()
                    && threshold_reached(current, duration, self.threshold)
                {
                    self.latch.fire();
                }
            }
            PlaybackEvent::Ended => {
                self.latch.fire();
            }
            PlaybackEvent::Ready => {}
        }
    }

    async fn poll(&mut self) -> TickOutcome {
        if self.latch.is_completed() {
            TickOutcome::Completed
        } else {
            TickOutcome::Continue
        }
    }

    fn is_completed(&self) -> bool {
        self.latch.is_completed()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use course_core::model::VideoId;
use course_core::time::Clock;

use crate::adapter::{
    threshold_reached, CompletionCallback, CompletionLatch, PlaybackEvent, TickOutcome,
    VideoAdapter,
};
use crate::player::{PlayerControls, YouTubeApi};

/// How long to wait for the ready notification before probing the player
/// accessors and polling anyway.
pub const READY_TIMEOUT_SECS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    WaitingReady,
    Polling,
    Aborted,
}

/// Adapter over a managed YouTube player: completes on the native ended
/// state transition or when the 1-second progress poll crosses the
/// threshold, whichever comes first.
pub struct YouTubeAdapter {
    threshold: f64,
    latch: CompletionLatch,
    player: Box<dyn PlayerControls>,
    phase: Phase,
    clock: Clock,
    ready_deadline: DateTime<Utc>,
}

impl YouTubeAdapter {
    /// Loads the control script if absent (memoized by presence check),
    /// constructs a managed player on the mount element, and begins waiting
    /// for the ready notification.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError` when the script cannot load or the player
    /// cannot be constructed.
    pub async fn attach(
        api: &dyn YouTubeApi,
        mount_id: &str,
        video_id: &VideoId,
        threshold: f64,
        clock: Clock,
    ) -> Result<Self, crate::player::PlayerError> {
        if !api.script_loaded() {
            api.load_script().await?;
        }
        let player = api.create_player(mount_id, video_id)?;
        Ok(Self {
            threshold,
            latch: CompletionLatch::new(),
            player,
            phase: Phase::WaitingReady,
            clock,
            ready_deadline: clock.now() + Duration::seconds(READY_TIMEOUT_SECS),
        })
    }

    fn measure(&mut self) -> TickOutcome {
        let reading = self
            .player
            .current_time()
            .and_then(|current| self.player.duration().map(|duration| (current, duration)));
        match reading {
            Ok((current, duration)) => {
                if threshold_reached(current, duration, self.threshold) {
                    self.latch.fire();
                    TickOutcome::Completed
                } else {
                    TickOutcome::Continue
                }
            }
            Err(err) => {
                // API access limited; leave completion to the manual action.
                log::debug!("youtube progress poll aborted: {err}");
                self.phase = Phase::Aborted;
                TickOutcome::Aborted
            }
        }
    }
}

#[async_trait]
impl VideoAdapter for YouTubeAdapter {
    fn on_complete(&self, callback: CompletionCallback) {
        self.latch.on_complete(callback);
    }

    fn handle_event(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::Ready => {
                if self.phase == Phase::WaitingReady {
                    self.phase = Phase::Polling;
                }
            }
            PlaybackEvent::Ended => {
                self.latch.fire();
            }
            // This integration has no native timeupdate; progress comes
            // from the poll.
            PlaybackEvent::TimeUpdate { .. } => {}
        }
    }

    async fn poll(&mut self) -> TickOutcome {
        if self.latch.is_completed() {
            return TickOutcome::Completed;
        }
        match self.phase {
            Phase::Aborted => TickOutcome::Aborted,
            Phase::Polling => self.measure(),
            Phase::WaitingReady => {
                if self.clock.now() < self.ready_deadline {
                    return TickOutcome::Continue;
                }
                // Ready never fired; probe the accessors and start
                // polling anyway if they respond.
                match self.player.current_time() {
                    Ok(_) => {
                        self.phase = Phase::Polling;
                        self.measure()
                    }
                    Err(err) => {
                        log::debug!("youtube player methods unavailable after timeout: {err}");
                        self.phase = Phase::Aborted;
                        TickOutcome::Aborted
                    }
                }
            }
        }
    }

    fn is_completed(&self) -> bool {
        self.latch.is_completed()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

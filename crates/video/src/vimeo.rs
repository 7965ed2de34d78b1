use async_trait::async_trait;

use crate::adapter::{
    threshold_reached, CompletionCallback, CompletionLatch, PlaybackEvent, TickOutcome,
    VideoAdapter,
};
use crate::player::{AsyncPlayerControls, VimeoApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    WaitingLoaded,
    Polling,
    Aborted,
}

/// Adapter over a Vimeo player attached to a direct-embed iframe. Completes
/// on the native ended event, on an inline timeupdate threshold check, or
/// through the same 1-second poll the YouTube variant uses — except the
/// time/duration accessors here are asynchronous.
pub struct VimeoAdapter {
    threshold: f64,
    latch: CompletionLatch,
    player: Box<dyn AsyncPlayerControls>,
    phase: Phase,
}

impl VimeoAdapter {
    /// Loads the control script if absent (memoized by presence check) and
    /// attaches a player to the iframe. Polling starts once the player
    /// reports loaded.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError` when the script cannot load or the player
    /// cannot be constructed.
    pub async fn attach(
        api: &dyn VimeoApi,
        iframe_src: &str,
        threshold: f64,
    ) -> Result<Self, crate::player::PlayerError> {
        if !api.script_loaded() {
            api.load_script().await?;
        }
        let player = api.attach_player(iframe_src)?;
        Ok(Self {
            threshold,
            latch: CompletionLatch::new(),
            player,
            phase: Phase::WaitingLoaded,
        })
    }

    async fn measure(&mut self) -> TickOutcome {
        let current = match self.player.current_time().await {
            Ok(value) => value,
            Err(err) => return self.abort(&err),
        };
        let duration = match self.player.duration().await {
            Ok(value) => value,
            Err(err) => return self.abort(&err),
        };
        if threshold_reached(current, duration, self.threshold) {
            self.latch.fire();
            TickOutcome::Completed
        } else {
            TickOutcome::Continue
        }
    }

    fn abort(&mut self, err: &crate::player::PlayerError) -> TickOutcome {
        // API access limited; leave completion to the manual action.
        log::debug!("vimeo progress poll aborted: {err}");
        self.phase = Phase::Aborted;
        TickOutcome::Aborted
    }
}

#[async_trait]
impl VideoAdapter for VimeoAdapter {
    fn on_complete(&self, callback: CompletionCallback) {
        self.latch.on_complete(callback);
    }

    fn handle_event(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::Ready => {
                if self.phase == Phase::WaitingLoaded {
                    self.phase = Phase::Polling;
                }
            }
            PlaybackEvent::Ended => {
                self.latch.fire();
            }
            // Vimeo pushes timeupdate data; check the threshold inline.
            PlaybackEvent::TimeUpdate { current, duration } => {
                if !self.latch.is_completed()
                    && current > 0.0
                    && threshold_reached(current, duration, self.threshold)
                {
                    self.latch.fire();
                }
            }
        }
    }

    async fn poll(&mut self) -> TickOutcome {
        if self.latch.is_completed() {
            return TickOutcome::Completed;
        }
        match self.phase {
            Phase::Aborted => TickOutcome::Aborted,
            // The player has not reported loaded yet; nothing to measure.
            Phase::WaitingLoaded => TickOutcome::Continue,
            Phase::Polling => self.measure().await,
        }
    }

    fn is_completed(&self) -> bool {
        self.latch.is_completed()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{InMemoryVimeoApi, ScriptedAsyncPlayer, ScriptedPlayer};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn attach_with(player: ScriptedPlayer) -> (VimeoAdapter, Arc<AtomicUsize>) {
        let api = InMemoryVimeoApi::new().with_player(Box::new(ScriptedAsyncPlayer(player)));
        let adapter = VimeoAdapter::attach(&api, "https://player.vimeo.com/video/123", 10.0)
            .await
            .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        adapter.on_complete(Box::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        (adapter, calls)
    }

    #[tokio::test]
    async fn does_not_poll_before_loaded() {
        let player = ScriptedPlayer::new(100.0, [95.0]);
        player.start_failing();
        let (mut adapter, _calls) = attach_with(player).await;

        // Accessors would fail, but they are never consulted before loaded.
        assert_eq!(adapter.poll().await, TickOutcome::Continue);
    }

    #[tokio::test]
    async fn polls_to_completion_once_loaded() {
        let player = ScriptedPlayer::new(100.0, [50.0, 92.0]);
        let (mut adapter, calls) = attach_with(player).await;

        adapter.handle_event(PlaybackEvent::Ready);
        assert_eq!(adapter.poll().await, TickOutcome::Continue);
        assert_eq!(adapter.poll().await, TickOutcome::Completed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn inline_timeupdate_requires_positive_current_time() {
        let (mut adapter, calls) = attach_with(ScriptedPlayer::new(100.0, [])).await;

        // A zero reading with a short duration must not complete.
        adapter.handle_event(PlaybackEvent::TimeUpdate {
            current: 0.0,
            duration: 5.0,
        });
        assert!(!adapter.is_completed());

        adapter.handle_event(PlaybackEvent::TimeUpdate {
            current: 92.0,
            duration: 100.0,
        });
        assert!(adapter.is_completed());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn redundant_triggers_collapse_to_one_callback() {
        let player = ScriptedPlayer::new(100.0, [95.0]);
        let (mut adapter, calls) = attach_with(player).await;

        adapter.handle_event(PlaybackEvent::Ready);
        assert_eq!(adapter.poll().await, TickOutcome::Completed);
        adapter.handle_event(PlaybackEvent::Ended);
        adapter.handle_event(PlaybackEvent::TimeUpdate {
            current: 99.0,
            duration: 100.0,
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn accessor_failure_aborts_monitoring() {
        let player = ScriptedPlayer::new(100.0, [50.0]);
        player.start_failing();
        let (mut adapter, calls) = attach_with(player).await;

        adapter.handle_event(PlaybackEvent::Ready);
        assert_eq!(adapter.poll().await, TickOutcome::Aborted);
        assert!(!adapter.is_completed());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}

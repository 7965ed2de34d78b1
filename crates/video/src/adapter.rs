use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use course_core::page::{ElementId, Page};
use course_core::time::Clock;

use crate::html5::Html5Adapter;
use crate::normalize::{self, NormalizedSource};
use crate::player::{VimeoApi, YouTubeApi};
use crate::vimeo::VimeoAdapter;
use crate::youtube::YouTubeAdapter;

/// Seconds from the end of playback at which a lesson counts as watched.
pub const DEFAULT_COMPLETION_THRESHOLD_SECS: f64 = 10.0;

/// Period of the platform-player progress poll.
pub const POLL_PERIOD: Duration = Duration::from_secs(1);

//
// ─── COMPLETION CONTRACT ───────────────────────────────────────────────────────
//

/// Normalized notification from an embedded player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    TimeUpdate { current: f64, duration: f64 },
    Ended,
    Ready,
}

/// Result of one poll tick. `Completed` and `Aborted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Completed,
    Aborted,
}

impl TickOutcome {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TickOutcome::Continue)
    }
}

pub type CompletionCallback = Box<dyn Fn() + Send + Sync>;

/// At-most-once completion gate shared by every event source feeding one
/// adapter: redundant triggers (threshold poll racing a native ended event)
/// collapse to a single callback invocation.
#[derive(Default)]
pub struct CompletionLatch {
    completed: AtomicBool,
    callback: Mutex<Option<CompletionCallback>>,
}

impl CompletionLatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the completion callback. A later registration replaces an
    /// earlier one; there is only one slot.
    pub fn on_complete(&self, callback: CompletionCallback) {
        if let Ok(mut slot) = self.callback.lock() {
            *slot = Some(callback);
        }
    }

    /// Trips the latch. The first call invokes the registered callback;
    /// every later call is a no-op. Returns whether this call tripped it.
    pub fn fire(&self) -> bool {
        if self.completed.swap(true, Ordering::SeqCst) {
            return false;
        }
        if let Ok(slot) = self.callback.lock() {
            if let Some(callback) = slot.as_ref() {
                callback();
            }
        }
        true
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }
}

/// `duration − current ≤ threshold`, guarded against unloaded metadata.
#[must_use]
pub fn threshold_reached(current: f64, duration: f64, threshold: f64) -> bool {
    duration > 0.0 && duration - current <= threshold
}

//
// ─── ADAPTER CONTRACT ──────────────────────────────────────────────────────────
//

/// Uniform capability over one embedded player: register a completion
/// callback, push native events in, and tick the platform poll.
#[async_trait]
pub trait VideoAdapter: Send {
    /// Registers the single completion callback.
    fn on_complete(&self, callback: CompletionCallback);

    /// Feeds a native player notification into the adapter.
    fn handle_event(&mut self, event: PlaybackEvent);

    /// One poll tick against the platform API. Event-only adapters report
    /// their latch state; polling adapters read time/duration and may
    /// terminate with `Aborted` on API failure.
    async fn poll(&mut self) -> TickOutcome;

    fn is_completed(&self) -> bool;
}

//
// ─── SELECTION ─────────────────────────────────────────────────────────────────
//

/// Platform API seams the adapters attach through.
#[derive(Clone)]
pub struct VideoApis {
    pub youtube: Arc<dyn YouTubeApi>,
    pub vimeo: Arc<dyn VimeoApi>,
}

/// Normalizes the wrapper's embed markup and attaches the matching adapter
/// variant. Returns `None` when no usable player can be produced; the
/// lesson stays completable through the manual action in that case.
pub async fn attach_adapter(
    page: &mut Page,
    wrapper: ElementId,
    threshold: f64,
    clock: Clock,
    apis: &VideoApis,
) -> Option<Box<dyn VideoAdapter>> {
    match normalize::normalize(page, wrapper)? {
        NormalizedSource::Html5 { .. } => {
            Some(Box::new(Html5Adapter::new(threshold)) as Box<dyn VideoAdapter>)
        }
        NormalizedSource::YouTube { mount, video_id } => {
            let mount_id = page.attr(mount, "id")?.to_owned();
            match YouTubeAdapter::attach(
                apis.youtube.as_ref(),
                &mount_id,
                &video_id,
                threshold,
                clock,
            )
            .await
            {
                Ok(adapter) => Some(Box::new(adapter) as Box<dyn VideoAdapter>),
                Err(err) => {
                    log::debug!("youtube player attach failed for {video_id}: {err}");
                    None
                }
            }
        }
        NormalizedSource::Vimeo { iframe } => {
            let src = page.attr(iframe, "src")?.to_owned();
            match VimeoAdapter::attach(apis.vimeo.as_ref(), &src, threshold).await {
                Ok(adapter) => Some(Box::new(adapter) as Box<dyn VideoAdapter>),
                Err(err) => {
                    log::debug!("vimeo player attach failed for {src}: {err}");
                    None
                }
            }
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn latch_fires_the_callback_exactly_once() {
        let latch = CompletionLatch::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        latch.on_complete(Box::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(latch.fire());
        assert!(!latch.fire());
        assert!(!latch.fire());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(latch.is_completed());
    }

    #[test]
    fn latch_without_callback_still_latches() {
        let latch = CompletionLatch::new();
        assert!(latch.fire());
        assert!(latch.is_completed());
    }

    #[test]
    fn threshold_requires_known_duration() {
        assert!(!threshold_reached(0.0, 0.0, 10.0));
        assert!(!threshold_reached(50.0, 100.0, 10.0));
        assert!(threshold_reached(90.0, 100.0, 10.0));
        assert!(threshold_reached(91.0, 100.0, 10.0));
    }
}

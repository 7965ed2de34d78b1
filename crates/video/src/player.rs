//! Seams over the third-party player control scripts.
//!
//! One platform exposes synchronous time/duration accessors, the other
//! asynchronous ones; the adapters normalize both. Script loading is
//! memoized per page: the adapter checks `script_loaded` before asking for
//! a load, and implementations are expected to load at most once.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use course_core::model::VideoId;

/// Errors surfaced by platform player integrations. Never propagated past
/// the adapter: any of these aborts monitoring for that one instance.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlayerError {
    #[error("player script failed to load: {0}")]
    ScriptLoad(String),

    #[error("player api unavailable: {0}")]
    Unavailable(String),

    #[error("player call failed: {0}")]
    Api(String),
}

/// Synchronous time/duration surface (YouTube-style).
pub trait PlayerControls: Send {
    /// # Errors
    ///
    /// Returns `PlayerError` when the underlying API call throws.
    fn current_time(&self) -> Result<f64, PlayerError>;

    /// # Errors
    ///
    /// Returns `PlayerError` when the underlying API call throws.
    fn duration(&self) -> Result<f64, PlayerError>;
}

/// Asynchronous time/duration surface (Vimeo-style).
#[async_trait]
pub trait AsyncPlayerControls: Send {
    /// # Errors
    ///
    /// Returns `PlayerError` when the underlying API call rejects.
    async fn current_time(&self) -> Result<f64, PlayerError>;

    /// # Errors
    ///
    /// Returns `PlayerError` when the underlying API call rejects.
    async fn duration(&self) -> Result<f64, PlayerError>;
}

/// The YouTube control-script surface: script presence check, on-demand
/// load, and managed-player construction bound to a mount element.
#[async_trait]
pub trait YouTubeApi: Send + Sync {
    fn script_loaded(&self) -> bool;

    /// # Errors
    ///
    /// Returns `PlayerError::ScriptLoad` when the control script cannot be
    /// fetched.
    async fn load_script(&self) -> Result<(), PlayerError>;

    /// # Errors
    ///
    /// Returns `PlayerError` when the player cannot be constructed.
    fn create_player(
        &self,
        mount_id: &str,
        video_id: &VideoId,
    ) -> Result<Box<dyn PlayerControls>, PlayerError>;
}

/// The Vimeo control-script surface: the player attaches to an existing
/// direct-embed iframe rather than a mount element.
#[async_trait]
pub trait VimeoApi: Send + Sync {
    fn script_loaded(&self) -> bool;

    /// # Errors
    ///
    /// Returns `PlayerError::ScriptLoad` when the control script cannot be
    /// fetched.
    async fn load_script(&self) -> Result<(), PlayerError>;

    /// # Errors
    ///
    /// Returns `PlayerError` when the player cannot be constructed.
    fn attach_player(&self, iframe_src: &str) -> Result<Box<dyn AsyncPlayerControls>, PlayerError>;
}

//
// ─── IN-MEMORY IMPLEMENTATIONS (tests and prototyping) ─────────────────────────
//

/// Player serving a fixed duration and a queue of current-time readings;
/// once the queue drains, the last reading repeats. Can be switched into a
/// failing mode to exercise the abort path.
pub struct ScriptedPlayer {
    duration: f64,
    times: Mutex<VecDeque<f64>>,
    last: Mutex<f64>,
    failing: AtomicBool,
}

impl ScriptedPlayer {
    #[must_use]
    pub fn new(duration: f64, times: impl IntoIterator<Item = f64>) -> Self {
        Self {
            duration,
            times: Mutex::new(times.into_iter().collect()),
            last: Mutex::new(0.0),
            failing: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent accessor call fail.
    pub fn start_failing(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn next_time(&self) -> Result<f64, PlayerError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PlayerError::Api("scripted failure".into()));
        }
        let mut times = self
            .times
            .lock()
            .map_err(|e| PlayerError::Api(e.to_string()))?;
        let mut last = self
            .last
            .lock()
            .map_err(|e| PlayerError::Api(e.to_string()))?;
        if let Some(next) = times.pop_front() {
            *last = next;
        }
        Ok(*last)
    }
}

impl PlayerControls for ScriptedPlayer {
    fn current_time(&self) -> Result<f64, PlayerError> {
        self.next_time()
    }

    fn duration(&self) -> Result<f64, PlayerError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PlayerError::Api("scripted failure".into()));
        }
        Ok(self.duration)
    }
}

/// Async wrapper over [`ScriptedPlayer`] for the Vimeo-style surface.
pub struct ScriptedAsyncPlayer(pub ScriptedPlayer);

#[async_trait]
impl AsyncPlayerControls for ScriptedAsyncPlayer {
    async fn current_time(&self) -> Result<f64, PlayerError> {
        self.0.current_time()
    }

    async fn duration(&self) -> Result<f64, PlayerError> {
        self.0.duration()
    }
}

/// In-memory YouTube API: hands out queued players and counts script loads
/// so tests can assert the load happens at most once.
#[derive(Default)]
pub struct InMemoryYouTubeApi {
    loaded: AtomicBool,
    load_count: AtomicUsize,
    players: Mutex<VecDeque<Box<dyn PlayerControls>>>,
}

impl InMemoryYouTubeApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_player(self, player: Box<dyn PlayerControls>) -> Self {
        if let Ok(mut players) = self.players.lock() {
            players.push_back(player);
        }
        self
    }

    #[must_use]
    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl YouTubeApi for InMemoryYouTubeApi {
    fn script_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    async fn load_script(&self) -> Result<(), PlayerError> {
        self.loaded.store(true, Ordering::SeqCst);
        self.load_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn create_player(
        &self,
        _mount_id: &str,
        video_id: &VideoId,
    ) -> Result<Box<dyn PlayerControls>, PlayerError> {
        self.players
            .lock()
            .map_err(|e| PlayerError::Api(e.to_string()))?
            .pop_front()
            .ok_or_else(|| PlayerError::Unavailable(format!("no player for {video_id}")))
    }
}

/// In-memory Vimeo API mirroring [`InMemoryYouTubeApi`].
#[derive(Default)]
pub struct InMemoryVimeoApi {
    loaded: AtomicBool,
    load_count: AtomicUsize,
    players: Mutex<VecDeque<Box<dyn AsyncPlayerControls>>>,
}

impl InMemoryVimeoApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_player(self, player: Box<dyn AsyncPlayerControls>) -> Self {
        if let Ok(mut players) = self.players.lock() {
            players.push_back(player);
        }
        self
    }

    #[must_use]
    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VimeoApi for InMemoryVimeoApi {
    fn script_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    async fn load_script(&self) -> Result<(), PlayerError> {
        self.loaded.store(true, Ordering::SeqCst);
        self.load_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn attach_player(&self, iframe_src: &str) -> Result<Box<dyn AsyncPlayerControls>, PlayerError> {
        self.players
            .lock()
            .map_err(|e| PlayerError::Api(e.to_string()))?
            .pop_front()
            .ok_or_else(|| PlayerError::Unavailable(format!("no player for {iframe_src}")))
    }
}

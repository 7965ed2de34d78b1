#![forbid(unsafe_code)]

pub mod adapter;
pub mod html5;
pub mod monitor;
pub mod normalize;
pub mod player;
pub mod vimeo;
pub mod youtube;

pub use adapter::{
    attach_adapter, threshold_reached, CompletionCallback, CompletionLatch, PlaybackEvent,
    TickOutcome, VideoAdapter, VideoApis, DEFAULT_COMPLETION_THRESHOLD_SECS, POLL_PERIOD,
};
pub use html5::Html5Adapter;
pub use monitor::{run_monitor, Scheduler, TokioScheduler};
pub use normalize::{normalize, NormalizedSource};
pub use player::{
    AsyncPlayerControls, InMemoryVimeoApi, InMemoryYouTubeApi, PlayerControls, PlayerError,
    ScriptedAsyncPlayer, ScriptedPlayer, VimeoApi, YouTubeApi,
};
pub use vimeo::VimeoAdapter;
pub use youtube::{YouTubeAdapter, READY_TIMEOUT_SECS};

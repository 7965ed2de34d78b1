#![forbid(unsafe_code)]

pub mod course;
pub mod error;
pub mod indicator;
pub mod lesson;
pub mod redirect;

pub use course::{CourseConfig, CourseModule, CourseRuntime};
pub use error::CourseError;
pub use indicator::sync_indicators;
pub use lesson::{LessonController, LessonState, Transition};
pub use redirect::{
    redirect_session_key, FilterGate, MemorySessionStore, Navigator, RecordingNavigator,
    RedirectCoordinator, RedirectOutcome, SessionStore,
};

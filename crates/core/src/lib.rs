#![forbid(unsafe_code)]

pub mod attrs;
pub mod error;
pub mod model;
pub mod page;
pub mod time;
pub mod video_source;

pub use error::Error;
pub use model::{
    CompletionError, CompletionSet, IndicatorItem, LessonId, LessonMarker, LessonProperties,
    VideoId,
};
pub use page::{Display, ElementId, Page, StyleRule};
pub use time::Clock;
pub use video_source::VideoSource;

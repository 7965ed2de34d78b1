mod completion;
pub(crate) mod ids;
mod lesson;

pub use completion::{CompletionError, CompletionSet};
pub use ids::{LessonId, VideoId};
pub use lesson::{IndicatorItem, LessonMarker, LessonProperties};

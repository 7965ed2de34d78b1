use crate::attrs;
use crate::model::ids::LessonId;
use crate::page::{ElementId, Page};

/// Identity-property configuration for one lesson group.
///
/// The completed-lessons property name can be overridden per wrapper; the
/// last-lesson property is tracked only when explicitly configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonProperties {
    pub completed_lessons: String,
    pub last_lesson: Option<String>,
}

impl LessonProperties {
    pub const DEFAULT_COMPLETED_LESSONS: &'static str = "CompletedLessons";

    #[must_use]
    pub fn from_wrapper(page: &Page, wrapper: ElementId) -> Self {
        let completed_lessons = page
            .attr(wrapper, attrs::COMPLETED_LESSONS_PROP)
            .unwrap_or(Self::DEFAULT_COMPLETED_LESSONS)
            .to_owned();
        let last_lesson = page
            .attr(wrapper, attrs::LAST_LESSON_PROP)
            .map(str::to_owned);
        Self {
            completed_lessons,
            last_lesson,
        }
    }
}

/// One lesson wrapper discovered on the page: its id, its optional action
/// affordances, and its optional autocomplete video wrapper.
#[derive(Debug, Clone)]
pub struct LessonMarker {
    pub element: ElementId,
    pub lesson_id: LessonId,
    pub mark_button: Option<ElementId>,
    pub unmark_button: Option<ElementId>,
    pub video_wrapper: Option<ElementId>,
    pub properties: LessonProperties,
}

impl LessonMarker {
    /// Finds every lesson wrapper on the page, in document order.
    #[must_use]
    pub fn discover_all(page: &Page) -> Vec<Self> {
        page.find_all(attrs::LESSON_ID)
            .into_iter()
            .filter_map(|wrapper| Self::from_wrapper(page, wrapper))
            .collect()
    }

    fn from_wrapper(page: &Page, wrapper: ElementId) -> Option<Self> {
        let lesson_id = LessonId::new(page.attr(wrapper, attrs::LESSON_ID)?);
        Some(Self {
            element: wrapper,
            lesson_id,
            mark_button: page.first_within_value(
                wrapper,
                attrs::COURSE_ELEMENT,
                attrs::ROLE_MARK_COMPLETE,
            ),
            unmark_button: page.first_within_value(
                wrapper,
                attrs::COURSE_ELEMENT,
                attrs::ROLE_UNMARK_COMPLETE,
            ),
            video_wrapper: page.first_within_value(wrapper, attrs::AUTOCOMPLETE_VIDEO, "true"),
            properties: LessonProperties::from_wrapper(page, wrapper),
        })
    }
}

/// A read-only per-item completion badge pair in a lesson list. Several may
/// reference the same lesson id.
#[derive(Debug, Clone)]
pub struct IndicatorItem {
    pub element: ElementId,
    pub lesson_id: LessonId,
    pub complete_badge: Option<ElementId>,
    pub incomplete_badge: Option<ElementId>,
}

impl IndicatorItem {
    /// Finds every list-indicator item on the page, in document order.
    #[must_use]
    pub fn discover_all(page: &Page) -> Vec<Self> {
        page.find_all(attrs::LESSON_LIST_ITEM_ID)
            .into_iter()
            .filter_map(|item| {
                let lesson_id = LessonId::new(page.attr(item, attrs::LESSON_LIST_ITEM_ID)?);
                Some(Self {
                    element: item,
                    lesson_id,
                    complete_badge: page.first_within_value(
                        item,
                        attrs::COURSE_ELEMENT,
                        attrs::ROLE_INDICATOR_COMPLETE,
                    ),
                    incomplete_badge: page.first_within_value(
                        item,
                        attrs::COURSE_ELEMENT,
                        attrs::ROLE_INDICATOR_INCOMPLETE,
                    ),
                })
            })
            .collect()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

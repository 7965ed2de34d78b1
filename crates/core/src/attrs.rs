//! Attribute vocabulary consumed by the course module.
//!
//! The host dispatcher invokes the module by name; everything else is
//! declared on the page through these attributes.

/// Handler name the module registers under with the host dispatcher.
pub const MODULE_NAME: &str = "o-course";

/// Marks a lesson wrapper and carries its lesson id.
pub const LESSON_ID: &str = "data-o-course-lessonid";

/// Role marker for course sub-elements.
pub const COURSE_ELEMENT: &str = "data-o-course-element";

pub const ROLE_MARK_COMPLETE: &str = "mark-complete";
pub const ROLE_UNMARK_COMPLETE: &str = "unmark-complete";
pub const ROLE_NEXT_LESSON: &str = "next-lesson-link";
pub const ROLE_INDICATOR_COMPLETE: &str = "lesson-list-item-complete";
pub const ROLE_INDICATOR_INCOMPLETE: &str = "lesson-list-item-incomplete";
pub const ROLE_REDIRECT: &str = "redirect";

/// Lesson id referenced by a read-only list badge item.
pub const LESSON_LIST_ITEM_ID: &str = "data-o-course-lessonlistitemid";

/// Overrides the completed-lessons property name on a lesson wrapper.
pub const COMPLETED_LESSONS_PROP: &str = "data-o-course-completedlessonsprop";

/// Opts a lesson wrapper into tracking the last completed lesson.
pub const LAST_LESSON_PROP: &str = "data-o-course-lastlessonprop";

/// Opt-in marker for video watch-through detection (`"true"`).
pub const AUTOCOMPLETE_VIDEO: &str = "data-o-course-autocompletevideo";

/// List-filter container marker (external module; only its presence and
/// settled signal matter here).
pub const LIST_ELEMENT: &str = "data-o-list-element";
pub const LIST_ROLE_LIST: &str = "list";

/// List-membership id on filterable items.
pub const LIST_ITEM_ID: &str = "data-o-list-itemid";

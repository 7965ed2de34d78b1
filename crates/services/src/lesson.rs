use std::sync::Arc;

use course_core::attrs;
use course_core::model::{CompletionSet, LessonId, LessonMarker};
use course_core::page::{Display, Page};
use identity::{IdentityService, PropertyUpdates, UserRecord};

use crate::error::CourseError;
use crate::indicator;

/// Completion state of one lesson group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonState {
    Incomplete,
    Complete,
}

/// Whether a requested transition changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    NoOp,
}

/// Per-lesson state holder: owns the completion set materialized from the
/// user record, drives identity updates, and toggles the lesson's UI
/// affordances only after an update settles.
///
/// Transitions take `&mut self` and suspend on the identity call, so each
/// lesson is single-flight by construction: a second transition cannot
/// start while one is awaiting its update.
pub struct LessonController {
    marker: LessonMarker,
    completion: CompletionSet,
    identity: Arc<dyn IdentityService>,
}

impl std::fmt::Debug for LessonController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LessonController")
            .field("marker", &self.marker)
            .field("completion", &self.completion)
            .finish_non_exhaustive()
    }
}

impl LessonController {
    /// Builds the controller from a freshly fetched user record.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::Completion` when the configured property holds
    /// malformed JSON.
    pub fn from_record(
        marker: LessonMarker,
        record: &UserRecord,
        identity: Arc<dyn IdentityService>,
    ) -> Result<Self, CourseError> {
        let completion =
            CompletionSet::from_property(record.property(&marker.properties.completed_lessons))?;
        Ok(Self {
            marker,
            completion,
            identity,
        })
    }

    #[must_use]
    pub fn lesson_id(&self) -> &LessonId {
        &self.marker.lesson_id
    }

    #[must_use]
    pub fn marker(&self) -> &LessonMarker {
        &self.marker
    }

    #[must_use]
    pub fn completion(&self) -> &CompletionSet {
        &self.completion
    }

    #[must_use]
    pub fn state(&self) -> LessonState {
        if self.completion.contains(&self.marker.lesson_id) {
            LessonState::Complete
        } else {
            LessonState::Incomplete
        }
    }

    /// Applies the UI for the state materialized from the record, plus an
    /// initial badge refresh.
    pub fn apply_initial_ui(&self, page: &mut Page) {
        match self.state() {
            LessonState::Complete => self.apply_complete_ui(page),
            LessonState::Incomplete => self.apply_incomplete_ui(page),
        }
        indicator::sync_indicators(page, &self.completion);
    }

    /// `Incomplete → Complete`, from the explicit action or a video
    /// completion signal. No-op when the lesson is already in the set.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::Identity` when the update fails; the set
    /// mutation is rolled back and the UI is left untouched.
    pub async fn mark(&mut self, page: &mut Page) -> Result<Transition, CourseError> {
        if self.completion.contains(&self.marker.lesson_id) {
            return Ok(Transition::NoOp);
        }
        let previous = self.completion.clone();
        self.completion.insert(self.marker.lesson_id.clone());

        let mut updates = PropertyUpdates::new();
        updates.set(
            &self.marker.properties.completed_lessons,
            self.completion.to_property_value(),
        );
        if let Some(last_lesson) = &self.marker.properties.last_lesson {
            updates.set(last_lesson, self.marker.lesson_id.as_str());
        }

        if let Err(err) = self.identity.update_properties(&updates).await {
            self.completion = previous;
            return Err(err.into());
        }

        self.apply_complete_ui(page);
        indicator::sync_indicators(page, &self.completion);
        Ok(Transition::Applied)
    }

    /// `Complete → Incomplete`, from the explicit action only. The
    /// last-lesson property is deliberately left untouched: it records the
    /// most recently completed lesson, not current membership.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::Identity` when the update fails; the set
    /// mutation is rolled back and the UI is left untouched.
    pub async fn unmark(&mut self, page: &mut Page) -> Result<Transition, CourseError> {
        let previous = self.completion.clone();
        if !self.completion.remove(&self.marker.lesson_id) {
            return Ok(Transition::NoOp);
        }

        let mut updates = PropertyUpdates::new();
        updates.set(
            &self.marker.properties.completed_lessons,
            self.completion.to_property_value(),
        );

        if let Err(err) = self.identity.update_properties(&updates).await {
            self.completion = previous;
            return Err(err.into());
        }

        self.apply_incomplete_ui(page);
        indicator::sync_indicators(page, &self.completion);
        Ok(Transition::Applied)
    }

    fn apply_complete_ui(&self, page: &mut Page) {
        if let Some(button) = self.marker.mark_button {
            page.set_display(button, Display::None);
        }
        if let Some(button) = self.marker.unmark_button {
            page.set_display(button, Display::InlineFlex);
        }
        set_next_lesson_affordances(page, true);
    }

    fn apply_incomplete_ui(&self, page: &mut Page) {
        if let Some(button) = self.marker.mark_button {
            page.set_display(button, Display::InlineFlex);
        }
        if let Some(button) = self.marker.unmark_button {
            page.set_display(button, Display::None);
        }
        set_next_lesson_affordances(page, false);
    }
}

/// Next-lesson affordances are page-wide, not scoped to the marker.
fn set_next_lesson_affordances(page: &mut Page, enabled: bool) {
    for element in page.find_all_with_value(attrs::COURSE_ELEMENT, attrs::ROLE_NEXT_LESSON) {
        page.set_interactive(element, enabled);
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use course_core::page::ElementId;
    use identity::{IdentityError, InMemoryIdentity};

    struct FailingIdentity;

    #[async_trait]
    impl IdentityService for FailingIdentity {
        async fn fetch_current_user(&self) -> Result<UserRecord, IdentityError> {
            Err(IdentityError::Connection("down".into()))
        }

        async fn update_properties(&self, _: &PropertyUpdates) -> Result<(), IdentityError> {
            Err(IdentityError::Connection("down".into()))
        }
    }

    fn lesson_page(lesson: &str) -> (Page, ElementId, ElementId, ElementId) {
        let mut page = Page::new();
        let body = page.create_root("body");
        let wrapper = page.append_child(body, "div");
        page.set_attr(wrapper, attrs::LESSON_ID, lesson);
        let mark = page.append_child(wrapper, "button");
        page.set_attr(mark, attrs::COURSE_ELEMENT, attrs::ROLE_MARK_COMPLETE);
        let unmark = page.append_child(wrapper, "button");
        page.set_attr(unmark, attrs::COURSE_ELEMENT, attrs::ROLE_UNMARK_COMPLETE);
        (page, wrapper, mark, unmark)
    }

    fn controller_for(
        page: &Page,
        identity: &InMemoryIdentity,
        record: &UserRecord,
    ) -> LessonController {
        let marker = LessonMarker::discover_all(page).remove(0);
        LessonController::from_record(marker, record, Arc::new(identity.clone())).unwrap()
    }

    #[tokio::test]
    async fn mark_appends_updates_and_toggles_ui_after_settle() {
        let (mut page, _wrapper, mark, unmark) = lesson_page("L2");
        let record = UserRecord::new().with_property("CompletedLessons", r#"["L1"]"#);
        let identity = InMemoryIdentity::new(record.clone());
        let mut controller = controller_for(&page, &identity, &record);
        assert_eq!(controller.state(), LessonState::Incomplete);

        let transition = controller.mark(&mut page).await.unwrap();
        assert_eq!(transition, Transition::Applied);
        assert_eq!(controller.state(), LessonState::Complete);

        let mut expected = PropertyUpdates::new();
        expected.set("CompletedLessons", r#"["L1","L2"]"#);
        assert_eq!(identity.recorded_updates(), vec![expected]);

        assert!(!page.is_visible(mark));
        assert!(page.is_visible(unmark));
    }

    #[tokio::test]
    async fn mark_is_idempotent_with_one_update_total() {
        let (mut page, _wrapper, _mark, _unmark) = lesson_page("L2");
        let record = UserRecord::new();
        let identity = InMemoryIdentity::new(record.clone());
        let mut controller = controller_for(&page, &identity, &record);

        assert_eq!(controller.mark(&mut page).await.unwrap(), Transition::Applied);
        assert_eq!(controller.mark(&mut page).await.unwrap(), Transition::NoOp);
        assert_eq!(identity.recorded_updates().len(), 1);
        assert_eq!(controller.completion().len(), 1);
    }

    #[tokio::test]
    async fn unmark_sends_empty_string_when_set_drains() {
        let (mut page, _wrapper, mark, unmark) = lesson_page("L1");
        let record = UserRecord::new().with_property("CompletedLessons", r#"["L1"]"#);
        let identity = InMemoryIdentity::new(record.clone());
        let mut controller = controller_for(&page, &identity, &record);
        assert_eq!(controller.state(), LessonState::Complete);

        let transition = controller.unmark(&mut page).await.unwrap();
        assert_eq!(transition, Transition::Applied);

        let mut expected = PropertyUpdates::new();
        expected.set("CompletedLessons", "");
        assert_eq!(identity.recorded_updates(), vec![expected]);

        assert!(page.is_visible(mark));
        assert!(!page.is_visible(unmark));
    }

    #[tokio::test]
    async fn last_lesson_property_set_on_mark_and_kept_on_unmark() {
        let (mut page, wrapper, _mark, _unmark) = lesson_page("L2");
        page.set_attr(wrapper, attrs::LAST_LESSON_PROP, "LastLesson");
        let record = UserRecord::new();
        let identity = InMemoryIdentity::new(record.clone());
        let mut controller = controller_for(&page, &identity, &record);

        controller.mark(&mut page).await.unwrap();
        assert_eq!(
            identity.current_record().property("LastLesson"),
            Some("L2")
        );

        controller.unmark(&mut page).await.unwrap();
        // Unmark touches only the completed-lessons property.
        assert_eq!(
            identity.current_record().property("LastLesson"),
            Some("L2")
        );
        let updates = identity.recorded_updates();
        assert_eq!(updates[1].get("LastLesson"), None);
        assert_eq!(updates[1].get("CompletedLessons"), Some(""));
    }

    #[tokio::test]
    async fn next_lesson_affordances_follow_state_page_wide() {
        let (mut page, wrapper, _mark, _unmark) = lesson_page("L2");
        let next = {
            let parent = page.parent(wrapper).unwrap();
            let el = page.append_child(parent, "a");
            page.set_attr(el, attrs::COURSE_ELEMENT, attrs::ROLE_NEXT_LESSON);
            el
        };
        let record = UserRecord::new();
        let identity = InMemoryIdentity::new(record.clone());
        let mut controller = controller_for(&page, &identity, &record);

        controller.apply_initial_ui(&mut page);
        assert!(!page.is_interactive(next));

        controller.mark(&mut page).await.unwrap();
        assert!(page.is_interactive(next));

        controller.unmark(&mut page).await.unwrap();
        assert!(!page.is_interactive(next));
    }

    #[tokio::test]
    async fn initial_state_comes_from_the_record() {
        let (mut page, _wrapper, mark, unmark) = lesson_page("L1");
        let record = UserRecord::new().with_property("CompletedLessons", r#"["L1"]"#);
        let identity = InMemoryIdentity::new(record.clone());
        let controller = controller_for(&page, &identity, &record);

        assert_eq!(controller.state(), LessonState::Complete);
        controller.apply_initial_ui(&mut page);
        assert!(!page.is_visible(mark));
        assert!(page.is_visible(unmark));
    }

    #[tokio::test]
    async fn failed_update_rolls_back_set_and_leaves_ui_alone() {
        let (mut page, _wrapper, mark, unmark) = lesson_page("L2");
        let record = UserRecord::new();
        let marker = LessonMarker::discover_all(&page).remove(0);
        let mut controller =
            LessonController::from_record(marker, &record, Arc::new(FailingIdentity)).unwrap();
        controller.apply_initial_ui(&mut page);

        let err = controller.mark(&mut page).await.unwrap_err();
        assert!(matches!(err, CourseError::Identity(_)));
        assert_eq!(controller.state(), LessonState::Incomplete);
        assert!(controller.completion().is_empty());
        // UI stays on the incomplete side.
        assert!(page.is_visible(mark));
        assert!(!page.is_visible(unmark));
    }

    #[tokio::test]
    async fn malformed_property_fails_construction() {
        let (page, _wrapper, _mark, _unmark) = lesson_page("L1");
        let record = UserRecord::new().with_property("CompletedLessons", "not json");
        let identity = InMemoryIdentity::new(record.clone());
        let marker = LessonMarker::discover_all(&page).remove(0);
        let err = LessonController::from_record(marker, &record, Arc::new(identity)).unwrap_err();
        assert!(matches!(err, CourseError::Completion(_)));
    }
}

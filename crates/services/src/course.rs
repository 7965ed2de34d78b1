//! Page-level orchestration: discovery, initialization, and the runtime that
//! routes clicks, playback events, filter settles, and video completions to
//! the right lesson.

use std::mem;
use std::sync::{Arc, Mutex};

use course_core::attrs;
use course_core::model::LessonMarker;
use course_core::page::{ElementId, Page, StyleRule};
use course_core::time::Clock;
use identity::IdentityService;
use video::{attach_adapter, PlaybackEvent, VideoAdapter, VideoApis, DEFAULT_COMPLETION_THRESHOLD_SECS};

use crate::error::CourseError;
use crate::lesson::{LessonController, LessonState, Transition};
use crate::redirect::{FilterGate, Navigator, RedirectCoordinator, RedirectOutcome, SessionStore};

/// Page-scoped configuration for one module activation.
#[derive(Debug, Clone)]
pub struct CourseConfig {
    /// Path of the current page, keying the per-session redirect flag.
    pub path: String,
    /// Seconds from the end at which a video counts as watched.
    pub completion_threshold: f64,
    pub clock: Clock,
}

impl CourseConfig {
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_owned(),
            completion_threshold: DEFAULT_COMPLETION_THRESHOLD_SECS,
            clock: Clock::default_clock(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

/// Default rules installed once per page: action buttons and list badges
/// stay hidden until a controller decides which side to show.
fn default_rules() -> Vec<StyleRule> {
    [
        attrs::ROLE_MARK_COMPLETE,
        attrs::ROLE_UNMARK_COMPLETE,
        attrs::ROLE_INDICATOR_COMPLETE,
        attrs::ROLE_INDICATOR_INCOMPLETE,
    ]
    .iter()
    .map(|role| StyleRule::hide_attr(attrs::COURSE_ELEMENT, role))
    .collect()
}

//
// ─── MODULE ────────────────────────────────────────────────────────────────────
//

/// Entry point for one page: holds the service seams and turns a page into a
/// running [`CourseRuntime`].
pub struct CourseModule {
    identity: Arc<dyn IdentityService>,
    session: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    apis: VideoApis,
    config: CourseConfig,
}

impl CourseModule {
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityService>,
        session: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
        apis: VideoApis,
        config: CourseConfig,
    ) -> Self {
        Self {
            identity,
            session,
            navigator,
            apis,
            config,
        }
    }

    /// Activates the module on a page: installs the default stylesheet,
    /// discovers lesson wrappers and filter containers, materializes a
    /// controller per lesson from a fresh user record, attaches video
    /// adapters, and runs the redirect scan when no filter is pending.
    ///
    /// A lesson whose record fetch or property parse fails is skipped with a
    /// warning; the rest of the page still initializes.
    pub async fn initialize(&self, page: &mut Page) -> CourseRuntime {
        page.install_stylesheet(attrs::MODULE_NAME, &default_rules());

        let gate = FilterGate::discover(page);
        let redirect = RedirectCoordinator::new(
            &self.config.path,
            Arc::clone(&self.session),
            Arc::clone(&self.navigator),
        );

        let pending: Arc<Mutex<Vec<ElementId>>> = Arc::new(Mutex::new(Vec::new()));
        let mut units = Vec::new();

        for marker in LessonMarker::discover_all(page) {
            let record = match self.identity.fetch_current_user().await {
                Ok(record) => record,
                Err(err) => {
                    log::warn!("skipping lesson {}: user fetch failed: {err}", marker.lesson_id);
                    continue;
                }
            };
            let video_wrapper = marker.video_wrapper;
            let element = marker.element;
            let controller =
                match LessonController::from_record(marker, &record, Arc::clone(&self.identity)) {
                    Ok(controller) => controller,
                    Err(err) => {
                        log::warn!("skipping lesson: completion property unreadable: {err}");
                        continue;
                    }
                };
            controller.apply_initial_ui(page);

            let mut adapter = None;
            if let Some(wrapper) = video_wrapper {
                match attach_adapter(
                    page,
                    wrapper,
                    self.config.completion_threshold,
                    self.config.clock,
                    &self.apis,
                )
                .await
                {
                    Some(attached) => {
                        let queue = Arc::clone(&pending);
                        attached.on_complete(Box::new(move || {
                            if let Ok(mut queue) = queue.lock() {
                                queue.push(element);
                            }
                        }));
                        adapter = Some(attached);
                    }
                    None => {
                        log::debug!("no video adapter for lesson {}", controller.lesson_id());
                    }
                }
            }

            units.push(LessonUnit {
                element,
                controller,
                adapter,
            });
        }

        let mut runtime = CourseRuntime {
            units,
            gate,
            redirect,
            redirect_processed: false,
            pending,
        };
        if runtime.gate.is_open() {
            runtime.redirect_processed = true;
            let outcome = runtime.redirect.run(page);
            if let RedirectOutcome::Navigated(href) = &outcome {
                log::info!("redirecting to {href}");
            }
        }
        runtime
    }
}

//
// ─── RUNTIME ───────────────────────────────────────────────────────────────────
//

/// One initialized lesson: its wrapper element, its controller, and an
/// optional video adapter still being monitored.
struct LessonUnit {
    element: ElementId,
    controller: LessonController,
    adapter: Option<Box<dyn VideoAdapter>>,
}

/// The live module state after initialization. The host forwards page events
/// here; completion signals queued by video adapters are applied through
/// [`CourseRuntime::drain_video_completions`].
pub struct CourseRuntime {
    units: Vec<LessonUnit>,
    gate: FilterGate,
    redirect: RedirectCoordinator,
    redirect_processed: bool,
    pending: Arc<Mutex<Vec<ElementId>>>,
}

impl CourseRuntime {
    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn lesson_state(&self, element: ElementId) -> Option<LessonState> {
        self.unit_index(element)
            .map(|idx| self.units[idx].controller.state())
    }

    /// Handles a click on a lesson's mark affordance. Clicks on elements
    /// that are not initialized lesson wrappers are ignored.
    ///
    /// # Errors
    ///
    /// Propagates the controller's identity failure; state and UI are
    /// unchanged in that case.
    pub async fn mark_clicked(
        &mut self,
        page: &mut Page,
        element: ElementId,
    ) -> Result<Transition, CourseError> {
        match self.unit_index(element) {
            Some(idx) => self.units[idx].controller.mark(page).await,
            None => Ok(Transition::NoOp),
        }
    }

    /// Handles a click on a lesson's unmark affordance.
    ///
    /// # Errors
    ///
    /// Propagates the controller's identity failure; state and UI are
    /// unchanged in that case.
    pub async fn unmark_clicked(
        &mut self,
        page: &mut Page,
        element: ElementId,
    ) -> Result<Transition, CourseError> {
        match self.unit_index(element) {
            Some(idx) => self.units[idx].controller.unmark(page).await,
            None => Ok(Transition::NoOp),
        }
    }

    /// Records a filter container's settled signal. Returns the redirect
    /// outcome when this signal opened the gate; the scan runs once.
    pub fn filter_settled(
        &mut self,
        page: &Page,
        container: ElementId,
    ) -> Option<RedirectOutcome> {
        self.gate.settle(container);
        if self.redirect_processed || !self.gate.is_open() {
            return None;
        }
        self.redirect_processed = true;
        Some(self.redirect.run(page))
    }

    #[must_use]
    pub fn redirect_processed(&self) -> bool {
        self.redirect_processed
    }

    /// Forwards a native playback notification to the lesson's adapter.
    pub fn feed_playback(&mut self, element: ElementId, event: PlaybackEvent) {
        if let Some(idx) = self.unit_index(element) {
            if let Some(adapter) = self.units[idx].adapter.as_mut() {
                adapter.handle_event(event);
            }
        }
    }

    /// One poll tick across every monitored video. Adapters reporting a
    /// terminal outcome are dropped from further polling.
    pub async fn poll_videos(&mut self) {
        for unit in &mut self.units {
            let Some(adapter) = unit.adapter.as_mut() else {
                continue;
            };
            if adapter.poll().await.is_terminal() {
                unit.adapter = None;
            }
        }
    }

    /// Applies every queued video completion as a mark transition and
    /// returns how many actually changed state. Completion signals only
    /// ever mark; an already-complete lesson absorbs its signal.
    ///
    /// # Errors
    ///
    /// Stops at the first identity failure; signals not yet applied are
    /// dropped with the failed one.
    pub async fn drain_video_completions(
        &mut self,
        page: &mut Page,
    ) -> Result<usize, CourseError> {
        let drained = match self.pending.lock() {
            Ok(mut queue) => mem::take(&mut *queue),
            Err(_) => Vec::new(),
        };
        let mut applied = 0;
        for element in drained {
            if self.mark_clicked(page, element).await? == Transition::Applied {
                applied += 1;
            }
        }
        Ok(applied)
    }

    fn unit_index(&self, element: ElementId) -> Option<usize> {
        self.units.iter().position(|unit| unit.element == element)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirect::{MemorySessionStore, RecordingNavigator};
    use identity::{InMemoryIdentity, UserRecord};
    use video::{InMemoryVimeoApi, InMemoryYouTubeApi};

    fn module_with(identity: InMemoryIdentity) -> CourseModule {
        CourseModule::new(
            Arc::new(identity),
            Arc::new(MemorySessionStore::new()),
            Arc::new(RecordingNavigator::new()),
            VideoApis {
                youtube: Arc::new(InMemoryYouTubeApi::new()),
                vimeo: Arc::new(InMemoryVimeoApi::new()),
            },
            CourseConfig::new("/lessons/intro"),
        )
    }

    fn page_with_lessons(ids: &[&str]) -> (Page, Vec<ElementId>) {
        let mut page = Page::new();
        let body = page.create_root("body");
        let wrappers = ids
            .iter()
            .map(|id| {
                let wrapper = page.append_child(body, "div");
                page.set_attr(wrapper, attrs::LESSON_ID, id);
                wrapper
            })
            .collect();
        (page, wrappers)
    }

    #[tokio::test]
    async fn initializes_one_controller_per_wrapper() {
        let (mut page, wrappers) = page_with_lessons(&["L1", "L2"]);
        let identity =
            InMemoryIdentity::new(UserRecord::new().with_property("CompletedLessons", r#"["L1"]"#));
        let runtime = module_with(identity).initialize(&mut page).await;

        assert_eq!(runtime.lesson_count(), 2);
        assert_eq!(runtime.lesson_state(wrappers[0]), Some(LessonState::Complete));
        assert_eq!(
            runtime.lesson_state(wrappers[1]),
            Some(LessonState::Incomplete)
        );
        assert!(page.has_stylesheet(attrs::MODULE_NAME));
    }

    #[tokio::test]
    async fn malformed_record_skips_that_lesson_only() {
        let (mut page, wrappers) = page_with_lessons(&["L1", "L2"]);
        page.set_attr(wrappers[0], attrs::COMPLETED_LESSONS_PROP, "Broken");
        let record = UserRecord::new()
            .with_property("Broken", "{oops")
            .with_property("CompletedLessons", r#"["L2"]"#);
        let runtime = module_with(InMemoryIdentity::new(record))
            .initialize(&mut page)
            .await;

        assert_eq!(runtime.lesson_count(), 1);
        assert_eq!(runtime.lesson_state(wrappers[0]), None);
        assert_eq!(runtime.lesson_state(wrappers[1]), Some(LessonState::Complete));
    }

    #[tokio::test]
    async fn clicks_on_unknown_elements_are_noops() {
        let (mut page, _wrappers) = page_with_lessons(&["L1"]);
        let stray = page.create_root("div");
        let identity = InMemoryIdentity::new(UserRecord::new());
        let mut runtime = module_with(identity).initialize(&mut page).await;

        assert_eq!(
            runtime.mark_clicked(&mut page, stray).await.unwrap(),
            Transition::NoOp
        );
        assert_eq!(
            runtime.unmark_clicked(&mut page, stray).await.unwrap(),
            Transition::NoOp
        );
    }

    #[tokio::test]
    async fn filter_settle_triggers_redirect_exactly_once() {
        let (mut page, wrappers) = page_with_lessons(&["L1"]);
        let container = {
            let parent = page.parent(wrappers[0]).unwrap();
            let el = page.append_child(parent, "div");
            page.set_attr(el, attrs::LIST_ELEMENT, attrs::LIST_ROLE_LIST);
            el
        };
        let anchor = page.append_child(container, "a");
        page.set_attr(anchor, attrs::COURSE_ELEMENT, attrs::ROLE_REDIRECT);
        page.set_attr(anchor, "href", "/next");

        let identity = InMemoryIdentity::new(UserRecord::new());
        let mut runtime = module_with(identity).initialize(&mut page).await;
        // The pending filter held the redirect back at initialization.
        assert!(!runtime.redirect_processed());

        let outcome = runtime.filter_settled(&page, container);
        assert_eq!(outcome, Some(RedirectOutcome::Navigated("/next".to_owned())));
        assert_eq!(runtime.filter_settled(&page, container), None);
    }

    #[tokio::test]
    async fn redirect_runs_at_initialization_without_filters() {
        let (mut page, wrappers) = page_with_lessons(&["L1"]);
        let body = page.parent(wrappers[0]).unwrap();
        let anchor = page.append_child(body, "a");
        page.set_attr(anchor, attrs::COURSE_ELEMENT, attrs::ROLE_REDIRECT);
        page.set_attr(anchor, "href", "/next");

        let navigator = RecordingNavigator::new();
        let module = CourseModule::new(
            Arc::new(InMemoryIdentity::new(UserRecord::new())),
            Arc::new(MemorySessionStore::new()),
            Arc::new(navigator.clone()),
            VideoApis {
                youtube: Arc::new(InMemoryYouTubeApi::new()),
                vimeo: Arc::new(InMemoryVimeoApi::new()),
            },
            CourseConfig::new("/lessons/intro"),
        );
        let runtime = module.initialize(&mut page).await;

        assert!(runtime.redirect_processed());
        assert_eq!(navigator.visits(), vec!["/next".to_owned()]);
    }

    #[tokio::test]
    async fn video_completion_marks_through_the_queue() {
        let (mut page, wrappers) = page_with_lessons(&["L1"]);
        let video_wrapper = page.append_child(wrappers[0], "div");
        page.set_attr(video_wrapper, attrs::AUTOCOMPLETE_VIDEO, "true");
        page.append_child(video_wrapper, "video");

        let identity = InMemoryIdentity::new(UserRecord::new());
        let mut runtime = module_with(identity.clone()).initialize(&mut page).await;

        runtime.feed_playback(
            wrappers[0],
            PlaybackEvent::TimeUpdate {
                current: 95.0,
                duration: 100.0,
            },
        );
        let applied = runtime.drain_video_completions(&mut page).await.unwrap();

        assert_eq!(applied, 1);
        assert_eq!(runtime.lesson_state(wrappers[0]), Some(LessonState::Complete));
        assert_eq!(
            identity.current_record().property("CompletedLessons"),
            Some(r#"["L1"]"#)
        );
    }

    #[tokio::test]
    async fn completion_signal_on_complete_lesson_is_absorbed() {
        let (mut page, wrappers) = page_with_lessons(&["L1"]);
        let video_wrapper = page.append_child(wrappers[0], "div");
        page.set_attr(video_wrapper, attrs::AUTOCOMPLETE_VIDEO, "true");
        page.append_child(video_wrapper, "video");

        let identity =
            InMemoryIdentity::new(UserRecord::new().with_property("CompletedLessons", r#"["L1"]"#));
        let mut runtime = module_with(identity.clone()).initialize(&mut page).await;

        runtime.feed_playback(wrappers[0], PlaybackEvent::Ended);
        let applied = runtime.drain_video_completions(&mut page).await.unwrap();

        assert_eq!(applied, 0);
        assert!(identity.recorded_updates().is_empty());
        assert_eq!(runtime.lesson_state(wrappers[0]), Some(LessonState::Complete));
    }
}

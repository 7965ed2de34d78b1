use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use course_core::attrs;
use course_core::page::{ElementId, Page};

//
// ─── SESSION STORE ─────────────────────────────────────────────────────────────
//

/// Per-session flag storage. Backed by the host session in production and by
/// memory in tests; a fresh session means a fresh store.
pub trait SessionStore: Send + Sync {
    fn contains(&self, key: &str) -> bool;
    fn insert(&self, key: &str);
}

/// Session store held in memory. Cloning shares the underlying set, so one
/// instance can be handed to the coordinator and inspected from the test.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    keys: Arc<Mutex<HashSet<String>>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn contains(&self, key: &str) -> bool {
        match self.keys.lock() {
            Ok(keys) => keys.contains(key),
            Err(_) => false,
        }
    }

    fn insert(&self, key: &str) {
        if let Ok(mut keys) = self.keys.lock() {
            keys.insert(key.to_owned());
        }
    }
}

//
// ─── NAVIGATION ────────────────────────────────────────────────────────────────
//

/// Outbound navigation seam. Production follows the link; tests record it.
pub trait Navigator: Send + Sync {
    fn navigate(&self, href: &str);
}

/// Navigator that appends every destination to a shared log.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    visits: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn visits(&self) -> Vec<String> {
        match self.visits.lock() {
            Ok(visits) => visits.clone(),
            Err(_) => Vec::new(),
        }
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, href: &str) {
        if let Ok(mut visits) = self.visits.lock() {
            visits.push(href.to_owned());
        }
    }
}

/// Session key guarding one redirect per path.
#[must_use]
pub fn redirect_session_key(path: &str) -> String {
    format!("o-course-redirected_{path}")
}

//
// ─── REDIRECT COORDINATOR ──────────────────────────────────────────────────────
//

/// What a redirect scan decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    /// The session flag for this path was already set; nothing was scanned.
    AlreadyRedirected,
    /// A visible redirect link was followed.
    Navigated(String),
    /// No visible redirect element carried a usable link.
    NoTarget,
}

/// Scans the page for the first visible redirect element and follows its
/// link, at most once per path per session. The session flag is recorded
/// before navigation so a scan interrupted mid-flight never repeats.
pub struct RedirectCoordinator {
    path: String,
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl RedirectCoordinator {
    #[must_use]
    pub fn new(path: &str, store: Arc<dyn SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            path: path.to_owned(),
            store,
            navigator,
        }
    }

    /// Runs one scan in document order. Invisible redirect elements are
    /// skipped; the first visible one with a non-empty link wins.
    pub fn run(&self, page: &Page) -> RedirectOutcome {
        let key = redirect_session_key(&self.path);
        if self.store.contains(&key) {
            return RedirectOutcome::AlreadyRedirected;
        }

        for element in page.find_all_with_value(attrs::COURSE_ELEMENT, attrs::ROLE_REDIRECT) {
            if !page.is_visible(element) {
                continue;
            }
            let Some(href) = redirect_target(page, element) else {
                continue;
            };
            self.store.insert(&key);
            self.navigator.navigate(&href);
            return RedirectOutcome::Navigated(href);
        }
        RedirectOutcome::NoTarget
    }
}

/// The link an eligible redirect element points at: the element itself when
/// it is an anchor, otherwise its first descendant anchor. Empty hrefs do
/// not count.
fn redirect_target(page: &Page, element: ElementId) -> Option<String> {
    let anchor = if page.tag(element) == "a" {
        element
    } else {
        page.find_tag_within(element, "a").into_iter().next()?
    };
    match page.attr(anchor, "href") {
        Some(href) if !href.is_empty() => Some(href.to_owned()),
        _ => None,
    }
}

//
// ─── FILTER GATE ───────────────────────────────────────────────────────────────
//

/// Holds the redirect until every list-filter container on the page has
/// reported its first settle. Pages without containers are open immediately.
///
/// Each container opens the gate once; repeat settles from the same
/// container are absorbed.
#[derive(Debug)]
pub struct FilterGate {
    containers: Vec<ElementId>,
    settled: HashSet<ElementId>,
}

impl FilterGate {
    /// Finds every filter-list container currently on the page.
    #[must_use]
    pub fn discover(page: &Page) -> Self {
        Self {
            containers: page.find_all_with_value(attrs::LIST_ELEMENT, attrs::LIST_ROLE_LIST),
            settled: HashSet::new(),
        }
    }

    #[must_use]
    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    /// Records a settle signal. Returns true only the first time this
    /// container settles; unknown containers are ignored.
    pub fn settle(&mut self, container: ElementId) -> bool {
        if !self.containers.contains(&container) {
            return false;
        }
        self.settled.insert(container)
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.settled.len() >= self.containers.len()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

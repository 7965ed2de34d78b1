use course_core::model::{CompletionSet, IndicatorItem};
use course_core::page::{Display, Page};

/// Refreshes every lesson-list badge on the page against the completion
/// set. Stateless; re-run after every controller transition and once at
/// initialization. The inline display values override the default rules
/// that keep both badges hidden.
pub fn sync_indicators(page: &mut Page, completion: &CompletionSet) {
    for item in IndicatorItem::discover_all(page) {
        let completed = completion.contains(&item.lesson_id);
        if let Some(badge) = item.complete_badge {
            page.set_display(badge, if completed { Display::Block } else { Display::None });
        }
        if let Some(badge) = item.incomplete_badge {
            page.set_display(badge, if completed { Display::None } else { Display::Block });
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

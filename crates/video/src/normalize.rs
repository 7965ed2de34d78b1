//! Embed normalization: rewrites proxy-wrapped players into markup the
//! platform control scripts can drive, before an adapter attaches.
//!
//! Mutation is irreversible and never retried; when a video id cannot be
//! recovered the markup is left untouched and no adapter is produced.

use course_core::model::VideoId;
use course_core::page::{ElementId, Page};
use course_core::video_source::{self, VideoSource};

const DEFAULT_WIDTH: &str = "100%";
const DEFAULT_HEIGHT: &str = "400";

/// Markup an adapter can attach to, after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedSource {
    /// A mount element for a managed YouTube player (both proxied and
    /// standard iframes are replaced by a mount).
    YouTube { mount: ElementId, video_id: VideoId },
    /// A direct Vimeo iframe (proxied iframes get rewritten to one).
    Vimeo { iframe: ElementId },
    Html5 { video: ElementId },
}

/// Detects the wrapper's player and rewrites proxy embeds in place.
#[must_use]
pub fn normalize(page: &mut Page, wrapper: ElementId) -> Option<NormalizedSource> {
    match video_source::detect(page, wrapper)? {
        VideoSource::Html5 { video } => Some(NormalizedSource::Html5 { video }),
        VideoSource::YouTube { iframe } => normalize_youtube(page, iframe),
        VideoSource::Vimeo { iframe } => normalize_vimeo(page, iframe),
    }
}

fn normalize_youtube(page: &mut Page, iframe: ElementId) -> Option<NormalizedSource> {
    let src = page.attr(iframe, "src")?.to_owned();
    let Some(video_id) = video_source::recover_youtube_id(&src) else {
        log::debug!("could not extract youtube video id from {src}");
        return None;
    };

    let (width, height) = dimensions(page, iframe);
    let mount = page.replace_with(iframe, "div");
    page.set_attr(mount, "id", &format!("youtube-player-{video_id}"));
    page.set_attr(mount, "width", &width);
    page.set_attr(mount, "height", &height);
    Some(NormalizedSource::YouTube { mount, video_id })
}

fn normalize_vimeo(page: &mut Page, iframe: ElementId) -> Option<NormalizedSource> {
    let src = page.attr(iframe, "src")?.to_owned();
    if !video_source::is_embed_proxy(&src) {
        // Direct embeds are controllable as-is.
        return Some(NormalizedSource::Vimeo { iframe });
    }

    let Some(video_id) = video_source::recover_vimeo_id(&src) else {
        log::debug!("could not extract vimeo video id from {src}");
        return None;
    };

    let (width, height) = dimensions(page, iframe);
    let direct = page.replace_with(iframe, "iframe");
    page.set_attr(
        direct,
        "src",
        &format!("https://player.vimeo.com/video/{video_id}"),
    );
    page.set_attr(direct, "width", &width);
    page.set_attr(direct, "height", &height);
    page.set_attr(direct, "frameborder", "0");
    page.set_attr(direct, "allow", "autoplay; fullscreen; picture-in-picture");
    Some(NormalizedSource::Vimeo { iframe: direct })
}

fn dimensions(page: &Page, iframe: ElementId) -> (String, String) {
    let width = page.attr(iframe, "width").unwrap_or(DEFAULT_WIDTH).to_owned();
    let height = page
        .attr(iframe, "height")
        .unwrap_or(DEFAULT_HEIGHT)
        .to_owned();
    (width, height)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

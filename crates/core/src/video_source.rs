//! Video source classification and embed-proxy URL recovery.
//!
//! Embed proxies wrap the real player behind their own iframe; the wrapped
//! platform URL travels in the proxy URL's query string. All recovery here
//! is best-effort: any failure returns `None` and the caller treats the
//! wrapper as having no usable player.

use url::Url;

use crate::model::ids::VideoId;
use crate::page::{ElementId, Page};

/// Host of the supported embed-proxy service.
pub const EMBED_PROXY_HOST: &str = "cdn.embedly.com";

/// The kind of embedded player found inside a video wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSource {
    YouTube { iframe: ElementId },
    Vimeo { iframe: ElementId },
    Html5 { video: ElementId },
}

/// Inspects a video wrapper's subtree for a supported player, checking
/// platforms in the same precedence order the markup conventions document:
/// YouTube iframe, Vimeo iframe, then a native `video` element.
#[must_use]
pub fn detect(page: &Page, wrapper: ElementId) -> Option<VideoSource> {
    let iframes = page.find_tag_within(wrapper, "iframe");

    for iframe in &iframes {
        if let Some(src) = page.attr(*iframe, "src") {
            if src.contains("youtube.com") || src.contains("youtu.be") {
                return Some(VideoSource::YouTube { iframe: *iframe });
            }
        }
    }
    for iframe in &iframes {
        if let Some(src) = page.attr(*iframe, "src") {
            if src.contains("vimeo.com") {
                return Some(VideoSource::Vimeo { iframe: *iframe });
            }
        }
    }

    page.find_tag_within(wrapper, "video")
        .first()
        .map(|video| VideoSource::Html5 { video: *video })
}

/// Whether the iframe src points at the embed-proxy service rather than a
/// direct platform player.
#[must_use]
pub fn is_embed_proxy(src: &str) -> bool {
    Url::parse(src)
        .ok()
        .and_then(|url| url.host_str().map(|host| host == EMBED_PROXY_HOST))
        .unwrap_or(false)
}

/// Recovers the wrapped platform URL from a proxy URL (`url` or `src`
/// query parameter).
#[must_use]
pub fn embedded_url(src: &str) -> Option<Url> {
    let proxy = Url::parse(src).ok()?;
    let inner = proxy
        .query_pairs()
        .find(|(key, _)| key == "url")
        .or_else(|| proxy.query_pairs().find(|(key, _)| key == "src"))
        .map(|(_, value)| value.into_owned())?;
    Url::parse(&inner).ok()
}

/// Extracts the video id from a direct YouTube URL
/// (`youtube.com/watch?v=ID`, `youtube.com/embed/ID`, `youtu.be/ID`).
#[must_use]
pub fn youtube_video_id(url: &Url) -> Option<VideoId> {
    let host = url.host_str()?;

    let id = if host == "youtu.be" {
        url.path_segments()?.next().map(str::to_owned)
    } else if host.ends_with("youtube.com") {
        let mut segments = url.path_segments()?;
        match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            Some("embed") => segments.next().map(str::to_owned),
            _ => None,
        }
    } else {
        None
    }?;

    if id.is_empty() {
        return None;
    }
    Some(VideoId::new(id))
}

/// Extracts the numeric video id from a direct Vimeo URL.
#[must_use]
pub fn vimeo_video_id(url: &Url) -> Option<VideoId> {
    let host = url.host_str()?;
    if !host.ends_with("vimeo.com") {
        return None;
    }
    url.path_segments()?
        .find(|segment| !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()))
        .map(VideoId::new)
}

/// Recovers a YouTube video id from an iframe src, unwrapping the embed
/// proxy when present.
#[must_use]
pub fn recover_youtube_id(src: &str) -> Option<VideoId> {
    let url = if is_embed_proxy(src) {
        embedded_url(src)?
    } else {
        Url::parse(src).ok()?
    };
    youtube_video_id(&url)
}

/// Recovers a Vimeo video id from an iframe src, unwrapping the embed
/// proxy when present.
#[must_use]
pub fn recover_vimeo_id(src: &str) -> Option<VideoId> {
    let url = if is_embed_proxy(src) {
        embedded_url(src)?
    } else {
        Url::parse(src).ok()?
    };
    vimeo_video_id(&url)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn wrapper_with_iframe(src: &str) -> (Page, ElementId) {
        let mut page = Page::new();
        let body = page.create_root("body");
        let wrapper = page.append_child(body, "div");
        let iframe = page.append_child(wrapper, "iframe");
        page.set_attr(iframe, "src", src);
        (page, wrapper)
    }

    #[test]
    fn detects_youtube_before_vimeo_and_html5() {
        let (mut page, wrapper) = wrapper_with_iframe("https://www.youtube.com/embed/abc123");
        page.append_child(wrapper, "video");
        assert!(matches!(
            detect(&page, wrapper),
            Some(VideoSource::YouTube { .. })
        ));
    }

    #[test]
    fn detects_vimeo_iframe() {
        let (page, wrapper) = wrapper_with_iframe("https://player.vimeo.com/video/12345");
        assert!(matches!(
            detect(&page, wrapper),
            Some(VideoSource::Vimeo { .. })
        ));
    }

    #[test]
    fn detects_proxied_sources_by_inner_url_substring() {
        let (page, wrapper) = wrapper_with_iframe(
            "https://cdn.embedly.com/widgets/media.html?src=https%3A//www.youtube.com/embed/xyz",
        );
        assert!(matches!(
            detect(&page, wrapper),
            Some(VideoSource::YouTube { .. })
        ));
    }

    #[test]
    fn falls_back_to_native_video_element() {
        let mut page = Page::new();
        let body = page.create_root("body");
        let wrapper = page.append_child(body, "div");
        let video = page.append_child(wrapper, "video");
        assert_eq!(detect(&page, wrapper), Some(VideoSource::Html5 { video }));
    }

    #[test]
    fn empty_wrapper_has_no_source() {
        let mut page = Page::new();
        let body = page.create_root("body");
        let wrapper = page.append_child(body, "div");
        assert_eq!(detect(&page, wrapper), None);
    }

    #[test]
    fn youtube_id_from_each_url_shape() {
        for src in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
        ] {
            let url = Url::parse(src).unwrap();
            assert_eq!(
                youtube_video_id(&url),
                Some(VideoId::new("dQw4w9WgXcQ")),
                "failed for {src}"
            );
        }
    }

    #[test]
    fn youtube_id_ignores_unrelated_urls() {
        let url = Url::parse("https://example.com/watch?v=abc").unwrap();
        assert_eq!(youtube_video_id(&url), None);
    }

    #[test]
    fn vimeo_id_skips_non_numeric_segments() {
        let url = Url::parse("https://vimeo.com/channels/staffpicks/76979871").unwrap();
        assert_eq!(vimeo_video_id(&url), Some(VideoId::new("76979871")));
    }

    #[test]
    fn proxy_unwrap_reads_url_then_src_param() {
        let by_url = "https://cdn.embedly.com/widgets/media.html?url=https%3A%2F%2Fvimeo.com%2F123456";
        assert_eq!(recover_vimeo_id(by_url), Some(VideoId::new("123456")));

        let by_src = "https://cdn.embedly.com/widgets/media.html?src=https%3A%2F%2Fwww.youtube.com%2Fembed%2Fabc";
        assert_eq!(recover_youtube_id(by_src), Some(VideoId::new("abc")));
    }

    #[test]
    fn malformed_proxy_urls_recover_nothing() {
        assert_eq!(recover_youtube_id("not a url"), None);
        assert_eq!(
            recover_youtube_id("https://cdn.embedly.com/widgets/media.html"),
            None
        );
        assert_eq!(
            recover_vimeo_id("https://cdn.embedly.com/widgets/media.html?url=garbage"),
            None
        );
    }
}

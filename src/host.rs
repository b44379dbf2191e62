/// Host page locator: every selector the extension depends on, in one place
///
/// YouTube offers no cooperative API, so these lookups are revalidated on
/// every recheck rather than cached. A markup change means swapping this
/// module's selectors, not the supervisor logic.
use url::Url;
use web_sys::{Document, Element};

pub const PANEL_SELECTOR: &str = "ytd-transcript-renderer";
pub const CONTAINER_SELECTOR: &str = "div#content.ytd-transcript-renderer";
pub const SEGMENTS_CONTAINER_SELECTOR: &str =
    "#segments-container.ytd-transcript-segment-list-renderer, ytd-transcript-segment-list-renderer";
pub const SEGMENT_TEXT_SELECTOR: &str =
    "ytd-transcript-segment-renderer .segment-text, ytd-transcript-segment-renderer .yt-formatted-string";
pub const SEGMENT_LIST_SELECTOR: &str = "ytd-transcript-segment-list-renderer";
pub const SEARCH_PANEL_SELECTOR: &str = "ytd-transcript-search-panel-renderer";

pub const COMMENTS_SECTION_SELECTOR: &str = "#comments";
pub const COMMENT_THREAD_SELECTOR: &str = "ytd-comment-thread-renderer";
pub const COMMENT_MAIN_SELECTOR: &str = "ytd-comment-renderer#comment";
pub const COMMENT_AUTHOR_SELECTOR: &str = "#author-text span";
pub const COMMENT_TEXT_SELECTOR: &str = "#content-text";
pub const COMMENT_LIKES_SELECTOR: &str = "#vote-count-middle";
pub const COMMENT_REPLIES_BUTTON_SELECTOR: &str = "#show-replies-button";
pub const COMMENT_REPLY_SELECTOR: &str = "ytd-comment-replies-renderer ytd-comment-renderer";

/// Stateless handle over the live document. All methods return None when the
/// element is not there yet; absence is the expected steady state on
/// non-watch pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostPage;

impl HostPage {
    pub fn new() -> Self {
        HostPage
    }

    pub fn document(&self) -> Option<Document> {
        web_sys::window()?.document()
    }

    /// The transcript panel the UI is injected into.
    pub fn panel(&self) -> Option<Element> {
        self.document()?.query_selector(PANEL_SELECTOR).ok()?
    }

    /// The content container inside the panel; the UI subtree becomes its
    /// first child.
    pub fn content_container(&self, panel: &Element) -> Option<Element> {
        panel.query_selector(CONTAINER_SELECTOR).ok()?
    }

    pub fn segments_container(&self, panel: &Element) -> Option<Element> {
        panel.query_selector(SEGMENTS_CONTAINER_SELECTOR).ok()?
    }

    pub fn current_url(&self) -> Option<String> {
        web_sys::window()?.location().href().ok()
    }

    pub fn on_youtube(&self) -> bool {
        web_sys::window()
            .and_then(|w| w.location().hostname().ok())
            .is_some_and(|host| host.contains("youtube.com"))
    }

    pub fn on_watch_page(&self) -> bool {
        self.current_url().as_deref().is_some_and(is_watch_url)
    }

    pub fn current_video_id(&self) -> Option<String> {
        video_id_from_url(self.current_url().as_deref()?)
    }
}

/// Navigation events carry relative URLs; resolve those against the host
/// origin.
fn parse_page_url(url: &str) -> Option<Url> {
    Url::parse(url)
        .or_else(|_| Url::parse("https://www.youtube.com").and_then(|base| base.join(url)))
        .ok()
}

/// Whether a URL is a video watch page (as opposed to home, search, shorts,
/// channel pages, where the panel is expected absent).
pub fn is_watch_url(url: &str) -> bool {
    parse_page_url(url)
        .is_some_and(|parsed| parsed.path() == "/watch" && parsed.query_pairs().any(|(k, _)| k == "v"))
}

/// The video id from a watch URL, used as the cache key for summaries.
pub fn video_id_from_url(url: &str) -> Option<String> {
    let parsed = parse_page_url(url)?;
    parsed
        .query_pairs()
        .find(|(k, _)| k == "v")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id_from_watch_url() {
        assert_eq!(
            video_id_from_url("https://www.youtube.com/watch?v=abc123"),
            Some("abc123".to_string())
        );
        assert_eq!(
            video_id_from_url("https://www.youtube.com/watch?v=abc123&t=42s"),
            Some("abc123".to_string())
        );
        assert_eq!(
            video_id_from_url("https://www.youtube.com/watch?list=PL1&v=xyz"),
            Some("xyz".to_string())
        );
    }

    #[test]
    fn test_relative_navigation_urls_resolve() {
        assert_eq!(
            video_id_from_url("/watch?v=abc123"),
            Some("abc123".to_string())
        );
        assert!(is_watch_url("/watch?v=abc123"));
        assert!(!is_watch_url("/feed/subscriptions"));
    }

    #[test]
    fn test_video_id_missing() {
        assert_eq!(video_id_from_url("https://www.youtube.com/"), None);
        assert_eq!(video_id_from_url("https://www.youtube.com/watch"), None);
        assert_eq!(video_id_from_url("https://www.youtube.com/watch?v="), None);
        assert_eq!(video_id_from_url("not a url"), None);
    }

    #[test]
    fn test_is_watch_url() {
        assert!(is_watch_url("https://www.youtube.com/watch?v=abc123"));
        assert!(!is_watch_url("https://www.youtube.com/"));
        assert!(!is_watch_url("https://www.youtube.com/shorts/abc123"));
        assert!(!is_watch_url("https://www.youtube.com/feed/subscriptions"));
        assert!(!is_watch_url("https://www.youtube.com/watch"));
    }
}

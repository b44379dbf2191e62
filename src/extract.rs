/// Content extraction from the watch page: transcript text and comments
///
/// Transcript extraction is a synchronous DOM read. Comment collection is a
/// long-running harvest that scrolls the page to force lazy loading, or goes
/// through the YouTube Data API when a key is configured.
use log::{info, warn};
use serde::Deserialize;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement};

use crate::error::SummarizeError;
use crate::host::{
    self, HostPage, COMMENTS_SECTION_SELECTOR, COMMENT_AUTHOR_SELECTOR, COMMENT_LIKES_SELECTOR,
    COMMENT_MAIN_SELECTOR, COMMENT_REPLIES_BUTTON_SELECTOR, COMMENT_REPLY_SELECTOR,
    COMMENT_TEXT_SELECTOR, COMMENT_THREAD_SELECTOR,
};
use crate::session::{Comment, Reply};
use crate::signals::sleep;

pub const MAX_COMMENTS: usize = 100;
pub const MAX_REPLIES_PER_COMMENT: usize = 10;
const MAX_SCROLL_ATTEMPTS: u32 = 20;
const MAX_SECTION_LOOKUPS: u32 = 10;

const FALLBACK_SEGMENT_SELECTOR: &str = "yt-formatted-string, [class*=\"segment\"]";

// ---- Transcript ----

/// Reads the full transcript from the open transcript panel. Lines are
/// joined with newlines, matching how the panel displays them.
pub fn transcript_text(host: &HostPage) -> Result<String, SummarizeError> {
    let panel = host.panel().ok_or(SummarizeError::NoTranscript)?;
    let container = host
        .segments_container(&panel)
        .ok_or(SummarizeError::NoTranscript)?;

    let mut lines = segment_lines(&container, host::SEGMENT_TEXT_SELECTOR);
    if lines.is_empty() {
        // The panel markup shifts between experiments; retry with a looser
        // selector before giving up.
        lines = segment_lines(&container, FALLBACK_SEGMENT_SELECTOR);
    }

    join_segments(lines.into_iter()).ok_or(SummarizeError::NoTranscript)
}

fn segment_lines(container: &Element, selector: &str) -> Vec<String> {
    let Ok(nodes) = container.query_selector_all(selector) else {
        return Vec::new();
    };
    let mut lines = Vec::with_capacity(nodes.length() as usize);
    for i in 0..nodes.length() {
        if let Some(node) = nodes.item(i) {
            if let Some(text) = node.text_content() {
                lines.push(text);
            }
        }
    }
    lines
}

/// Trims each segment, drops empties, joins with newlines. None when nothing
/// survives.
pub fn join_segments(segments: impl Iterator<Item = String>) -> Option<String> {
    let joined: Vec<String> = segments
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if joined.is_empty() {
        None
    } else {
        Some(joined.join("\n"))
    }
}

// ---- Comment formatting ----

/// Leading-digits parse of a rendered like count. YouTube renders small
/// counts as plain numbers; abbreviated counts ("1.2K") degrade to their
/// leading digits, which only affects ordering hints in the prompt.
pub fn parse_like_count(text: &str) -> u32 {
    let trimmed = text.trim();
    let digits: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Renders collected comments as the prompt payload sent to the provider.
pub fn format_comments_for_prompt(comments: &[Comment]) -> String {
    let mut formatted = format!("Total {} comments (sorted by relevance):\n\n", comments.len());
    for (index, comment) in comments.iter().enumerate() {
        formatted.push_str(&format!(
            "{}. {} (👍 {})\n{}\n",
            index + 1,
            comment.author,
            comment.likes,
            comment.content
        ));
        if !comment.replies.is_empty() {
            formatted.push_str(&format!("Replies ({}):\n", comment.replies.len()));
            for reply in &comment.replies {
                formatted.push_str(&format!("  └ {}: {}\n", reply.author, reply.content));
            }
        }
        formatted.push('\n');
    }
    formatted
}

// ---- DOM harvest ----

/// Scroll-driven comment harvest. Reports progress through `on_progress`
/// after each comment lands. Stops at MAX_COMMENTS or when scrolling stops
/// producing new threads.
pub async fn collect_comments_dom(
    host: &HostPage,
    on_progress: &dyn Fn(u32),
) -> Result<Vec<Comment>, SummarizeError> {
    let document = host.document().ok_or(SummarizeError::NoComments)?;
    let section = scroll_to_comments_section(&document)
        .await
        .ok_or(SummarizeError::NoComments)?;
    info!("comments section located, harvesting");

    let mut comments: Vec<Comment> = Vec::new();
    let mut scanned: u32 = 0;
    let mut attempts = 0;

    while comments.len() < MAX_COMMENTS && attempts < MAX_SCROLL_ATTEMPTS {
        attempts += 1;

        let threads = section
            .query_selector_all(COMMENT_THREAD_SELECTOR)
            .map_err(|_| SummarizeError::NoComments)?;

        for index in unscanned_range(scanned, threads.length()) {
            if comments.len() >= MAX_COMMENTS {
                break;
            }
            if let Some(thread) = threads.item(index).and_then(|n| n.dyn_into::<Element>().ok())
            {
                if let Some(comment) = extract_comment(&thread).await {
                    comments.push(comment);
                    on_progress(comments.len() as u32);
                }
            }
            scanned = index + 1;
        }

        if comments.len() >= MAX_COMMENTS {
            break;
        }
        match threads
            .item(threads.length().saturating_sub(1))
            .and_then(|n| n.dyn_into::<Element>().ok())
        {
            Some(last) => {
                scroll_into_view(&last, web_sys::ScrollLogicalPosition::End);
                sleep(2000).await;
            }
            None => break,
        }
    }

    info!("harvested {} comments in {attempts} passes", comments.len());
    if comments.is_empty() {
        Err(SummarizeError::NoComments)
    } else {
        Ok(comments)
    }
}

/// Threads already scanned are never revisited, even when some of them
/// yielded nothing. A thread count only grows, so the unscanned tail is the
/// range past the scan cursor.
fn unscanned_range(scanned: u32, available: u32) -> std::ops::Range<u32> {
    scanned.min(available)..available
}

/// Comments load lazily; scroll to the bottom until the section mounts.
async fn scroll_to_comments_section(document: &web_sys::Document) -> Option<Element> {
    for _ in 0..MAX_SECTION_LOOKUPS {
        if let Ok(Some(section)) = document.query_selector(COMMENTS_SECTION_SELECTOR) {
            scroll_into_view(&section, web_sys::ScrollLogicalPosition::Start);
            sleep(1000).await;
            return Some(section);
        }
        if let (Some(window), Some(body)) = (web_sys::window(), document.body()) {
            window.scroll_to_with_x_and_y(0.0, body.scroll_height() as f64);
        }
        sleep(2000).await;
    }
    None
}

fn scroll_into_view(element: &Element, block: web_sys::ScrollLogicalPosition) {
    let options = web_sys::ScrollIntoViewOptions::new();
    options.set_behavior(web_sys::ScrollBehavior::Smooth);
    options.set_block(block);
    element.scroll_into_view_with_scroll_into_view_options(&options);
}

async fn extract_comment(thread: &Element) -> Option<Comment> {
    let main = thread.query_selector(COMMENT_MAIN_SELECTOR).ok()??;

    let author = selected_text(&main, COMMENT_AUTHOR_SELECTOR).unwrap_or_else(|| "anonymous".to_string());
    let content = selected_text(&main, COMMENT_TEXT_SELECTOR)?;
    let likes = main
        .query_selector(COMMENT_LIKES_SELECTOR)
        .ok()
        .flatten()
        .and_then(|e| e.text_content())
        .map(|t| parse_like_count(&t))
        .unwrap_or(0);

    let mut replies = Vec::new();
    if let Ok(Some(button)) = thread.query_selector(COMMENT_REPLIES_BUTTON_SELECTOR) {
        if !button.has_attribute("hidden") {
            if let Some(button) = button.dyn_ref::<HtmlElement>() {
                button.click();
                sleep(1000).await;
            }
            if let Ok(nodes) = thread.query_selector_all(COMMENT_REPLY_SELECTOR) {
                for i in 0..nodes.length().min(MAX_REPLIES_PER_COMMENT as u32) {
                    if let Some(reply) = nodes
                        .item(i)
                        .and_then(|n| n.dyn_into::<Element>().ok())
                        .and_then(|e| extract_reply(&e))
                    {
                        replies.push(reply);
                    }
                }
            }
        }
    }

    Some(Comment {
        author,
        content,
        likes,
        replies,
    })
}

fn extract_reply(element: &Element) -> Option<Reply> {
    let author = selected_text(element, COMMENT_AUTHOR_SELECTOR)
        .unwrap_or_else(|| "anonymous".to_string());
    let content = selected_text(element, COMMENT_TEXT_SELECTOR)?;
    let likes = element
        .query_selector(COMMENT_LIKES_SELECTOR)
        .ok()
        .flatten()
        .and_then(|e| e.text_content())
        .map(|t| parse_like_count(&t))
        .unwrap_or(0);
    Some(Reply {
        author,
        content,
        likes,
    })
}

fn selected_text(element: &Element, selector: &str) -> Option<String> {
    let text = element
        .query_selector(selector)
        .ok()??
        .text_content()?
        .trim()
        .to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

// ---- YouTube Data API harvest ----

const COMMENT_THREADS_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/commentThreads";

#[derive(Debug, Deserialize)]
pub struct ThreadsResponse {
    #[serde(default)]
    pub items: Vec<ThreadItem>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ThreadItem {
    pub snippet: ThreadSnippet,
    pub replies: Option<ThreadReplies>,
}

#[derive(Debug, Deserialize)]
pub struct ThreadSnippet {
    #[serde(rename = "topLevelComment")]
    pub top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
pub struct TopLevelComment {
    pub snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
pub struct CommentSnippet {
    #[serde(rename = "authorDisplayName")]
    pub author: String,
    #[serde(rename = "textDisplay")]
    pub text: String,
    #[serde(rename = "likeCount", default)]
    pub like_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct ThreadReplies {
    #[serde(default)]
    pub comments: Vec<ReplyItem>,
}

#[derive(Debug, Deserialize)]
pub struct ReplyItem {
    pub snippet: CommentSnippet,
}

pub fn threads_to_comments(response: ThreadsResponse) -> (Vec<Comment>, Option<String>) {
    let comments = response
        .items
        .into_iter()
        .map(|item| {
            let top = item.snippet.top_level_comment.snippet;
            let replies = item
                .replies
                .map(|r| {
                    r.comments
                        .into_iter()
                        .take(MAX_REPLIES_PER_COMMENT)
                        .map(|reply| Reply {
                            author: reply.snippet.author,
                            content: reply.snippet.text,
                            likes: reply.snippet.like_count,
                        })
                        .collect()
                })
                .unwrap_or_default();
            Comment {
                author: top.author,
                content: top.text,
                likes: top.like_count,
                replies,
            }
        })
        .collect();
    (comments, response.next_page_token)
}

/// Maps a Data API failure to the message shown in the comments view.
pub fn api_error_message(status: u16, body: &str) -> String {
    match status {
        403 if body.contains("quotaExceeded") => {
            "YouTube API daily quota exceeded. Try again tomorrow or use on-page collection."
                .to_string()
        }
        403 if body.contains("disabled") => {
            "Comments are disabled for this video.".to_string()
        }
        403 => "The YouTube API key is invalid or lacks permission. Check your settings."
            .to_string(),
        404 => "Video not found. It may be private or deleted.".to_string(),
        400 => "The YouTube API request was malformed. Check the video id.".to_string(),
        _ => format!("YouTube API error ({status})"),
    }
}

/// Fetches up to MAX_COMMENTS top comments through the Data API, ordered by
/// relevance, following page tokens.
pub async fn collect_comments_api(
    video_id: &str,
    api_key: &str,
    on_progress: &dyn Fn(u32),
) -> Result<Vec<Comment>, SummarizeError> {
    info!("collecting comments through the Data API");
    let client = reqwest::Client::new();
    let mut all: Vec<Comment> = Vec::new();
    let mut page_token: Option<String> = None;

    while all.len() < MAX_COMMENTS {
        let remaining = (MAX_COMMENTS - all.len()).to_string();
        let mut query: Vec<(&str, &str)> = vec![
            ("part", "snippet,replies"),
            ("videoId", video_id),
            ("order", "relevance"),
            ("maxResults", &remaining),
            ("key", api_key),
        ];
        if let Some(token) = page_token.as_deref() {
            query.push(("pageToken", token));
        }

        let response = client
            .get(COMMENT_THREADS_ENDPOINT)
            .query(&query)
            .send()
            .await?;
        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Data API call failed with {status}");
            return Err(SummarizeError::Provider {
                status,
                message: api_error_message(status, &body),
            });
        }

        let (comments, next) = threads_to_comments(response.json::<ThreadsResponse>().await?);
        all.extend(comments);
        on_progress(all.len().min(MAX_COMMENTS) as u32);

        match next {
            Some(token) if all.len() < MAX_COMMENTS => {
                page_token = Some(token);
                sleep(100).await;
            }
            _ => break,
        }
    }

    all.truncate(MAX_COMMENTS);
    if all.is_empty() {
        Err(SummarizeError::NoComments)
    } else {
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_segments_trims_and_drops_empties() {
        let segments = vec![
            "  hello  ".to_string(),
            "".to_string(),
            "   ".to_string(),
            "world".to_string(),
        ];
        assert_eq!(
            join_segments(segments.into_iter()),
            Some("hello\nworld".to_string())
        );
    }

    #[test]
    fn test_join_segments_all_empty_is_none() {
        let segments = vec!["".to_string(), "  ".to_string()];
        assert_eq!(join_segments(segments.into_iter()), None);
        assert_eq!(join_segments(std::iter::empty()), None);
    }

    #[test]
    fn test_parse_like_count() {
        assert_eq!(parse_like_count("42"), 42);
        assert_eq!(parse_like_count("  7  "), 7);
        assert_eq!(parse_like_count("1.2K"), 1);
        assert_eq!(parse_like_count(""), 0);
        assert_eq!(parse_like_count("likes"), 0);
    }

    #[test]
    fn test_unscanned_range_resumes_after_skipped_threads() {
        // 5 threads scanned so far, only 3 yielded comments; the next pass
        // still starts at 5 rather than re-extracting the earlier threads.
        let range = unscanned_range(5, 8);
        assert_eq!(range, 5..8);
        assert!(!range.contains(&4));
    }

    #[test]
    fn test_unscanned_range_empty_when_nothing_new() {
        assert!(unscanned_range(5, 5).is_empty());
        assert!(unscanned_range(7, 5).is_empty());
        assert_eq!(unscanned_range(0, 3), 0..3);
    }

    #[test]
    fn test_format_comments_for_prompt() {
        let comments = vec![
            Comment {
                author: "alice".to_string(),
                content: "Great video".to_string(),
                likes: 12,
                replies: vec![Reply {
                    author: "bob".to_string(),
                    content: "Agreed".to_string(),
                    likes: 2,
                }],
            },
            Comment {
                author: "carol".to_string(),
                content: "First".to_string(),
                likes: 0,
                replies: vec![],
            },
        ];

        let formatted = format_comments_for_prompt(&comments);

        assert!(formatted.starts_with("Total 2 comments"));
        assert!(formatted.contains("1. alice (👍 12)\nGreat video"));
        assert!(formatted.contains("Replies (1):\n  └ bob: Agreed"));
        assert!(formatted.contains("2. carol (👍 0)\nFirst"));
    }

    #[test]
    fn test_threads_to_comments_caps_replies() {
        let replies: Vec<String> = (0..15)
            .map(|i| {
                format!(
                    r#"{{"snippet": {{"authorDisplayName": "r{i}", "textDisplay": "reply {i}", "likeCount": 0}}}}"#
                )
            })
            .collect();
        let json = format!(
            r#"{{
                "items": [{{
                    "snippet": {{"topLevelComment": {{"snippet": {{
                        "authorDisplayName": "alice",
                        "textDisplay": "top comment",
                        "likeCount": 3
                    }}}}}},
                    "replies": {{"comments": [{}]}}
                }}],
                "nextPageToken": "tok"
            }}"#,
            replies.join(",")
        );
        let response: ThreadsResponse = serde_json::from_str(&json).unwrap();

        let (comments, next) = threads_to_comments(response);

        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].author, "alice");
        assert_eq!(comments[0].likes, 3);
        assert_eq!(comments[0].replies.len(), MAX_REPLIES_PER_COMMENT);
        assert_eq!(next.as_deref(), Some("tok"));
    }

    #[test]
    fn test_threads_to_comments_without_replies() {
        let json = r#"{
            "items": [{
                "snippet": {"topLevelComment": {"snippet": {
                    "authorDisplayName": "bob",
                    "textDisplay": "no replies here"
                }}}
            }]
        }"#;
        let response: ThreadsResponse = serde_json::from_str(json).unwrap();

        let (comments, next) = threads_to_comments(response);

        assert_eq!(comments[0].likes, 0);
        assert!(comments[0].replies.is_empty());
        assert!(next.is_none());
    }

    #[test]
    fn test_api_error_messages() {
        assert!(api_error_message(403, r#"{"reason": "quotaExceeded"}"#).contains("quota"));
        assert!(api_error_message(403, r#"{"reason": "commentsDisabled"}"#).contains("disabled"));
        assert!(api_error_message(403, "{}").contains("API key"));
        assert!(api_error_message(404, "").contains("not found"));
        assert!(api_error_message(500, "").contains("500"));
    }
}

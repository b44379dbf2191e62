/// Generation pipelines: summary and comments-summary, cache first
///
/// Every await is a chance for the user to navigate away. The active video id
/// is re-checked after each one, and again immediately before the two
/// irreversible steps: writing the cache and rendering into the UI. A result
/// that outlives its page is dropped without a trace.
use std::cell::RefCell;
use std::rc::Rc;

use log::{info, warn};
use wasm_bindgen_futures::JsFuture;

use crate::config::Settings;
use crate::error::SummarizeError;
use crate::extract;
use crate::host::HostPage;
use crate::provider;
use crate::render;
use crate::session::SessionState;
use crate::signals::sleep;
use crate::storage;
use crate::ui::builder::UiHandles;
use crate::ui::tabs;

const COPY_FEEDBACK_MS: i32 = 2000;

/// Where comments come from for a given configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentSource {
    DataApi,
    DomHarvest,
}

pub fn comment_source(has_api_key: bool) -> CommentSource {
    if has_api_key {
        CommentSource::DataApi
    } else {
        CommentSource::DomHarvest
    }
}

/// A result is stale when the page has moved on from the video it belongs to.
pub fn is_stale(result_video_id: &str, current: Option<&str>) -> bool {
    current != Some(result_video_id)
}

pub fn compose_prompt(instructions: &str, payload: &str) -> String {
    format!("{instructions}\n\n{payload}")
}

/// Shared handles the pipelines run against. Cheap to clone; the supervisor
/// owns the originals.
#[derive(Clone)]
pub struct PipelineCtx {
    pub host: HostPage,
    pub session: Rc<RefCell<SessionState>>,
    pub ui: Rc<RefCell<Option<UiHandles>>>,
}

impl PipelineCtx {
    /// True while `video_id` is still both on screen and the session's
    /// active video.
    fn still_current(&self, video_id: &str) -> bool {
        !is_stale(video_id, self.host.current_video_id().as_deref())
            && !is_stale(video_id, self.session.borrow().active_video_id.as_deref())
    }

    fn with_ui(&self, f: impl FnOnce(&UiHandles)) {
        if let Some(ui) = self.ui.borrow().as_ref() {
            f(ui);
        }
    }

    /// Text arrival or loss changes whether copy is usable.
    fn refresh_copy_state(&self) {
        let session = self.session.borrow();
        tabs::set_copy_enabled(tabs::copy_enabled(
            session.active_tab,
            session.copy_text().is_some(),
        ));
    }

    // ---- summary ----

    /// Shows the summary view's content: cached if available, generated
    /// otherwise. `force` bypasses and replaces the cache.
    pub async fn load_summary(&self, force: bool) {
        let Some(video_id) = self.session.borrow().active_video_id.clone() else {
            return;
        };

        // Already rendered for this video and not forced: nothing to do.
        if !force && self.session.borrow().summary_text.is_some() {
            return;
        }

        self.with_ui(|ui| ui.show_summary_loading());

        if force {
            storage::clear_summary(&video_id).await;
            self.session.borrow_mut().summary_text = None;
            self.refresh_copy_state();
        } else if let Some(cached) = storage::cached_summary(&video_id).await {
            if !self.still_current(&video_id) {
                return;
            }
            info!("summary served from cache for {video_id}");
            self.finish_summary(&video_id, cached);
            return;
        }

        match self.generate_summary(&video_id).await {
            Ok(text) => self.finish_summary(&video_id, text),
            Err(e) if e.is_silent() => {}
            Err(e) => self.with_ui(|ui| ui.show_summary_error(&e.to_string())),
        }
    }

    async fn generate_summary(&self, video_id: &str) -> Result<String, SummarizeError> {
        let transcript = extract::transcript_text(&self.host)?;
        let settings = Settings::load().await;
        if !self.still_current(video_id) {
            return Err(SummarizeError::Stale);
        }

        let prompt = compose_prompt(&settings.summary_prompt, &transcript);
        let text = provider::generate(&settings, prompt).await?;

        // Guard the cache write: a summary for video A must never be stored
        // while video B is active.
        if !self.still_current(video_id) {
            return Err(SummarizeError::Stale);
        }
        storage::store_summary(video_id, &text).await;

        if !self.still_current(video_id) {
            return Err(SummarizeError::Stale);
        }
        Ok(text)
    }

    fn finish_summary(&self, video_id: &str, text: String) {
        if !self.still_current(video_id) {
            return;
        }
        self.with_ui(|ui| ui.render_summary(&render::markdown_to_html(&text)));
        self.session.borrow_mut().summary_text = Some(text);
        self.refresh_copy_state();
    }

    // ---- comments ----

    pub async fn load_comments(&self, force: bool) {
        let Some(video_id) = self.session.borrow().active_video_id.clone() else {
            return;
        };

        if !force && self.session.borrow().comments_summary_text.is_some() {
            return;
        }

        // One collection run at a time; a second request while scrolling is
        // in progress would interleave DOM reads.
        {
            let mut session = self.session.borrow_mut();
            if session.collecting {
                info!("comment collection already running, ignoring request");
                return;
            }
            session.collecting = true;
        }

        self.with_ui(|ui| ui.show_comments_loading());

        if force {
            storage::clear_comments_summary(&video_id).await;
            self.session.borrow_mut().comments_summary_text = None;
            self.refresh_copy_state();
        }

        let result = if !force {
            match storage::cached_comments_summary(&video_id).await {
                Some(cached) => Ok(cached),
                None => self.generate_comments_summary(&video_id).await,
            }
        } else {
            self.generate_comments_summary(&video_id).await
        };

        self.session.borrow_mut().collecting = false;

        match result {
            Ok(text) => self.finish_comments(&video_id, text),
            Err(e) if e.is_silent() => {}
            Err(e) => self.with_ui(|ui| ui.show_comments_error(&e.to_string())),
        }
    }

    async fn generate_comments_summary(&self, video_id: &str) -> Result<String, SummarizeError> {
        let settings = Settings::load().await;
        if !self.still_current(video_id) {
            return Err(SummarizeError::Stale);
        }

        self.session
            .borrow_mut()
            .comments
            .reset(extract::MAX_COMMENTS as u32);

        let ctx = self.clone();
        let on_progress = move |current: u32| {
            ctx.session.borrow_mut().comments.progress_current = current;
            ctx.with_ui(|ui| ui.show_comments_progress(current, extract::MAX_COMMENTS as u32));
        };

        let comments = match comment_source(settings.youtube_key.is_some()) {
            CommentSource::DataApi => {
                let key = settings.youtube_key.as_deref().unwrap_or_default();
                match extract::collect_comments_api(video_id, key, &on_progress).await {
                    Ok(comments) => comments,
                    Err(e) => {
                        // The API path fails for reasons the on-page harvest
                        // does not share (quota, key scope). Fall back.
                        warn!("Data API collection failed, falling back to DOM: {e}");
                        extract::collect_comments_dom(&self.host, &on_progress).await?
                    }
                }
            }
            CommentSource::DomHarvest => {
                extract::collect_comments_dom(&self.host, &on_progress).await?
            }
        };

        if !self.still_current(video_id) {
            return Err(SummarizeError::Stale);
        }
        let prompt = compose_prompt(
            &settings.comments_prompt,
            &extract::format_comments_for_prompt(&comments),
        );
        self.session.borrow_mut().comments.items = comments;
        let text = provider::generate(&settings, prompt).await?;

        if !self.still_current(video_id) {
            return Err(SummarizeError::Stale);
        }
        storage::store_comments_summary(video_id, &text).await;

        if !self.still_current(video_id) {
            return Err(SummarizeError::Stale);
        }
        Ok(text)
    }

    fn finish_comments(&self, video_id: &str, text: String) {
        if !self.still_current(video_id) {
            return;
        }
        self.with_ui(|ui| ui.render_comments_summary(&render::markdown_to_html(&text)));
        self.session.borrow_mut().comments_summary_text = Some(text);
        self.refresh_copy_state();
    }

    // ---- copy ----

    /// Copies the active view's raw markdown to the clipboard with a short
    /// label flip as feedback. Inert on the native tab.
    pub async fn copy_active(&self) {
        let Some(text) = self.session.borrow().copy_text().map(str::to_string) else {
            return;
        };
        let Some(window) = web_sys::window() else {
            return;
        };

        let label = match JsFuture::from(window.navigator().clipboard().write_text(&text)).await {
            Ok(_) => "Copied!",
            Err(e) => {
                warn!("clipboard write failed: {e:?}");
                "Copy failed"
            }
        };
        self.with_ui(|ui| ui.set_copy_label(label));
        sleep(COPY_FEEDBACK_MS).await;
        self.with_ui(|ui| ui.set_copy_label("Copy"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_stale() {
        assert!(!is_stale("abc", Some("abc")));
        assert!(is_stale("abc", Some("def")));
        assert!(is_stale("abc", None));
    }

    #[test]
    fn test_comment_source_prefers_api_when_keyed() {
        assert_eq!(comment_source(true), CommentSource::DataApi);
        assert_eq!(comment_source(false), CommentSource::DomHarvest);
    }

    #[test]
    fn test_compose_prompt_separates_sections() {
        let prompt = compose_prompt("Summarize this:", "line one\nline two");
        assert_eq!(prompt, "Summarize this:\n\nline one\nline two");
    }
}

/// Per-page session state for the injected summary UI
use crate::ui::tabs::Tab;

/// A top-level comment harvested from the watch page or the Data API.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub author: String,
    pub content: String,
    pub likes: u32,
    pub replies: Vec<Reply>,
}

/// A reply under a top-level comment. Replies do not nest further.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub author: String,
    pub content: String,
    pub likes: u32,
}

/// Working buffer for one comment-collection run. Reset per video, discarded
/// once a comments summary has been generated and cached.
#[derive(Debug, Default)]
pub struct CommentCollection {
    pub items: Vec<Comment>,
    pub progress_current: u32,
    pub progress_total: u32,
}

impl CommentCollection {
    pub fn reset(&mut self, total: u32) {
        self.items.clear();
        self.progress_current = 0;
        self.progress_total = total;
    }
}

/// All mutable state for one loaded page. One logical instance exists per
/// page load, owned by the supervisor; constructed fresh, overwritten on
/// every navigation, never left stale while its UI is shown.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Cache key for everything the page shows. Set on navigation.
    pub active_video_id: Option<String>,
    pub active_tab: Tab,
    /// Last successfully rendered raw markdown, held for the copy action.
    pub summary_text: Option<String>,
    pub comments_summary_text: Option<String>,
    pub comments: CommentCollection,
    /// Guards against overlapping collection runs.
    pub collecting: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switches the session to a new video, clearing every per-video value.
    /// Returns true if the id actually changed.
    pub fn begin_video(&mut self, video_id: Option<String>) -> bool {
        if self.active_video_id == video_id {
            return false;
        }
        self.active_video_id = video_id;
        self.active_tab = Tab::Native;
        self.summary_text = None;
        self.comments_summary_text = None;
        self.comments.reset(0);
        self.collecting = false;
        true
    }

    /// Raw text behind the currently active view, if any. The copy action is
    /// inert while this is None.
    pub fn copy_text(&self) -> Option<&str> {
        match self.active_tab {
            Tab::Native => None,
            Tab::Summary => self.summary_text.as_deref(),
            Tab::Comments => self.comments_summary_text.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated_session() -> SessionState {
        let mut session = SessionState::new();
        session.begin_video(Some("abc123".to_string()));
        session.active_tab = Tab::Summary;
        session.summary_text = Some("Hello summary".to_string());
        session.comments_summary_text = Some("Hello comments".to_string());
        session.comments.items.push(Comment {
            author: "a".to_string(),
            content: "b".to_string(),
            likes: 1,
            replies: vec![],
        });
        session.comments.progress_current = 1;
        session.collecting = true;
        session
    }

    #[test]
    fn test_begin_video_resets_everything() {
        let mut session = populated_session();

        let changed = session.begin_video(Some("def456".to_string()));

        assert!(changed);
        assert_eq!(session.active_video_id.as_deref(), Some("def456"));
        assert_eq!(session.active_tab, Tab::Native);
        assert!(session.summary_text.is_none());
        assert!(session.comments_summary_text.is_none());
        assert!(session.comments.items.is_empty());
        assert_eq!(session.comments.progress_current, 0);
        assert!(!session.collecting);
    }

    #[test]
    fn test_begin_same_video_is_noop() {
        let mut session = populated_session();

        let changed = session.begin_video(Some("abc123".to_string()));

        assert!(!changed);
        assert_eq!(session.summary_text.as_deref(), Some("Hello summary"));
        assert!(session.collecting);
    }

    #[test]
    fn test_begin_video_none_clears_id() {
        let mut session = populated_session();

        assert!(session.begin_video(None));
        assert!(session.active_video_id.is_none());
        assert!(session.summary_text.is_none());
    }

    #[test]
    fn test_copy_text_follows_active_tab() {
        let mut session = populated_session();

        assert_eq!(session.copy_text(), Some("Hello summary"));

        session.active_tab = Tab::Comments;
        assert_eq!(session.copy_text(), Some("Hello comments"));

        session.active_tab = Tab::Native;
        assert_eq!(session.copy_text(), None);
    }

    #[test]
    fn test_collection_reset() {
        let mut collection = CommentCollection::default();
        collection.items.push(Comment {
            author: "x".to_string(),
            content: "y".to_string(),
            likes: 0,
            replies: vec![],
        });
        collection.progress_current = 7;

        collection.reset(100);

        assert!(collection.items.is_empty());
        assert_eq!(collection.progress_current, 0);
        assert_eq!(collection.progress_total, 100);
    }
}

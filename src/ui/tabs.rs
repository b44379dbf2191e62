/// Tab controller: three mutually exclusive views inside the host panel
///
/// The native view is YouTube's own transcript list; switching away hides it
/// with inline styles rather than detaching it, so the host's own state stays
/// untouched.
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement};

use crate::host::{HostPage, SEARCH_PANEL_SELECTOR, SEGMENT_LIST_SELECTOR};
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Native,
    Summary,
    Comments,
}

impl Tab {
    pub fn button_id(&self) -> &'static str {
        match self {
            Tab::Native => ui::TAB_NATIVE_ID,
            Tab::Summary => ui::TAB_SUMMARY_ID,
            Tab::Comments => ui::TAB_COMMENTS_ID,
        }
    }
}

/// Which of the three views is shown. Exactly one is ever true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub native_visible: bool,
    pub summary_visible: bool,
    pub comments_visible: bool,
}

pub fn layout(tab: Tab) -> Layout {
    Layout {
        native_visible: tab == Tab::Native,
        summary_visible: tab == Tab::Summary,
        comments_visible: tab == Tab::Comments,
    }
}

/// Whether the copy action is usable: never on the native view, and only
/// once the active view actually holds text.
pub fn copy_enabled(tab: Tab, text_available: bool) -> bool {
    tab != Tab::Native && text_available
}

/// Applies a tab's layout to the live document. Safe to call redundantly;
/// it only writes styles and classes. `text_available` reflects whether the
/// active view already holds copyable text.
pub fn apply(host: &HostPage, tab: Tab, text_available: bool) {
    let Some(document) = host.document() else {
        return;
    };
    let desired = layout(tab);

    if let Some(panel) = host.panel() {
        for selector in [SEGMENT_LIST_SELECTOR, SEARCH_PANEL_SELECTOR] {
            if let Ok(Some(element)) = panel.query_selector(selector) {
                set_visible(&element, desired.native_visible);
            }
        }
    }

    if let Some(region) = document.get_element_by_id(ui::SUMMARY_REGION_ID) {
        set_visible(&region, desired.summary_visible);
    }
    if let Some(region) = document.get_element_by_id(ui::COMMENTS_REGION_ID) {
        set_visible(&region, desired.comments_visible);
    }

    for candidate in [Tab::Native, Tab::Summary, Tab::Comments] {
        if let Some(button) = document.get_element_by_id(candidate.button_id()) {
            let classes = button.class_list();
            let _ = if candidate == tab {
                classes.add_1(ui::ACTIVE_CLASS)
            } else {
                classes.remove_1(ui::ACTIVE_CLASS)
            };
        }
    }

    set_copy_enabled(copy_enabled(tab, text_available));
}

/// Flips the copy button between usable and inert.
pub fn set_copy_enabled(enabled: bool) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    if let Some(button) = document
        .get_element_by_id(ui::COPY_BUTTON_ID)
        .and_then(|e| e.dyn_into::<web_sys::HtmlButtonElement>().ok())
    {
        button.set_disabled(!enabled);
        let _ = button
            .style()
            .set_property("opacity", if enabled { "1" } else { "0.5" });
    }
}

fn set_visible(element: &Element, visible: bool) {
    if let Some(html) = element.dyn_ref::<HtmlElement>() {
        let _ = html
            .style()
            .set_property("display", if visible { "" } else { "none" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tab_is_native() {
        assert_eq!(Tab::default(), Tab::Native);
    }

    #[test]
    fn test_layout_is_exclusive() {
        for tab in [Tab::Native, Tab::Summary, Tab::Comments] {
            let layout = layout(tab);
            let visible = [
                layout.native_visible,
                layout.summary_visible,
                layout.comments_visible,
            ];
            assert_eq!(visible.iter().filter(|v| **v).count(), 1, "{tab:?}");
        }
    }

    #[test]
    fn test_layout_matches_tab() {
        assert!(layout(Tab::Native).native_visible);
        assert!(layout(Tab::Summary).summary_visible);
        assert!(layout(Tab::Comments).comments_visible);
    }

    #[test]
    fn test_copy_enabled_requires_text() {
        // The native view never offers copy; generated views offer it only
        // once their text has arrived.
        assert!(!copy_enabled(Tab::Native, true));
        assert!(!copy_enabled(Tab::Native, false));
        assert!(!copy_enabled(Tab::Summary, false));
        assert!(copy_enabled(Tab::Summary, true));
        assert!(!copy_enabled(Tab::Comments, false));
        assert!(copy_enabled(Tab::Comments, true));
    }

    #[test]
    fn test_button_ids_are_distinct() {
        let ids = [
            Tab::Native.button_id(),
            Tab::Summary.button_id(),
            Tab::Comments.button_id(),
        ];
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert_ne!(ids[0], ids[2]);
    }
}

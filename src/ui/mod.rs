/// Injected UI: element ids, builder and tab controller
///
/// Every element the extension owns carries a td-* id so presence checks and
/// event wiring resolve by id instead of holding references into a subtree
/// the host can replace at any time.
pub mod builder;
pub mod tabs;

pub const ROOT_ID: &str = "tube-digest-root";

pub const TAB_NATIVE_ID: &str = "td-tab-native";
pub const TAB_SUMMARY_ID: &str = "td-tab-summary";
pub const TAB_COMMENTS_ID: &str = "td-tab-comments";
pub const COPY_BUTTON_ID: &str = "td-copy-button";
pub const REFRESH_BUTTON_ID: &str = "td-refresh-button";

pub const SUMMARY_REGION_ID: &str = "td-summary-region";
pub const SUMMARY_LOADING_ID: &str = "td-summary-loading";
pub const SUMMARY_ERROR_ID: &str = "td-summary-error";
pub const SUMMARY_TEXT_ID: &str = "td-summary-text";

pub const COMMENTS_REGION_ID: &str = "td-comments-region";
pub const COMMENTS_LOADING_ID: &str = "td-comments-loading";
pub const COMMENTS_ERROR_ID: &str = "td-comments-error";
pub const COMMENTS_TEXT_ID: &str = "td-comments-text";
pub const COMMENTS_PROGRESS_ID: &str = "td-comments-progress";

pub const STYLE_ID: &str = "td-styles";

pub const ACTIVE_CLASS: &str = "active";

/// Ids that must all resolve for the UI to count as intact. The supervisor
/// walks this list on every recheck.
pub const REQUIRED_IDS: &[&str] = &[
    ROOT_ID,
    TAB_NATIVE_ID,
    TAB_SUMMARY_ID,
    TAB_COMMENTS_ID,
    COPY_BUTTON_ID,
    REFRESH_BUTTON_ID,
    SUMMARY_REGION_ID,
    COMMENTS_REGION_ID,
];

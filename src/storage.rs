/// Cache and settings access over chrome.storage.local
///
/// The chrome.* promise APIs are reached through a small JS bridge; every
/// Rust-side helper flattens bridge failures into None or logs them, because
/// a broken cache must never take the UI down with it.
use log::warn;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(module = "/content_bridge.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getStorage(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(key: &str, value: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn removeStorage(key: &str) -> Result<(), JsValue>;
}

/// Cache key for a video's transcript summary.
pub fn summary_key(video_id: &str) -> String {
    format!("summary_{video_id}")
}

/// Cache key for a video's comments summary.
pub fn comments_summary_key(video_id: &str) -> String {
    format!("comments_summary_{video_id}")
}

/// Reads a string value; None when absent, unset, or the bridge fails.
pub async fn get_string(key: &str) -> Option<String> {
    match getStorage(key).await {
        Ok(value) => value.as_string().filter(|s| !s.is_empty()),
        Err(e) => {
            warn!("storage read failed for {key}: {e:?}");
            None
        }
    }
}

async fn set_string(key: &str, value: &str) {
    if let Err(e) = setStorage(key, JsValue::from_str(value)).await {
        warn!("storage write failed for {key}: {e:?}");
    }
}

async fn remove(key: &str) {
    if let Err(e) = removeStorage(key).await {
        warn!("storage remove failed for {key}: {e:?}");
    }
}

pub async fn cached_summary(video_id: &str) -> Option<String> {
    get_string(&summary_key(video_id)).await
}

pub async fn store_summary(video_id: &str, text: &str) {
    set_string(&summary_key(video_id), text).await;
}

pub async fn clear_summary(video_id: &str) {
    remove(&summary_key(video_id)).await;
}

pub async fn cached_comments_summary(video_id: &str) -> Option<String> {
    get_string(&comments_summary_key(video_id)).await
}

pub async fn store_comments_summary(video_id: &str, text: &str) {
    set_string(&comments_summary_key(video_id), text).await;
}

pub async fn clear_comments_summary(video_id: &str) {
    remove(&comments_summary_key(video_id)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_key_naming() {
        assert_eq!(summary_key("abc123"), "summary_abc123");
        assert_eq!(comments_summary_key("abc123"), "comments_summary_abc123");
    }

    #[test]
    fn test_keys_for_different_videos_never_collide() {
        assert_ne!(summary_key("a"), summary_key("b"));
        assert_ne!(summary_key("x"), comments_summary_key("x"));
    }

    #[test]
    fn test_per_video_writes_use_only_the_two_cache_keys() {
        // The summary and comments-summary entries are the whole per-video
        // write set; no bare comments_<id> key exists.
        assert_eq!(summary_key("v1"), "summary_v1");
        assert_eq!(comments_summary_key("v1"), "comments_summary_v1");
        assert_ne!(comments_summary_key("v1"), "comments_v1");
    }
}

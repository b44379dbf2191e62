/// Change signals: everything that can mean "the page may have changed"
///
/// YouTube is a SPA, so document loads say nothing. The supervisor instead
/// listens to the host's navigation event, a debounced mutation observer,
/// visibility and focus regains, and a slow poll as the last-resort net.
/// Every signal funnels into one handler; the supervisor treats them all as
/// "take a fresh snapshot now".
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::warn;
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CustomEvent, Element, MutationObserver, MutationObserverInit, MutationRecord};

use crate::ui;

/// YouTube fires this on every SPA navigation, after the new page's critical
/// data has loaded.
pub const NAVIGATE_EVENT: &str = "yt-navigate-finish";

pub const MUTATION_DEBOUNCE_MS: i32 = 500;
pub const POLL_INTERVAL_MS: i32 = 500;

/// Decoded detail of the navigation event. Both fields are best-effort; the
/// supervisor falls back to the live location when they are absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct NavigateDetail {
    #[serde(default, rename = "pageType")]
    pub page_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl NavigateDetail {
    fn from_event(event: &web_sys::Event) -> Option<NavigateDetail> {
        let custom = event.dyn_ref::<CustomEvent>()?;
        serde_wasm_bindgen::from_value(custom.detail()).ok()
    }
}

/// Whether a navigation event's page type is a video watch page.
pub fn is_watch_page_type(page_type: &str) -> bool {
    page_type == "watch"
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// SPA navigation finished; the video id may have changed.
    Navigated(Option<NavigateDetail>),
    /// The observed subtree churned (debounced).
    Mutation,
    /// Tab became visible or window regained focus.
    VisibilityRegained,
    /// Periodic safety-net tick.
    Poll,
    /// User interacted with the host panel's own controls.
    HostInteraction,
}

/// Resolves a setTimeout-backed future after `ms` milliseconds.
pub async fn sleep(ms: i32) {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        if let Some(window) = web_sys::window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

/// Trailing-edge debounce over window timeouts. Each schedule supplants the
/// pending action and re-arms the timer against one long-lived callback, so
/// a suppressed schedule leaves nothing allocated behind.
pub struct Debounce {
    state: Rc<DebounceState>,
    delay_ms: i32,
    // Created on first schedule, reused for every timeout after that.
    fire: RefCell<Option<Closure<dyn FnMut()>>>,
}

struct DebounceState {
    handle: Cell<Option<i32>>,
    pending: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl DebounceState {
    fn replace_pending(&self, run: Box<dyn FnOnce()>) {
        *self.pending.borrow_mut() = Some(run);
    }

    fn fire_pending(&self) {
        self.handle.set(None);
        let run = self.pending.borrow_mut().take();
        if let Some(run) = run {
            run();
        }
    }
}

impl Debounce {
    pub fn new(delay_ms: i32) -> Rc<Self> {
        Rc::new(Debounce {
            state: Rc::new(DebounceState {
                handle: Cell::new(None),
                pending: RefCell::new(None),
            }),
            delay_ms,
            fire: RefCell::new(None),
        })
    }

    pub fn schedule(&self, run: impl FnOnce() + 'static) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Some(pending) = self.state.handle.take() {
            window.clear_timeout_with_handle(pending);
        }
        self.state.replace_pending(Box::new(run));

        if self.fire.borrow().is_none() {
            let state = self.state.clone();
            *self.fire.borrow_mut() = Some(Closure::wrap(
                Box::new(move || state.fire_pending()) as Box<dyn FnMut()>,
            ));
        }
        let fire = self.fire.borrow();
        let Some(fire) = fire.as_ref() else {
            return;
        };
        match window.set_timeout_with_callback_and_timeout_and_arguments_0(
            fire.as_ref().unchecked_ref(),
            self.delay_ms,
        ) {
            Ok(id) => self.state.handle.set(Some(id)),
            Err(e) => warn!("debounce timeout failed: {e:?}"),
        }
    }

    pub fn cancel(&self) {
        self.state.pending.borrow_mut().take();
        if let Some(pending) = self.state.handle.take() {
            if let Some(window) = web_sys::window() {
                window.clear_timeout_with_handle(pending);
            }
        }
    }
}

/// Whether a mutated element can affect the injected UI. Filters the firehose
/// of player and feed mutations down to transcript-panel churn.
pub fn relevant_element(tag: &str, id: &str) -> bool {
    tag.to_ascii_lowercase().starts_with("ytd-transcript") || id == ui::ROOT_ID
}

fn record_is_relevant(record: &MutationRecord) -> bool {
    if let Some(target) = record.target().and_then(|n| n.dyn_into::<Element>().ok()) {
        if relevant_element(&target.tag_name(), &target.id()) {
            return true;
        }
    }
    for nodes in [record.added_nodes(), record.removed_nodes()] {
        for i in 0..nodes.length() {
            if let Some(element) = nodes.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                if relevant_element(&element.tag_name(), &element.id()) {
                    return true;
                }
            }
        }
    }
    false
}

/// Owns every listener, the observer and the poll timer. Dropping the bus
/// detaches all of them.
pub struct SignalBus {
    window: web_sys::Window,
    document: web_sys::Document,
    observer: MutationObserver,
    debounce: Rc<Debounce>,
    poll_handle: i32,
    navigate: Closure<dyn FnMut(web_sys::Event)>,
    visibility: Closure<dyn FnMut(web_sys::Event)>,
    focus: Closure<dyn FnMut(web_sys::Event)>,
    click: Closure<dyn FnMut(web_sys::Event)>,
    keydown: Closure<dyn FnMut(web_sys::Event)>,
    // Kept alive for the observer; never called from Rust.
    _observer_callback: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
    _poll_callback: Closure<dyn FnMut()>,
}

impl SignalBus {
    /// Wires every signal source to `handler`. The handler must be cheap; it
    /// runs on every poll tick.
    pub fn install(handler: impl Fn(Signal) + 'static) -> Result<SignalBus, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let handler: Rc<dyn Fn(Signal)> = Rc::new(handler);
        let debounce = Debounce::new(MUTATION_DEBOUNCE_MS);

        let navigate = {
            let handler = handler.clone();
            Closure::wrap(Box::new(move |event: web_sys::Event| {
                handler(Signal::Navigated(NavigateDetail::from_event(&event)))
            }) as Box<dyn FnMut(web_sys::Event)>)
        };
        window
            .add_event_listener_with_callback(NAVIGATE_EVENT, navigate.as_ref().unchecked_ref())?;

        let visibility = {
            let handler = handler.clone();
            let document = document.clone();
            Closure::wrap(Box::new(move |_: web_sys::Event| {
                if !document.hidden() {
                    handler(Signal::VisibilityRegained);
                }
            }) as Box<dyn FnMut(web_sys::Event)>)
        };
        document.add_event_listener_with_callback(
            "visibilitychange",
            visibility.as_ref().unchecked_ref(),
        )?;

        let focus = {
            let handler = handler.clone();
            Closure::wrap(Box::new(move |_: web_sys::Event| {
                handler(Signal::VisibilityRegained)
            }) as Box<dyn FnMut(web_sys::Event)>)
        };
        window.add_event_listener_with_callback("focus", focus.as_ref().unchecked_ref())?;

        // Capture phase: the host panel's own controls (close button, menu)
        // can replace the subtree without any navigation event.
        let click = {
            let handler = handler.clone();
            let debounce = debounce.clone();
            Closure::wrap(Box::new(move |_: web_sys::Event| {
                let handler = handler.clone();
                debounce.schedule(move || handler(Signal::HostInteraction));
            }) as Box<dyn FnMut(web_sys::Event)>)
        };
        document.add_event_listener_with_callback_and_bool(
            "click",
            click.as_ref().unchecked_ref(),
            true,
        )?;

        let keydown = {
            let handler = handler.clone();
            let debounce = debounce.clone();
            Closure::wrap(Box::new(move |_: web_sys::Event| {
                let handler = handler.clone();
                debounce.schedule(move || handler(Signal::HostInteraction));
            }) as Box<dyn FnMut(web_sys::Event)>)
        };
        document.add_event_listener_with_callback_and_bool(
            "keydown",
            keydown.as_ref().unchecked_ref(),
            true,
        )?;

        let observer_callback = {
            let handler = handler.clone();
            let debounce = debounce.clone();
            Closure::wrap(Box::new(move |records: js_sys::Array, _: MutationObserver| {
                let relevant = records.iter().any(|record| {
                    record
                        .dyn_into::<MutationRecord>()
                        .is_ok_and(|r| record_is_relevant(&r))
                });
                if relevant {
                    let handler = handler.clone();
                    debounce.schedule(move || handler(Signal::Mutation));
                }
            })
                as Box<dyn FnMut(js_sys::Array, MutationObserver)>)
        };
        let observer = MutationObserver::new(observer_callback.as_ref().unchecked_ref())?;
        if let Some(body) = document.body() {
            let init = MutationObserverInit::new();
            init.set_child_list(true);
            init.set_subtree(true);
            observer.observe_with_options(&body, &init)?;
        }

        let poll_callback = {
            let handler = handler.clone();
            Closure::wrap(Box::new(move || handler(Signal::Poll)) as Box<dyn FnMut()>)
        };
        let poll_handle = window.set_interval_with_callback_and_timeout_and_arguments_0(
            poll_callback.as_ref().unchecked_ref(),
            POLL_INTERVAL_MS,
        )?;

        Ok(SignalBus {
            window,
            document,
            observer,
            debounce,
            poll_handle,
            navigate,
            visibility,
            focus,
            click,
            keydown,
            _observer_callback: observer_callback,
            _poll_callback: poll_callback,
        })
    }
}

impl Drop for SignalBus {
    fn drop(&mut self) {
        let _ = self.window.remove_event_listener_with_callback(
            NAVIGATE_EVENT,
            self.navigate.as_ref().unchecked_ref(),
        );
        let _ = self.document.remove_event_listener_with_callback(
            "visibilitychange",
            self.visibility.as_ref().unchecked_ref(),
        );
        let _ = self
            .window
            .remove_event_listener_with_callback("focus", self.focus.as_ref().unchecked_ref());
        let _ = self.document.remove_event_listener_with_callback_and_bool(
            "click",
            self.click.as_ref().unchecked_ref(),
            true,
        );
        let _ = self.document.remove_event_listener_with_callback_and_bool(
            "keydown",
            self.keydown.as_ref().unchecked_ref(),
            true,
        );
        self.observer.disconnect();
        self.debounce.cancel();
        self.window.clear_interval_with_handle(self.poll_handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relevant_element_matches_transcript_subtree() {
        assert!(relevant_element("ytd-transcript-renderer", ""));
        assert!(relevant_element("YTD-TRANSCRIPT-SEGMENT-LIST-RENDERER", ""));
        assert!(relevant_element("ytd-transcript-search-panel-renderer", ""));
    }

    #[test]
    fn test_relevant_element_matches_own_root() {
        assert!(relevant_element("div", ui::ROOT_ID));
    }

    #[test]
    fn test_irrelevant_elements_filtered() {
        assert!(!relevant_element("ytd-watch-flexy", ""));
        assert!(!relevant_element("ytd-comment-thread-renderer", ""));
        assert!(!relevant_element("div", "some-other-id"));
        assert!(!relevant_element("video", ""));
    }

    #[test]
    fn test_debounce_keeps_only_latest_pending_action() {
        let state = DebounceState {
            handle: Cell::new(None),
            pending: RefCell::new(None),
        };
        let first = Rc::new(Cell::new(0u32));
        let second = Rc::new(Cell::new(0u32));

        // A burst of schedules: each one supplants the previous action
        // rather than accumulating callbacks.
        let counter = first.clone();
        state.replace_pending(Box::new(move || counter.set(counter.get() + 1)));
        let counter = second.clone();
        state.replace_pending(Box::new(move || counter.set(counter.get() + 1)));

        state.fire_pending();

        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn test_debounce_fires_pending_action_at_most_once() {
        let state = DebounceState {
            handle: Cell::new(None),
            pending: RefCell::new(None),
        };
        let count = Rc::new(Cell::new(0u32));
        let counter = count.clone();
        state.replace_pending(Box::new(move || counter.set(counter.get() + 1)));

        state.fire_pending();
        state.fire_pending();

        assert_eq!(count.get(), 1);
        assert!(state.pending.borrow().is_none());
    }

    #[test]
    fn test_watch_page_type() {
        assert!(is_watch_page_type("watch"));
        assert!(!is_watch_page_type("shorts"));
        assert!(!is_watch_page_type("browse"));
        assert!(!is_watch_page_type(""));
    }

    #[test]
    fn test_navigate_detail_tolerates_missing_fields() {
        let detail: NavigateDetail = serde_json::from_str("{}").unwrap();
        assert!(detail.page_type.is_none());
        assert!(detail.url.is_none());

        let detail: NavigateDetail =
            serde_json::from_str(r#"{"pageType": "watch", "url": "/watch?v=abc"}"#).unwrap();
        assert_eq!(detail.page_type.as_deref(), Some("watch"));
        assert_eq!(detail.url.as_deref(), Some("/watch?v=abc"));
    }
}

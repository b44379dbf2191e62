/// Constructs the injected UI subtree and owns its live handles
///
/// Construction is idempotent at the supervisor level: any stale root found
/// by id is removed first, then a fresh subtree is inserted as the first
/// child of the host panel's content container. All later reads go through
/// element ids so a rebuilt subtree keeps working.
use std::cell::RefCell;
use std::rc::Rc;

use log::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element};

use crate::host::HostPage;
use crate::ui;
use crate::ui::tabs::Tab;

/// User intent coming out of the injected controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    TabSelected(Tab),
    CopyRequested,
    RefreshRequested,
}

/// Live handles to the injected subtree. Dropping this removes the subtree
/// and detaches every listener.
pub struct UiHandles {
    root: Element,
    summary_ticker: RefCell<Option<LoadingTicker>>,
    comments_ticker: RefCell<Option<LoadingTicker>>,
    _closures: Vec<Closure<dyn FnMut(web_sys::Event)>>,
}

impl Drop for UiHandles {
    fn drop(&mut self) {
        self.root.remove();
    }
}

/// Builds the three-tab UI inside the panel's content container and wires
/// `on_event` to every control.
pub fn build(host: &HostPage, on_event: Rc<dyn Fn(UiEvent)>) -> Result<UiHandles, JsValue> {
    let document = host
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let panel = host
        .panel()
        .ok_or_else(|| JsValue::from_str("transcript panel missing"))?;
    let container = host
        .content_container(&panel)
        .ok_or_else(|| JsValue::from_str("content container missing"))?;

    // A stale root from a previous page state would double up controls.
    if let Some(stale) = document.get_element_by_id(ui::ROOT_ID) {
        stale.remove();
    }

    inject_styles(&document)?;

    let root = document.create_element("div")?;
    root.set_id(ui::ROOT_ID);
    root.set_class_name("td-root");

    let tab_row = document.create_element("div")?;
    tab_row.set_class_name("td-tabs");

    let tab_group = document.create_element("div")?;
    tab_group.set_class_name("td-tab-group");
    let native = make_button(&document, ui::TAB_NATIVE_ID, "Transcript")?;
    native.class_list().add_2("td-tab-button", ui::ACTIVE_CLASS)?;
    let summary = make_button(&document, ui::TAB_SUMMARY_ID, "AI Summary")?;
    summary.class_list().add_1("td-tab-button")?;
    let comments = make_button(&document, ui::TAB_COMMENTS_ID, "Comments")?;
    comments.class_list().add_1("td-tab-button")?;
    tab_group.append_child(&native)?;
    tab_group.append_child(&summary)?;
    tab_group.append_child(&comments)?;

    let action_group = document.create_element("div")?;
    action_group.set_class_name("td-action-group");
    let copy = make_button(&document, ui::COPY_BUTTON_ID, "Copy")?;
    copy.class_list().add_1("td-action-button")?;
    // Nothing to copy until a view has rendered text.
    if let Some(button) = copy.dyn_ref::<web_sys::HtmlButtonElement>() {
        button.set_disabled(true);
    }
    let refresh = make_button(&document, ui::REFRESH_BUTTON_ID, "Refresh")?;
    refresh.class_list().add_1("td-action-button")?;
    action_group.append_child(&copy)?;
    action_group.append_child(&refresh)?;

    tab_row.append_child(&tab_group)?;
    tab_row.append_child(&action_group)?;
    root.append_child(&tab_row)?;

    root.append_child(&build_region(
        &document,
        ui::SUMMARY_REGION_ID,
        ui::SUMMARY_LOADING_ID,
        ui::SUMMARY_ERROR_ID,
        ui::SUMMARY_TEXT_ID,
        None,
    )?.into())?;
    root.append_child(&build_region(
        &document,
        ui::COMMENTS_REGION_ID,
        ui::COMMENTS_LOADING_ID,
        ui::COMMENTS_ERROR_ID,
        ui::COMMENTS_TEXT_ID,
        Some(ui::COMMENTS_PROGRESS_ID),
    )?.into())?;

    // First child keeps our controls above the host's transcript list.
    container.insert_before(&root, container.first_child().as_ref())?;

    let mut closures = Vec::new();
    for (element, event) in [
        (&native, UiEvent::TabSelected(Tab::Native)),
        (&summary, UiEvent::TabSelected(Tab::Summary)),
        (&comments, UiEvent::TabSelected(Tab::Comments)),
        (&copy, UiEvent::CopyRequested),
        (&refresh, UiEvent::RefreshRequested),
    ] {
        let on_event = on_event.clone();
        let closure = Closure::wrap(Box::new(move |_: web_sys::Event| on_event(event))
            as Box<dyn FnMut(web_sys::Event)>);
        element.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closures.push(closure);
    }

    Ok(UiHandles {
        root,
        summary_ticker: RefCell::new(None),
        comments_ticker: RefCell::new(None),
        _closures: closures,
    })
}

fn make_button(document: &Document, id: &str, label: &str) -> Result<Element, JsValue> {
    let button = document.create_element("button")?;
    button.set_id(id);
    button.set_text_content(Some(label));
    Ok(button)
}

fn build_region(
    document: &Document,
    region_id: &str,
    loading_id: &str,
    error_id: &str,
    text_id: &str,
    progress_id: Option<&str>,
) -> Result<Element, JsValue> {
    let region = document.create_element("div")?;
    region.set_id(region_id);
    region.set_class_name("td-region");
    // Regions start hidden; the tab controller reveals the active one.
    style_of(&region, "display", "none");

    let loading = document.create_element("div")?;
    loading.set_id(loading_id);
    loading.set_class_name("td-loading");
    style_of(&loading, "display", "none");
    region.append_child(&loading)?;

    if let Some(progress_id) = progress_id {
        let progress = document.create_element("div")?;
        progress.set_id(progress_id);
        progress.set_class_name("td-progress");
        style_of(&progress, "display", "none");
        region.append_child(&progress)?;
    }

    let error = document.create_element("div")?;
    error.set_id(error_id);
    error.set_class_name("td-error");
    style_of(&error, "display", "none");
    region.append_child(&error)?;

    let text = document.create_element("div")?;
    text.set_id(text_id);
    text.set_class_name("td-text");
    region.append_child(&text)?;

    Ok(region)
}

fn style_of(element: &Element, property: &str, value: &str) {
    if let Some(html) = element.dyn_ref::<web_sys::HtmlElement>() {
        let _ = html.style().set_property(property, value);
    }
}

impl UiHandles {
    pub fn root(&self) -> &Element {
        &self.root
    }

    // -- summary view --

    pub fn show_summary_loading(&self) {
        set_display(ui::SUMMARY_ERROR_ID, "none");
        set_display(ui::SUMMARY_LOADING_ID, "block");
        *self.summary_ticker.borrow_mut() =
            LoadingTicker::start(ui::SUMMARY_LOADING_ID, "Generating AI summary…");
    }

    pub fn show_summary_error(&self, message: &str) {
        self.summary_ticker.borrow_mut().take();
        set_display(ui::SUMMARY_LOADING_ID, "none");
        set_text(ui::SUMMARY_ERROR_ID, message);
        set_display(ui::SUMMARY_ERROR_ID, "block");
    }

    pub fn render_summary(&self, html: &str) {
        self.summary_ticker.borrow_mut().take();
        set_display(ui::SUMMARY_LOADING_ID, "none");
        set_display(ui::SUMMARY_ERROR_ID, "none");
        set_inner_html(ui::SUMMARY_TEXT_ID, html);
    }

    // -- comments view --

    pub fn show_comments_loading(&self) {
        set_display(ui::COMMENTS_ERROR_ID, "none");
        set_display(ui::COMMENTS_LOADING_ID, "block");
        *self.comments_ticker.borrow_mut() =
            LoadingTicker::start(ui::COMMENTS_LOADING_ID, "Summarizing comments…");
    }

    pub fn show_comments_progress(&self, current: u32, total: u32) {
        set_text(
            ui::COMMENTS_PROGRESS_ID,
            &format!("Collecting comments… ({current}/{total})"),
        );
        set_display(ui::COMMENTS_PROGRESS_ID, "block");
    }

    pub fn hide_comments_progress(&self) {
        set_display(ui::COMMENTS_PROGRESS_ID, "none");
    }

    pub fn show_comments_error(&self, message: &str) {
        self.comments_ticker.borrow_mut().take();
        set_display(ui::COMMENTS_LOADING_ID, "none");
        self.hide_comments_progress();
        set_text(ui::COMMENTS_ERROR_ID, message);
        set_display(ui::COMMENTS_ERROR_ID, "block");
    }

    pub fn render_comments_summary(&self, html: &str) {
        self.comments_ticker.borrow_mut().take();
        set_display(ui::COMMENTS_LOADING_ID, "none");
        set_display(ui::COMMENTS_ERROR_ID, "none");
        self.hide_comments_progress();
        set_inner_html(ui::COMMENTS_TEXT_ID, html);
    }

    // -- copy feedback --

    pub fn set_copy_label(&self, label: &str) {
        set_text(ui::COPY_BUTTON_ID, label);
    }
}

fn by_id(id: &str) -> Option<Element> {
    web_sys::window()?.document()?.get_element_by_id(id)
}

fn set_display(id: &str, value: &str) {
    if let Some(element) = by_id(id) {
        style_of(&element, "display", value);
    }
}

fn set_text(id: &str, text: &str) {
    if let Some(element) = by_id(id) {
        element.set_text_content(Some(text));
    }
}

fn set_inner_html(id: &str, html: &str) {
    if let Some(element) = by_id(id) {
        element.set_inner_html(html);
    }
}

/// One-second ticker that appends elapsed time to a loading message, so a
/// slow provider call visibly keeps making progress.
struct LoadingTicker {
    handle: i32,
    _callback: Closure<dyn FnMut()>,
}

impl LoadingTicker {
    fn start(target_id: &'static str, message: &'static str) -> Option<LoadingTicker> {
        let window = web_sys::window()?;
        set_text(target_id, &format!("{message} (0s)"));
        let started = js_sys::Date::now();
        let callback = Closure::wrap(Box::new(move || {
            let elapsed = ((js_sys::Date::now() - started) / 1000.0) as u64;
            set_text(target_id, &format!("{message} ({elapsed}s)"));
        }) as Box<dyn FnMut()>);
        match window.set_interval_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            1000,
        ) {
            Ok(handle) => Some(LoadingTicker {
                handle,
                _callback: callback,
            }),
            Err(e) => {
                warn!("loading ticker failed to start: {e:?}");
                None
            }
        }
    }
}

impl Drop for LoadingTicker {
    fn drop(&mut self) {
        if let Some(window) = web_sys::window() {
            window.clear_interval_with_handle(self.handle);
        }
    }
}

fn inject_styles(document: &Document) -> Result<(), JsValue> {
    if document.get_element_by_id(ui::STYLE_ID).is_some() {
        return Ok(());
    }
    let style = document.create_element("style")?;
    style.set_id(ui::STYLE_ID);
    style.set_text_content(Some(STYLESHEET));
    if let Some(head) = document.head() {
        head.append_child(&style)?;
    }
    Ok(())
}

const STYLESHEET: &str = "
.td-root {
    padding: 8px 16px;
    border-bottom: 1px solid var(--yt-spec-10-percent-layer, rgba(0,0,0,0.1));
}
.td-tabs {
    display: flex;
    justify-content: space-between;
    align-items: center;
    margin-bottom: 8px;
}
.td-tab-group, .td-action-group {
    display: flex;
    gap: 8px;
}
.td-tab-button, .td-action-button {
    padding: 6px 12px;
    border: none;
    border-radius: 18px;
    background: var(--yt-spec-badge-chip-background, rgba(0,0,0,0.05));
    color: var(--yt-spec-text-primary, #0f0f0f);
    font-size: 1.2rem;
    cursor: pointer;
}
.td-tab-button.active {
    background: var(--yt-spec-text-primary, #0f0f0f);
    color: var(--yt-spec-base-background, #fff);
}
.td-region {
    padding: 8px 0;
    color: var(--yt-spec-text-primary, #0f0f0f);
    font-size: 1.4rem;
    line-height: 2rem;
}
.td-loading, .td-progress {
    color: var(--yt-spec-text-secondary, #606060);
    padding: 8px 0;
}
.td-error {
    color: var(--yt-spec-brand-link-text, #c00);
    padding: 8px 0;
}
.td-text .md-h1 { font-size: 1.5em; font-weight: bold; margin: 16px 0 8px; }
.td-text .md-h2 { font-size: 1.3em; font-weight: bold; margin: 14px 0 6px; }
.td-text .md-h3 { font-size: 1.1em; font-weight: bold; margin: 12px 0 4px; }
.td-text .md-paragraph { margin: 8px 0; }
.td-text .md-bold { font-weight: bold; }
.td-text .md-italic { font-style: italic; }
.td-text .md-list, .td-text .md-ordered-list { margin: 8px 0; padding-left: 24px; }
.td-text .md-list-item, .td-text .md-ordered-item { margin: 4px 0; }
.td-text .md-link { color: var(--yt-spec-call-to-action, #065fd4); }
.td-text .md-code-block {
    background: var(--yt-spec-badge-chip-background, rgba(0,0,0,0.05));
    border-radius: 4px;
    padding: 8px;
    overflow-x: auto;
    font-family: monospace;
}
.td-text .md-inline-code {
    background: var(--yt-spec-badge-chip-background, rgba(0,0,0,0.05));
    border-radius: 2px;
    padding: 1px 4px;
    font-family: monospace;
}
";

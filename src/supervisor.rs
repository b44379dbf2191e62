/// Recovery supervisor: keeps the injected UI alive against a hostile host
///
/// Every signal collapses into the same cycle: snapshot the document, plan,
/// apply. The supervisor never trusts cached element references; presence is
/// re-derived from the live tree each time, so it recovers identically from
/// a panel that never mounted, a subtree the host replaced, or a full SPA
/// navigation.
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{debug, info, warn};
use wasm_bindgen_futures::spawn_local;

use crate::host::HostPage;
use crate::pipeline::PipelineCtx;
use crate::presence::{self, Action, Snapshot};
use crate::session::SessionState;
use crate::signals::{self, NavigateDetail, Signal};
use crate::ui;
use crate::ui::builder::{self, UiEvent, UiHandles};
use crate::ui::tabs::{self, Tab};

/// Wait cycles on the poll cadence before logging that the panel's inner
/// structure never appeared (~12s). Purely diagnostic; waiting continues.
pub const STRUCTURAL_ABSENCE_CYCLES: u32 = 24;

/// The panel can mount well after yt-navigate-finish fires.
const POST_NAVIGATION_RECHECK_MS: i32 = 1000;

pub fn should_report_absence(wait_cycles: u32) -> bool {
    wait_cycles == STRUCTURAL_ABSENCE_CYCLES
}

#[derive(Clone)]
pub struct Supervisor {
    inner: Rc<Inner>,
}

struct Inner {
    host: HostPage,
    session: Rc<RefCell<SessionState>>,
    ui: Rc<RefCell<Option<UiHandles>>>,
    wait_cycles: Cell<u32>,
}

impl Supervisor {
    pub fn new() -> Supervisor {
        Supervisor {
            inner: Rc::new(Inner {
                host: HostPage::new(),
                session: Rc::new(RefCell::new(SessionState::new())),
                ui: Rc::new(RefCell::new(None)),
                wait_cycles: Cell::new(0),
            }),
        }
    }

    fn pipeline(&self) -> PipelineCtx {
        PipelineCtx {
            host: self.inner.host,
            session: self.inner.session.clone(),
            ui: self.inner.ui.clone(),
        }
    }

    /// Single entry point for every change signal.
    pub fn handle(&self, signal: Signal) {
        match signal {
            Signal::Navigated(detail) => self.handle_navigation(detail),
            Signal::Mutation
            | Signal::VisibilityRegained
            | Signal::Poll
            | Signal::HostInteraction => self.recheck(),
        }
    }

    fn handle_navigation(&self, detail: Option<NavigateDetail>) {
        // Prefer the event's own page type and URL; they describe the page
        // being navigated to even if the location lags.
        let watch_page = match detail.as_ref().and_then(|d| d.page_type.as_deref()) {
            Some(page_type) => signals::is_watch_page_type(page_type),
            None => self.inner.host.on_watch_page(),
        };
        let video_id = if watch_page {
            detail
                .and_then(|d| d.url)
                .and_then(|url| crate::host::video_id_from_url(&url))
                .or_else(|| self.inner.host.current_video_id())
        } else {
            None
        };

        let changed = self.inner.session.borrow_mut().begin_video(video_id.clone());
        if changed {
            info!("navigation to {:?}", video_id);
            // The old UI shows the old video's content; drop it immediately
            // rather than waiting for a recheck to notice.
            self.teardown();
        }
        self.recheck();

        // Recheck again once the new page has had time to mount its panel.
        let supervisor = self.clone();
        spawn_local(async move {
            crate::signals::sleep(POST_NAVIGATION_RECHECK_MS).await;
            supervisor.recheck();
        });
    }

    /// Snapshot, plan, apply.
    pub fn recheck(&self) {
        let snapshot = self.snapshot();
        match presence::plan(&snapshot) {
            Action::Steady => {
                self.inner.wait_cycles.set(0);
            }
            Action::Wait => {
                let cycles = self.inner.wait_cycles.get() + 1;
                self.inner.wait_cycles.set(cycles);
                if should_report_absence(cycles) {
                    warn!("transcript panel present but its content container never appeared");
                }
            }
            Action::Build => {
                self.inner.wait_cycles.set(0);
                self.build();
            }
            Action::Teardown => {
                self.inner.wait_cycles.set(0);
                self.teardown();
            }
            Action::Rebuild => {
                self.inner.wait_cycles.set(0);
                debug!("injected UI corrupted, rebuilding");
                self.teardown();
                self.build();
            }
        }
    }

    fn snapshot(&self) -> Snapshot {
        let host = &self.inner.host;
        let document = host.document();
        let panel = host.panel();
        let container = panel.as_ref().and_then(|p| host.content_container(p));
        let root = document
            .as_ref()
            .and_then(|d| d.get_element_by_id(ui::ROOT_ID));

        let ui_attached = match (&container, &root) {
            (Some(container), Some(root)) => container.contains(Some(root.as_ref())),
            _ => false,
        };
        let controls_resolved = match &document {
            Some(document) => ui::REQUIRED_IDS
                .iter()
                .all(|id| document.get_element_by_id(id).is_some()),
            None => false,
        };

        Snapshot {
            watch_page: host.on_watch_page(),
            panel_present: panel.is_some(),
            container_present: container.is_some(),
            ui_present: root.is_some(),
            ui_attached,
            controls_resolved,
        }
    }

    fn build(&self) {
        // Navigation can be missed (e.g. extension loaded mid-page); make
        // sure the session tracks the video actually on screen.
        let current = self.inner.host.current_video_id();
        if self.inner.session.borrow().active_video_id != current {
            self.inner.session.borrow_mut().begin_video(current);
        }

        let supervisor = self.clone();
        let handler: Rc<dyn Fn(UiEvent)> = Rc::new(move |event| supervisor.on_ui_event(event));
        match builder::build(&self.inner.host, handler) {
            Ok(handles) => {
                let (active_tab, copy_ready) = {
                    let session = self.inner.session.borrow();
                    (session.active_tab, session.copy_text().is_some())
                };
                self.restore_views(&handles);
                *self.inner.ui.borrow_mut() = Some(handles);
                tabs::apply(&self.inner.host, active_tab, copy_ready);
                info!("injected UI built");
            }
            Err(e) => warn!("UI build failed: {e:?}"),
        }
    }

    /// A rebuilt subtree starts blank; repaint it from session state so a
    /// host-side DOM replacement is invisible to the user.
    fn restore_views(&self, handles: &UiHandles) {
        let session = self.inner.session.borrow();
        if let Some(text) = session.summary_text.as_deref() {
            handles.render_summary(&crate::render::markdown_to_html(text));
        }
        if let Some(text) = session.comments_summary_text.as_deref() {
            handles.render_comments_summary(&crate::render::markdown_to_html(text));
        }
    }

    fn teardown(&self) {
        if self.inner.ui.borrow_mut().take().is_some() {
            debug!("injected UI removed");
        }
        // Native visibility is host-owned state we may have altered.
        tabs::apply(&self.inner.host, Tab::Native, false);
    }

    fn on_ui_event(&self, event: UiEvent) {
        match event {
            UiEvent::TabSelected(tab) => self.select_tab(tab),
            UiEvent::CopyRequested => {
                let pipeline = self.pipeline();
                spawn_local(async move { pipeline.copy_active().await });
            }
            UiEvent::RefreshRequested => self.refresh_active(),
        }
    }

    fn select_tab(&self, tab: Tab) {
        {
            let mut session = self.inner.session.borrow_mut();
            if session.active_tab == tab {
                return;
            }
            session.active_tab = tab;
        }
        let copy_ready = self.inner.session.borrow().copy_text().is_some();
        tabs::apply(&self.inner.host, tab, copy_ready);

        let pipeline = self.pipeline();
        match tab {
            Tab::Native => {}
            Tab::Summary => spawn_local(async move { pipeline.load_summary(false).await }),
            Tab::Comments => spawn_local(async move { pipeline.load_comments(false).await }),
        }
    }

    fn refresh_active(&self) {
        let tab = self.inner.session.borrow().active_tab;
        let pipeline = self.pipeline();
        match tab {
            Tab::Native => {}
            Tab::Summary => spawn_local(async move { pipeline.load_summary(true).await }),
            Tab::Comments => spawn_local(async move { pipeline.load_comments(true).await }),
        }
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absence_reported_exactly_once() {
        let reported: Vec<u32> = (1..=STRUCTURAL_ABSENCE_CYCLES * 3)
            .filter(|c| should_report_absence(*c))
            .collect();
        assert_eq!(reported, vec![STRUCTURAL_ABSENCE_CYCLES]);
    }

    #[test]
    fn test_absence_threshold_spans_several_seconds() {
        // Poll cadence is 500ms; the report must not fire on transient churn.
        let millis = STRUCTURAL_ABSENCE_CYCLES as i64 * crate::signals::POLL_INTERVAL_MS as i64;
        assert!(millis >= 10_000);
    }
}

/// Presence decision table for the recovery supervisor
///
/// The supervisor derives a fresh snapshot of the host tree on every recheck
/// and feeds it through `plan`. Keeping the decision pure makes every
/// recovery case a table entry that can be tested without a DOM.

/// What a single recheck observed in the host document.
#[derive(Debug, Clone, Copy, Default)]
pub struct Snapshot {
    /// Current URL is a video watch page.
    pub watch_page: bool,
    /// The host transcript panel element exists.
    pub panel_present: bool,
    /// The panel's inner content container exists.
    pub container_present: bool,
    /// Our UI root resolves by id anywhere in the document.
    pub ui_present: bool,
    /// The UI root is a descendant of the current content container.
    pub ui_attached: bool,
    /// All tab buttons, regions and action buttons resolve by id.
    pub controls_resolved: bool,
}

/// Derived presence classification (never stored).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiPresence {
    Absent,
    PresentCorrect,
    PresentDetached,
}

impl Snapshot {
    pub fn ui_presence(&self) -> UiPresence {
        if !self.ui_present {
            UiPresence::Absent
        } else if self.ui_attached && self.controls_resolved {
            UiPresence::PresentCorrect
        } else {
            UiPresence::PresentDetached
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Common steady state; nothing to do.
    Steady,
    /// Panel exists but its inner structure is not ready yet. Retry on the
    /// next signal; never surfaced as an error.
    Wait,
    Build,
    Teardown,
    /// UI exists but is orphaned or incomplete: remove it, then build fresh.
    Rebuild,
}

pub fn plan(snapshot: &Snapshot) -> Action {
    // Non-watch pages and panel disappearance both mean the UI must not
    // exist. Absence of the panel is expected, not an error.
    if !snapshot.watch_page || !snapshot.panel_present {
        return if snapshot.ui_present {
            Action::Teardown
        } else {
            Action::Steady
        };
    }

    match snapshot.ui_presence() {
        UiPresence::Absent => {
            if snapshot.container_present {
                Action::Build
            } else {
                Action::Wait
            }
        }
        // Orphaned or incomplete subtree is corruption, healed silently.
        UiPresence::PresentDetached => Action::Rebuild,
        UiPresence::PresentCorrect => {
            if snapshot.container_present {
                Action::Steady
            } else {
                Action::Rebuild
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watch_snapshot() -> Snapshot {
        Snapshot {
            watch_page: true,
            panel_present: true,
            container_present: true,
            ui_present: true,
            ui_attached: true,
            controls_resolved: true,
        }
    }

    #[test]
    fn test_steady_state_is_noop() {
        assert_eq!(plan(&watch_snapshot()), Action::Steady);
    }

    #[test]
    fn test_panel_without_ui_builds() {
        let snapshot = Snapshot {
            ui_present: false,
            ui_attached: false,
            controls_resolved: false,
            ..watch_snapshot()
        };
        assert_eq!(plan(&snapshot), Action::Build);
    }

    #[test]
    fn test_panel_without_inner_structure_waits() {
        let snapshot = Snapshot {
            container_present: false,
            ui_present: false,
            ui_attached: false,
            controls_resolved: false,
            ..watch_snapshot()
        };
        assert_eq!(plan(&snapshot), Action::Wait);
    }

    #[test]
    fn test_panel_gone_with_ui_tears_down() {
        let snapshot = Snapshot {
            panel_present: false,
            container_present: false,
            ui_attached: false,
            ..watch_snapshot()
        };
        assert_eq!(plan(&snapshot), Action::Teardown);
    }

    #[test]
    fn test_non_watch_page_tears_down() {
        let snapshot = Snapshot {
            watch_page: false,
            ..watch_snapshot()
        };
        assert_eq!(plan(&snapshot), Action::Teardown);
    }

    #[test]
    fn test_non_watch_page_without_ui_is_steady() {
        let snapshot = Snapshot::default();
        assert_eq!(plan(&snapshot), Action::Steady);
    }

    #[test]
    fn test_detached_ui_rebuilds() {
        let snapshot = Snapshot {
            ui_attached: false,
            ..watch_snapshot()
        };
        assert_eq!(plan(&snapshot), Action::Rebuild);
    }

    #[test]
    fn test_missing_controls_rebuild() {
        let snapshot = Snapshot {
            controls_resolved: false,
            ..watch_snapshot()
        };
        assert_eq!(plan(&snapshot), Action::Rebuild);
    }

    #[test]
    fn test_ui_present_but_container_replaced_rebuilds() {
        // Host replaced the inner container; our root now hangs off a
        // detached node.
        let snapshot = Snapshot {
            container_present: false,
            ui_attached: false,
            ..watch_snapshot()
        };
        assert_eq!(plan(&snapshot), Action::Rebuild);
    }

    #[test]
    fn test_ui_presence_classification() {
        assert_eq!(watch_snapshot().ui_presence(), UiPresence::PresentCorrect);
        assert_eq!(
            Snapshot {
                ui_present: false,
                ..watch_snapshot()
            }
            .ui_presence(),
            UiPresence::Absent
        );
        assert_eq!(
            Snapshot {
                ui_attached: false,
                ..watch_snapshot()
            }
            .ui_presence(),
            UiPresence::PresentDetached
        );
    }
}

//! WorkspaceManager: Summaries/Query tab switching and shared UI toggles.
//!
//! Tracks:
//! - Which workspace is active
//! - Whether the scrape form takes part in the Query layout
//! - Log panel, help overlay and keys bar visibility
//! - The FocusRing for the active workspace

use crate::action::{ComponentId, Workspace};
use crate::focus::FocusRing;

pub struct WorkspaceManager {
    pub workspace: Workspace,
    pub scrape_enabled: bool,

    // ── Shared UI ─────────────────────────────────────────────────────────────
    pub show_log_panel: bool,
    pub show_help: bool,
    pub show_keys_bar: bool,

    pub focus: FocusRing,
}

impl WorkspaceManager {
    pub fn new(scrape_enabled: bool) -> Self {
        let mut wm = Self {
            workspace: Workspace::Summaries,
            scrape_enabled,
            show_log_panel: false,
            show_help: false,
            show_keys_bar: true,
            focus: FocusRing::default(),
        };
        wm.rebuild_focus_ring();
        wm
    }

    pub fn rebuild_focus_ring(&mut self) {
        let mut items = match self.workspace {
            Workspace::Summaries => vec![ComponentId::SummaryList],
            Workspace::Query if self.scrape_enabled => {
                vec![ComponentId::QueryPanel, ComponentId::ScrapeForm]
            }
            Workspace::Query => vec![ComponentId::QueryPanel],
        };
        if self.show_log_panel {
            items.push(ComponentId::LogPanel);
        }
        self.focus.set_items(items);
    }

    pub fn toggle_workspace(&mut self) {
        self.set_workspace(match self.workspace {
            Workspace::Summaries => Workspace::Query,
            Workspace::Query => Workspace::Summaries,
        });
    }

    pub fn set_workspace(&mut self, ws: Workspace) {
        if self.workspace != ws {
            self.workspace = ws;
            self.rebuild_focus_ring();
        }
    }

    pub fn toggle_log_panel(&mut self) {
        self.show_log_panel = !self.show_log_panel;
        self.rebuild_focus_ring();
    }

    pub fn focused(&self) -> Option<ComponentId> {
        self.focus.current()
    }

    pub fn focus_next(&mut self) -> Option<ComponentId> {
        self.focus.next()
    }

    pub fn focus_prev(&mut self) -> Option<ComponentId> {
        self.focus.prev()
    }

    pub fn focus_set(&mut self, id: ComponentId) {
        self.focus.set(id);
    }
}

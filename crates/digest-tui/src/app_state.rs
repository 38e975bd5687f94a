//! AppState: shared read-only data passed to all components during render/event.
//!
//! The App event-loop is the only thing that writes to AppState.

use digest_proto::query::QueryDesk;
use digest_proto::scrape::ScrapeTrigger;
use digest_proto::session::SessionGate;
use digest_proto::summaries::{SummaryFeed, SummaryView};

use crate::action::Workspace;
use crate::widgets::status_bar::InputMode;

pub struct AppState {
    // ── Flows ───────────────────────────────────────────────────────────────
    pub session: SessionGate,
    pub feed: SummaryFeed,
    pub desk: QueryDesk,
    pub scrape: ScrapeTrigger,

    // ── Settings ────────────────────────────────────────────────────────────
    pub excluded_channels: Vec<String>,
    pub scrape_enabled: bool,

    // ── UI mode ─────────────────────────────────────────────────────────────
    pub workspace: Workspace,
    /// Starts in Editing: the login screen owns the keyboard.
    pub input_mode: InputMode,
    /// Blocking dialog text; while set, nothing else receives keys.
    pub alert: Option<String>,

    /// Tail of the log file (refreshed periodically by App while visible).
    pub tui_log_lines: Vec<String>,
}

impl AppState {
    pub fn new(excluded_channels: Vec<String>, scrape_enabled: bool, default_limit: u32) -> Self {
        Self {
            session: SessionGate::new(),
            feed: SummaryFeed::new(),
            desk: QueryDesk::new(),
            scrape: ScrapeTrigger::new(default_limit),
            excluded_channels,
            scrape_enabled,
            workspace: Workspace::Summaries,
            input_mode: InputMode::Editing,
            alert: None,
            tui_log_lines: Vec::new(),
        }
    }

    pub fn summary_view(&self) -> SummaryView<'_> {
        self.feed.view(&self.excluded_channels)
    }
}

//! Action enum: all user-initiated intents and internal events.

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    Login,
    SummaryList,
    ScrapeForm,
    QueryPanel,
    LogPanel,
    HelpOverlay,
    Alert,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Session ──────────────────────────────────────────────────────────────
    PasswordChanged(String),
    SubmitLogin,

    // ── Summaries ────────────────────────────────────────────────────────────
    RefreshSummaries, // forced, bypasses the backend cache

    // ── Query ────────────────────────────────────────────────────────────────
    QueryChanged(String),
    SubmitQuery,

    // ── Scrape ───────────────────────────────────────────────────────────────
    GuildIdChanged(String),
    LimitChanged(String),
    SubmitScrape,

    // ── Text entry ───────────────────────────────────────────────────────────
    BeginEditing,
    EndEditing,

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),
    SwitchWorkspace(Workspace),

    // ── UI toggles ───────────────────────────────────────────────────────────
    ToggleLogs,
    ToggleHelp,
    ToggleKeys,
    DismissAlert,

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
    Resize(u16, u16),
}

/// Which workspace (tab) is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workspace {
    Summaries,
    Query,
}

impl Workspace {
    pub fn title(self) -> &'static str {
        match self {
            Self::Summaries => "Summaries",
            Self::Query => "Query",
        }
    }
}

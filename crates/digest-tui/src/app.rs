//! App: top-level controller and event loop.
//!
//! Architecture:
//! - `App` owns all components and `AppState` (shared read-only data for components).
//! - A `tokio::mpsc` channel carries `AppMessage` events in from background tasks.
//! - Backend calls run as spawned tasks; each settles back into the loop as a
//!   message carrying the ticket it was issued with.
//! - The event loop draws each frame, then awaits the next message.
//! - Components return `Vec<Action>`; App dispatches each Action.
//! - Keep-warm pings start with the event loop, login screen included. The
//!   summary schedule starts once the session is authenticated. Both are shut
//!   down before the terminal is restored.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use digest_proto::client::ScrapeReceipt;
use digest_proto::config::Config;
use digest_proto::flow::Ticket;
use digest_proto::protocol::{ChannelSummary, QueryResult};
use digest_proto::schedule::{self, FirstTick, PeriodicTask};
use digest_proto::session::LoginOutcome;
use digest_proto::{BackendClient, ClientError};

use crate::{
    action::{Action, ComponentId, Workspace},
    app_state::AppState,
    component::Component,
    components::{
        alert::AlertDialog,
        help_overlay::HelpOverlay,
        log_panel::LogPanel,
        login::LoginScreen,
        query_panel::QueryPanel,
        scrape_form::ScrapeForm,
        summary_list::{SummaryList, REFRESHING},
    },
    widgets::{
        status_bar::{self, InputMode},
        toast::{Severity, ToastManager},
    },
    workspace::WorkspaceManager,
};

// ── Internal event bus ────────────────────────────────────────────────────────

pub(crate) enum AppMessage {
    Event(Event),
    LoginSettled(Ticket, Result<bool, ClientError>),
    /// The summary schedule fired.
    SummariesDue,
    SummariesSettled(Ticket, Result<Vec<ChannelSummary>, ClientError>),
    QuerySettled(Ticket, Result<QueryResult, ClientError>),
    ScrapeSettled(Ticket, Result<ScrapeReceipt, ClientError>),
}

const LOG_TAIL_LINES: usize = 500;

// ── Pane area tracking ────────────────────────────────────────────────────────

/// Last-drawn rects of the scrollable panes, for mouse hit-testing.
#[derive(Default, Clone)]
struct PaneAreas {
    summary_list: Rect,
    query_panel: Rect,
    scrape_form: Rect,
    log_panel: Rect,
}

// ── App ───────────────────────────────────────────────────────────────────────

pub struct App {
    log_path: PathBuf,
    config: Config,
    client: BackendClient,

    // ── Shared state (passed read-only to components) ─────────────────────────
    pub state: AppState,

    // ── Components ────────────────────────────────────────────────────────────
    login: LoginScreen,
    summary_list: SummaryList,
    query_panel: QueryPanel,
    scrape_form: ScrapeForm,
    alert: AlertDialog,
    help_overlay: HelpOverlay,
    log_panel: LogPanel,

    // ── Workspace / layout ────────────────────────────────────────────────────
    wm: WorkspaceManager,
    toast: ToastManager,
    pane_areas: PaneAreas,

    // ── Background work ───────────────────────────────────────────────────────
    tx: mpsc::Sender<AppMessage>,
    rx: Option<mpsc::Receiver<AppMessage>>,
    keep_warm: Option<PeriodicTask>,
    summaries_refresh: Option<PeriodicTask>,

    should_quit: bool,
}

impl App {
    pub fn new(client: BackendClient, config: Config, log_path: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel::<AppMessage>(256);
        let scrape_enabled = config.ui.scrape_enabled;
        let default_limit = config.ui.default_message_limit;

        let mut app = Self {
            log_path,
            state: AppState::new(
                config.summaries.excluded_channels.clone(),
                scrape_enabled,
                default_limit,
            ),
            config,
            client,
            login: LoginScreen::new(),
            summary_list: SummaryList::new(),
            query_panel: QueryPanel::new(),
            scrape_form: ScrapeForm::new(default_limit),
            alert: AlertDialog::new(),
            help_overlay: HelpOverlay::new(),
            log_panel: LogPanel::new(),
            wm: WorkspaceManager::new(scrape_enabled),
            toast: ToastManager::new(),
            pane_areas: PaneAreas::default(),
            tx,
            rx: Some(rx),
            keep_warm: None,
            summaries_refresh: None,
            should_quit: false,
        };
        app.sync_input_mode();
        app
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        let Some(mut rx) = self.rx.take() else {
            anyhow::bail!("event loop already started");
        };

        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());
        info!("[app] backend {}", display_url(self.client.base_url()));
        self.start_keep_warm();

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = self.tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Periodic timers ───────────────────────────────────────────────────
        // Toast expiry check + spinner animation
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // log tail refresh: every 2s, only when log panel is open
        let mut log_refresh = tokio::time::interval(Duration::from_secs(2));
        log_refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        loop {
            terminal.draw(|f| self.draw(f))?;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    self.handle_message(msg);
                    while let Ok(next) = rx.try_recv() {
                        self.handle_message(next);
                    }
                }

                _ = toast_tick.tick() => {
                    if !self.toast.is_empty() {
                        self.toast.tick();
                    }
                }

                _ = log_refresh.tick() => {
                    if self.wm.show_log_panel {
                        self.reload_tui_log();
                    }
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        self.shutdown_schedules().await;
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        info!("[app] bye");

        Ok(())
    }

    // ── Message handler ───────────────────────────────────────────────────────

    fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Event(ev) => match ev {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        return;
                    }
                    let actions = self.handle_key(key);
                    for a in actions {
                        self.dispatch(a);
                    }
                }
                Event::Mouse(mouse) => {
                    let actions = self.handle_mouse(mouse);
                    for a in actions {
                        self.dispatch(a);
                    }
                }
                Event::Resize(w, h) => self.dispatch(Action::Resize(w, h)),
                _ => {}
            },

            AppMessage::LoginSettled(ticket, outcome) => {
                match self.state.session.settle_login(ticket, outcome) {
                    LoginOutcome::Authenticated => self.on_authenticated(),
                    LoginOutcome::Alert(text) => self.state.alert = Some(text),
                    LoginOutcome::Stale => debug!("[app] stale login response #{}", ticket.seq()),
                }
            }

            AppMessage::SummariesDue => self.fetch_summaries(false),

            AppMessage::SummariesSettled(ticket, outcome) => {
                let failure = outcome.as_ref().err().map(ToString::to_string);
                if !self.state.feed.settle(ticket, outcome) {
                    return;
                }
                match (failure, self.toast.has_spinner()) {
                    (Some(e), true) => self.toast.resolve_spinner(
                        Severity::Error,
                        format!("refresh failed: {}", e),
                        Duration::from_secs(5),
                    ),
                    (Some(e), false) => self.toast.warning(format!("summaries: {}", e)),
                    (None, true) => self.toast.resolve_spinner(
                        Severity::Success,
                        "summaries regenerated",
                        Duration::from_secs(3),
                    ),
                    (None, false) => {}
                }
            }

            AppMessage::QuerySettled(ticket, outcome) => {
                self.state.desk.settle(ticket, outcome);
            }

            AppMessage::ScrapeSettled(ticket, outcome) => {
                if let Some(confirmation) = self.state.scrape.settle(ticket, outcome) {
                    self.state.alert = Some(confirmation.to_string());
                }
            }
        }
        self.sync_input_mode();
    }

    fn start_keep_warm(&mut self) {
        if self.keep_warm.is_none() {
            self.keep_warm = Some(schedule::keep_warm(
                self.client.clone(),
                self.config.polling.keep_warm_interval(),
            ));
        }
    }

    fn on_authenticated(&mut self) {
        info!("[app] session open, starting summary schedule");
        self.toast.success("signed in");

        let tx = self.tx.clone();
        self.summaries_refresh = Some(PeriodicTask::spawn(
            "summaries",
            self.config.polling.summaries_interval(),
            FirstTick::Immediate,
            move || {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(AppMessage::SummariesDue).await;
                }
            },
        ));
    }

    /// Cancel both schedules and wait for their tasks to exit.
    async fn shutdown_schedules(&mut self) {
        for task in [self.keep_warm.take(), self.summaries_refresh.take()]
            .into_iter()
            .flatten()
        {
            debug!("[app] stopping {}", task.name());
            task.shutdown().await;
        }
    }

    fn sync_input_mode(&mut self) {
        self.state.input_mode = if self.state.alert.is_some() {
            InputMode::Alert
        } else if !self.state.session.is_authenticated() || self.focused_is_editing() {
            InputMode::Editing
        } else {
            InputMode::Normal
        };
    }

    fn focused_is_editing(&self) -> bool {
        match self.wm.focused() {
            Some(ComponentId::QueryPanel) => self.query_panel.is_editing(),
            Some(ComponentId::ScrapeForm) => self.scrape_form.is_editing(),
            _ => false,
        }
    }

    // ── Backend calls ─────────────────────────────────────────────────────────

    fn submit_login(&mut self) {
        let Some((ticket, password)) = self.state.session.begin_login() else {
            return;
        };
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = client.login(&password).await;
            let _ = tx.send(AppMessage::LoginSettled(ticket, outcome)).await;
        });
    }

    fn fetch_summaries(&mut self, force_refresh: bool) {
        let ticket = self.state.feed.begin_fetch(force_refresh);
        if force_refresh {
            self.toast.spinner(REFRESHING);
        }
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = client.channel_summaries(force_refresh).await;
            let _ = tx.send(AppMessage::SummariesSettled(ticket, outcome)).await;
        });
    }

    fn submit_query(&mut self) {
        let (ticket, query) = self.state.desk.begin_submit();
        info!("[query] asking ({} chars)", query.chars().count());
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = client.ask(&query).await;
            let _ = tx.send(AppMessage::QuerySettled(ticket, outcome)).await;
        });
    }

    fn submit_scrape(&mut self) {
        let (ticket, request) = self.state.scrape.begin_scrape();
        info!("[scrape] guild={} limit={}", request.guild_id, request.limit);
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = client.scrape(&request.guild_id, request.limit).await;
            let _ = tx.send(AppMessage::ScrapeSettled(ticket, outcome)).await;
        });
    }

    // ── Key handling ──────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return vec![Action::Quit];
        }

        // A pending alert blocks everything else until dismissed.
        if self.state.alert.is_some() {
            return self.alert.handle_key(key, &self.state);
        }

        if !self.state.session.is_authenticated() {
            return self.login.handle_key(key, &self.state);
        }

        // Help overlay captures all keys when visible
        if self.wm.show_help {
            let actions = self.help_overlay.handle_key(key, &self.state);
            if !actions.is_empty() {
                return actions;
            }
            return vec![Action::ToggleHelp];
        }

        if self.state.input_mode == InputMode::Normal {
            match key.code {
                KeyCode::Char('q') => return vec![Action::Quit],
                KeyCode::Char('?') => return vec![Action::ToggleHelp],
                KeyCode::Char('L') => return vec![Action::ToggleLogs],
                KeyCode::Char('K') => return vec![Action::ToggleKeys],
                KeyCode::Tab => return vec![Action::FocusNext],
                KeyCode::BackTab => return vec![Action::FocusPrev],
                KeyCode::Char('1') => return vec![Action::SwitchWorkspace(Workspace::Summaries)],
                KeyCode::Char('2') => return vec![Action::SwitchWorkspace(Workspace::Query)],
                KeyCode::Char('f') => {
                    return vec![Action::SwitchWorkspace(match self.wm.workspace {
                        Workspace::Summaries => Workspace::Query,
                        Workspace::Query => Workspace::Summaries,
                    })];
                }
                _ => {}
            }
        }

        // Dispatch to the focused component
        let s = &self.state;
        match self.wm.focused() {
            Some(ComponentId::SummaryList) => self.summary_list.handle_key(key, s),
            Some(ComponentId::QueryPanel) => self.query_panel.handle_key(key, s),
            Some(ComponentId::ScrapeForm) => self.scrape_form.handle_key(key, s),
            Some(ComponentId::LogPanel) => self.log_panel.handle_key(key, s),
            _ => vec![],
        }
    }

    // ── Mouse handling ────────────────────────────────────────────────────────

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        let is_click = matches!(
            event.kind,
            MouseEventKind::Down(_) | MouseEventKind::ScrollUp | MouseEventKind::ScrollDown
        );
        if !is_click || self.state.alert.is_some() || !self.state.session.is_authenticated() {
            return vec![];
        }

        let col = event.column;
        let row = event.row;

        fn hit(r: Rect, col: u16, row: u16) -> bool {
            r.width > 0
                && r.height > 0
                && col >= r.x
                && col < r.x + r.width
                && row >= r.y
                && row < r.y + r.height
        }

        let areas = self.pane_areas.clone();
        let s = &self.state;

        // Focus follows the click.
        macro_rules! click_pane {
            ($id:expr, $component:expr, $area:expr) => {{
                let mut actions = $component.handle_mouse(event, $area, s);
                if self.wm.focused() != Some($id) {
                    actions.insert(0, Action::FocusPane($id));
                }
                return actions;
            }};
        }

        if hit(areas.summary_list, col, row) {
            click_pane!(ComponentId::SummaryList, self.summary_list, areas.summary_list);
        }
        if hit(areas.scrape_form, col, row) {
            click_pane!(ComponentId::ScrapeForm, self.scrape_form, areas.scrape_form);
        }
        if hit(areas.query_panel, col, row) {
            click_pane!(ComponentId::QueryPanel, self.query_panel, areas.query_panel);
        }
        if hit(areas.log_panel, col, row) {
            click_pane!(ComponentId::LogPanel, self.log_panel, areas.log_panel);
        }

        vec![]
    }

    // ── Action dispatcher ─────────────────────────────────────────────────────

    fn dispatch(&mut self, action: Action) {
        // Broadcast to all components first (so they can drop edit state etc.)
        let secondary: Vec<Action> = {
            let s = &self.state;
            let mut out = Vec::new();
            out.extend(self.summary_list.on_action(&action, s));
            out.extend(self.query_panel.on_action(&action, s));
            out.extend(self.scrape_form.on_action(&action, s));
            out.extend(self.log_panel.on_action(&action, s));
            out.extend(self.help_overlay.on_action(&action, s));
            out
        };

        self.apply_action(action);

        // Secondary actions (depth-limited to 1 level)
        for a in secondary {
            self.apply_action(a);
        }
    }

    fn apply_action(&mut self, action: Action) {
        match &action {
            // Never log the password
            Action::PasswordChanged(_) => {}
            _ => debug!("apply_action: {:?}", action),
        }
        match action {
            // ── Session ───────────────────────────────────────────────────────
            Action::PasswordChanged(text) => self.state.session.input_password = text,
            Action::SubmitLogin => self.submit_login(),

            // ── Summaries ─────────────────────────────────────────────────────
            Action::RefreshSummaries => {
                if self.state.feed.is_refreshing() {
                    self.toast.info("refresh already running");
                } else {
                    self.fetch_summaries(true);
                }
            }

            // ── Query ─────────────────────────────────────────────────────────
            Action::QueryChanged(text) => self.state.desk.input = text,
            Action::SubmitQuery => {
                if !self.state.desk.is_loading() {
                    self.submit_query();
                }
            }

            // ── Scrape ────────────────────────────────────────────────────────
            Action::GuildIdChanged(text) => self.state.scrape.guild_id = text,
            Action::LimitChanged(text) => self.state.scrape.limit_text = text,
            Action::SubmitScrape => {
                if self.state.scrape_enabled && !self.state.scrape.is_scraping() {
                    self.submit_scrape();
                }
            }

            // Input mode is re-derived after every message.
            Action::BeginEditing | Action::EndEditing => {}

            // ── Navigation ────────────────────────────────────────────────────
            Action::FocusNext => {
                self.wm.focus_next();
            }
            Action::FocusPrev => {
                self.wm.focus_prev();
            }
            Action::FocusPane(id) => self.wm.focus_set(id),
            Action::SwitchWorkspace(ws) => {
                self.wm.set_workspace(ws);
                self.state.workspace = self.wm.workspace;
            }

            // ── UI toggles ────────────────────────────────────────────────────
            Action::ToggleLogs => {
                self.wm.toggle_log_panel();
                if self.wm.show_log_panel {
                    self.reload_tui_log();
                }
            }
            Action::ToggleHelp => self.wm.show_help = !self.wm.show_help,
            Action::ToggleKeys => self.wm.show_keys_bar = !self.wm.show_keys_bar,
            Action::DismissAlert => self.state.alert = None,

            // ── System ────────────────────────────────────────────────────────
            Action::Quit => self.should_quit = true,
            Action::Resize(_, _) => {}
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        use crate::theme::C_BG;
        use ratatui::widgets::Block;
        let area = frame.area();

        frame.render_widget(
            Block::default().style(ratatui::style::Style::default().bg(C_BG)),
            area,
        );

        let authenticated = self.state.session.is_authenticated();

        // ── Outer layout: header | body | (log) | (statusbar) ────────────────
        let header_h = if authenticated { 1u16 } else { 0 };
        let status_h = if self.wm.show_keys_bar { 1u16 } else { 0 };
        let log_h = if authenticated && self.wm.show_log_panel { 10u16 } else { 0 };

        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(header_h),
                Constraint::Min(0),
                Constraint::Length(log_h),
                Constraint::Length(status_h),
            ])
            .split(area);

        let header_area = outer[0];
        let body_area = outer[1];
        let log_area = outer[2];
        let status_area = outer[3];

        if self.wm.show_keys_bar {
            status_bar::draw_keys_bar(
                frame,
                status_area,
                self.state.input_mode,
                self.wm.workspace,
                authenticated,
            );
        }

        if !authenticated {
            self.pane_areas = PaneAreas::default();
            self.login.draw(frame, body_area, true, &self.state);
        } else {
            let stamp = self.state.feed.last_update_label();
            status_bar::draw_tab_bar(frame, header_area, self.wm.workspace, stamp.as_deref());

            // ── Log panel ─────────────────────────────────────────────────────
            if self.wm.show_log_panel {
                use ratatui::widgets::Borders;
                let log_focused = self.wm.focus.is_focused(ComponentId::LogPanel);
                self.log_panel.borders = Borders::LEFT | Borders::BOTTOM | Borders::RIGHT;
                self.log_panel.draw(frame, log_area, log_focused, &self.state);
                self.pane_areas.log_panel = log_area;
            } else {
                self.pane_areas.log_panel = Rect::default();
            }

            match self.wm.workspace {
                Workspace::Summaries => self.draw_summaries(frame, body_area),
                Workspace::Query => self.draw_query(frame, body_area),
            }

            if self.wm.show_help {
                self.help_overlay.draw(frame, area, false, &self.state);
            }
        }

        // ── Alert (modal) ────────────────────────────────────────────────────
        self.alert.draw(frame, area, true, &self.state);

        // ── Toast notifications (topmost layer) ──────────────────────────────
        self.toast.draw(frame, area);
    }

    fn draw_summaries(&mut self, frame: &mut ratatui::Frame, area: Rect) {
        let focused = self.wm.focus.is_focused(ComponentId::SummaryList);
        self.summary_list.draw(frame, area, focused, &self.state);
        self.pane_areas.summary_list = area;
        self.pane_areas.query_panel = Rect::default();
        self.pane_areas.scrape_form = Rect::default();
    }

    fn draw_query(&mut self, frame: &mut ratatui::Frame, area: Rect) {
        self.pane_areas.summary_list = Rect::default();

        let (scrape_area, query_area) = if self.state.scrape_enabled {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(5), Constraint::Min(0)])
                .split(area);
            (split[0], split[1])
        } else {
            (Rect::default(), area)
        };

        if self.state.scrape_enabled {
            let focused = self.wm.focus.is_focused(ComponentId::ScrapeForm);
            self.scrape_form.draw(frame, scrape_area, focused, &self.state);
        }
        self.pane_areas.scrape_form = scrape_area;

        let focused = self.wm.focus.is_focused(ComponentId::QueryPanel);
        self.query_panel.draw(frame, query_area, focused, &self.state);
        self.pane_areas.query_panel = query_area;
    }

    /// Read the tail of the log file into state.tui_log_lines (synchronous, cheap).
    fn reload_tui_log(&mut self) {
        match std::fs::read_to_string(&self.log_path) {
            Ok(content) => {
                let lines: Vec<&str> = content.lines().collect();
                let start = lines.len().saturating_sub(LOG_TAIL_LINES);
                self.state.tui_log_lines = lines[start..].iter().map(|l| l.to_string()).collect();
            }
            Err(e) => warn!("[app] cannot read {}: {}", self.log_path.display(), e),
        }
    }
}

fn display_url(base_url: &str) -> &str {
    if base_url.is_empty() {
        "(not configured)"
    } else {
        base_url
    }
}

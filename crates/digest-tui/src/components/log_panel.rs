//! LogPanel component: tail of the log file under the workspace body.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Borders, Clear, Paragraph},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_MUTED, C_SECONDARY},
    widgets::pane_chrome::pane_chrome_borders,
};

pub struct LogPanel {
    /// Which borders to draw; the App drops the top edge when stacked.
    pub borders: Borders,
    /// Index of the first visible line; `usize::MAX` pins to the bottom.
    pub scroll: usize,
    last_log_count: usize,
}

impl LogPanel {
    pub fn new() -> Self {
        Self {
            borders: Borders::ALL,
            scroll: usize::MAX,
            last_log_count: 0,
        }
    }
}

impl Component for LogPanel {
    fn id(&self) -> ComponentId {
        ComponentId::LogPanel
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll = self.scroll.saturating_add(1),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
            KeyCode::Home | KeyCode::Char('g') => self.scroll = 0,
            KeyCode::End | KeyCode::Char('G') => self.scroll = usize::MAX,
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::ScrollUp => self.scroll = self.scroll.saturating_sub(1),
            MouseEventKind::ScrollDown => self.scroll = self.scroll.saturating_add(1),
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if *action == Action::ToggleLogs {
            self.scroll = usize::MAX;
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        if area.height == 0 {
            return;
        }
        frame.render_widget(Clear, area);

        let block = pane_chrome_borders("log", Some('L'), focused, None, self.borders);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let logs = &state.tui_log_lines;
        if logs.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  no log entries yet", Style::default().fg(C_MUTED))),
                inner,
            );
            return;
        }

        let height = inner.height as usize;
        let max_scroll = logs.len().saturating_sub(height);

        // Follow new entries while parked at the bottom.
        if logs.len() > self.last_log_count && self.scroll >= max_scroll.saturating_sub(1) {
            self.scroll = usize::MAX;
        }
        self.last_log_count = logs.len();
        self.scroll = self.scroll.min(max_scroll);

        let lines: Vec<Line> = logs
            .iter()
            .skip(self.scroll)
            .take(height)
            .map(|raw| {
                Line::from(Span::styled(
                    format!(" {}", compact_log_line(raw)),
                    Style::default().fg(C_SECONDARY),
                ))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

// ── Log line formatting ───────────────────────────────────────────────────────

const LEVELS: [&str; 5] = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];

/// `2026-10-18T09:15:02.123Z  INFO digest_tui::app: [summaries] 4 channels`
/// becomes `09:15:02 INFO [summaries] 4 channels`.
fn compact_log_line(raw: &str) -> String {
    let mut rest = raw.trim();
    let mut head = Vec::with_capacity(2);

    if let Some((first, tail)) = rest.split_once(char::is_whitespace) {
        if let Some(stamp) = short_time(first) {
            head.push(stamp);
            rest = tail.trim_start();
        }
    }
    if let Some((first, tail)) = rest.split_once(char::is_whitespace) {
        if LEVELS.contains(&first) {
            head.push(first.to_string());
            rest = tail.trim_start();
        }
    }
    if let Some((target, msg)) = rest.split_once(": ") {
        if target.contains("::") || target.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            rest = msg;
        }
    }

    head.push(rest.to_string());
    head.retain(|s| !s.is_empty());
    head.join(" ")
}

fn short_time(token: &str) -> Option<String> {
    let dt = chrono::DateTime::parse_from_rfc3339(token).ok()?;
    Some(dt.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compacts_tracing_line() {
        let line = "2026-10-18T09:15:02.123456Z  INFO digest_tui::app: [summaries] 4 channels";
        let compact = compact_log_line(line);
        assert!(compact.ends_with("INFO [summaries] 4 channels"), "{}", compact);
        assert_eq!(compact.split(' ').next().map(str::len), Some(8));
    }

    #[test]
    fn test_leaves_free_text_alone() {
        assert_eq!(compact_log_line("  plain message  "), "plain message");
    }

    #[test]
    fn test_message_with_colon_kept() {
        assert_eq!(
            compact_log_line("WARN [query] failed: Query failed (500)"),
            "WARN [query] failed: Query failed (500)"
        );
    }
}

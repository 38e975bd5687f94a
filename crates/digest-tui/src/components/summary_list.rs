//! SummaryList component: weekly channel summaries as a scrollable column of
//! cards, busiest channel first.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use digest_proto::protocol::ChannelSummary;
use digest_proto::summaries::SummaryView;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    markdown::render_markdown,
    theme::{
        style_error, style_muted, C_ACCENT, C_OK, C_PANEL_BORDER, C_PENDING, C_PRIMARY,
        C_SECONDARY, C_SKELETON,
    },
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        wrap::wrap_lines,
    },
};

pub const NO_ACTIVITY: &str = "No channel activity found in the past week.";
pub const REFRESHING: &str = "Generating fresh summaries...";

const SKELETON_CARDS: usize = 4;

pub struct SummaryList {
    scroll: u16,
}

impl SummaryList {
    pub fn new() -> Self {
        Self { scroll: 0 }
    }

    fn scroll_by(&mut self, delta: i32) {
        self.scroll = (self.scroll as i32 + delta).clamp(0, u16::MAX as i32) as u16;
    }
}

impl Component for SummaryList {
    fn id(&self) -> ComponentId {
        ComponentId::SummaryList
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll_by(-1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_by(1),
            KeyCode::PageUp => self.scroll_by(-10),
            KeyCode::PageDown => self.scroll_by(10),
            KeyCode::Home | KeyCode::Char('g') => self.scroll = 0,
            KeyCode::End | KeyCode::Char('G') => self.scroll = u16::MAX,
            KeyCode::Char('R') => return vec![Action::RefreshSummaries],
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::ScrollUp => self.scroll_by(-3),
            MouseEventKind::ScrollDown => self.scroll_by(3),
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let badge = if state.feed.is_refreshing() {
            Some(Badge {
                text: "REFRESHING",
                color: C_PENDING,
            })
        } else if state.feed.error().is_some() {
            Some(Badge {
                text: "ERR",
                color: C_ACCENT,
            })
        } else if state.feed.last_update().is_some() {
            Some(Badge {
                text: "LIVE",
                color: C_OK,
            })
        } else {
            None
        };
        let block = pane_chrome("Weekly Channel Summaries", Some('1'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines = wrap_lines(summary_lines(state, inner.width), inner.width);
        let max_scroll = lines.len().saturating_sub(inner.height as usize);
        self.scroll = self.scroll.min(max_scroll.min(u16::MAX as usize) as u16);

        frame.render_widget(Paragraph::new(lines).scroll((self.scroll, 0)), inner);
    }
}

/// Everything the pane shows, top to bottom.
pub fn summary_lines(state: &AppState, width: u16) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if let Some(stamp) = state.feed.last_update_label() {
        lines.push(Line::from(Span::styled(
            format!("Last updated: {}", stamp),
            Style::default().fg(C_SECONDARY),
        )));
    }
    if state.feed.is_refreshing() {
        lines.push(Line::from(Span::styled(
            REFRESHING,
            Style::default().fg(C_PENDING),
        )));
    }
    if !lines.is_empty() {
        lines.push(Line::from(""));
    }

    match state.summary_view() {
        SummaryView::Failed(error) => {
            lines.push(Line::from(Span::styled(
                format!("Error loading channel summaries: {}", error),
                style_error(),
            )));
        }
        SummaryView::Loading => {
            for _ in 0..SKELETON_CARDS {
                lines.extend(skeleton_card(width));
            }
        }
        SummaryView::NoActivity => {
            lines.push(Line::from(Span::styled(NO_ACTIVITY, style_muted())));
        }
        SummaryView::Channels(channels) => {
            for channel in channels {
                lines.extend(channel_card(channel, width));
            }
        }
    }
    lines
}

fn channel_card(channel: &ChannelSummary, width: u16) -> Vec<Line<'static>> {
    let name = format!("# {}", channel.channel_name);
    let stats = format!(
        "{} messages · {} participants · Peak: {}",
        channel.message_count, channel.unique_authors, channel.most_active_hour
    );

    let mut lines = Vec::new();
    let gap = (width as usize).saturating_sub(name.width() + stats.width());
    if gap >= 2 {
        lines.push(Line::from(vec![
            Span::styled(
                name,
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" ".repeat(gap)),
            Span::styled(stats, Style::default().fg(C_SECONDARY)),
        ]));
    } else {
        lines.push(Line::from(Span::styled(
            name,
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(stats, Style::default().fg(C_SECONDARY))));
    }

    lines.push(Line::from(Span::styled(
        "Last 7 Days Activity:",
        Style::default().fg(C_SECONDARY).add_modifier(Modifier::BOLD),
    )));
    lines.extend(render_markdown(&channel.summary));
    lines.push(Line::from(Span::styled(
        format!("Summary generated {} hours ago", channel.cache_age_hours()),
        style_muted(),
    )));
    lines.push(Line::from(Span::styled(
        "─".repeat(width as usize),
        Style::default().fg(C_PANEL_BORDER),
    )));
    lines
}

fn skeleton_card(width: u16) -> Vec<Line<'static>> {
    let bar = |fraction: f32| {
        let n = ((width as f32) * fraction) as usize;
        Line::from(Span::styled("▒".repeat(n.max(1)), Style::default().fg(C_SKELETON)))
    };
    let chips = Line::from(
        (0..3)
            .flat_map(|_| {
                [
                    Span::styled("▒".repeat(10), Style::default().fg(C_SKELETON)),
                    Span::raw("  "),
                ]
            })
            .collect::<Vec<_>>(),
    );
    vec![bar(0.3), chips, bar(1.0), bar(0.75), bar(0.83), Line::from("")]
}

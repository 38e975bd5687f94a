//! ScrapeForm component: server id and message limit for a backend scrape.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{style_error, style_muted, C_PENDING, C_SECONDARY},
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        text_input::{InputAction, TextInput},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    GuildId,
    Limit,
}

pub struct ScrapeForm {
    guild_id: TextInput,
    limit: TextInput,
    field: Field,
}

impl ScrapeForm {
    pub fn new(default_limit: u32) -> Self {
        Self {
            guild_id: TextInput::new("server id", "Discord Server ID"),
            limit: TextInput::new("limit    ", "Message Limit").with_value(&default_limit.to_string()),
            field: Field::GuildId,
        }
    }

    fn current(&mut self) -> &mut TextInput {
        match self.field {
            Field::GuildId => &mut self.guild_id,
            Field::Limit => &mut self.limit,
        }
    }

    fn switch_field(&mut self) {
        let was_active = self.current().is_active();
        self.current().deactivate();
        self.field = match self.field {
            Field::GuildId => Field::Limit,
            Field::Limit => Field::GuildId,
        };
        if was_active {
            self.current().activate();
        }
    }
}

impl Component for ScrapeForm {
    fn id(&self) -> ComponentId {
        ComponentId::ScrapeForm
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        if self.is_editing() {
            if matches!(key.code, KeyCode::Up | KeyCode::Down) {
                self.switch_field();
                return vec![];
            }
            let field = self.field;
            return match self.current().handle_key(key) {
                InputAction::Changed(text) => match field {
                    Field::GuildId => vec![Action::GuildIdChanged(text)],
                    Field::Limit => vec![Action::LimitChanged(text)],
                },
                InputAction::Submitted if state.scrape.is_scraping() => vec![],
                InputAction::Submitted => {
                    self.current().deactivate();
                    vec![Action::SubmitScrape, Action::EndEditing]
                }
                InputAction::Cancelled => vec![Action::EndEditing],
                InputAction::None => vec![],
            };
        }
        match key.code {
            KeyCode::Up | KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('k') => {
                self.switch_field();
                vec![]
            }
            KeyCode::Enter | KeyCode::Char('i') => {
                self.current().activate();
                vec![Action::BeginEditing]
            }
            _ => vec![],
        }
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if matches!(action, Action::FocusNext | Action::FocusPrev | Action::SwitchWorkspace(_)) {
            self.guild_id.deactivate();
            self.limit.deactivate();
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let badge = state.scrape.is_scraping().then_some(Badge {
            text: "SCRAPING",
            color: C_PENDING,
        });
        let block = pane_chrome("Discord Server Scraper", None, focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(inner);

        let marker = |field: Field| {
            if focused && self.field == field {
                "›"
            } else {
                " "
            }
        };
        for (row, field) in [(rows[0], Field::GuildId), (rows[1], Field::Limit)] {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(2), Constraint::Min(0)])
                .split(row);
            frame.render_widget(
                Paragraph::new(Span::styled(marker(field), Style::default().fg(C_SECONDARY))),
                cols[0],
            );
            match field {
                Field::GuildId => self.guild_id.draw(frame, cols[1]),
                Field::Limit => self.limit.draw(frame, cols[1]),
            }
        }

        let status = if state.scrape.is_scraping() {
            Line::from(Span::styled("Scraping...", Style::default().fg(C_PENDING)))
        } else if let Some(err) = state.scrape.error() {
            Line::from(Span::styled(err.to_string(), style_error()))
        } else {
            Line::from(Span::styled("Enter to edit, Enter again to scrape", style_muted()))
        };
        frame.render_widget(Paragraph::new(status), rows[2]);
    }

    fn is_editing(&self) -> bool {
        self.guild_id.is_active() || self.limit.is_active()
    }
}

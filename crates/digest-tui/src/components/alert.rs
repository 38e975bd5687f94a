//! Alert dialog: blocking message box dismissed with Enter or Esc.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    components::help_overlay::centered_rect,
    theme::{C_ACCENT, C_MUTED, C_OVERLAY_BG, C_PRIMARY},
};

pub struct AlertDialog;

impl AlertDialog {
    pub fn new() -> Self {
        Self
    }
}

impl Component for AlertDialog {
    fn id(&self) -> ComponentId {
        ComponentId::Alert
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release || state.alert.is_none() {
            return vec![];
        }
        match key.code {
            KeyCode::Enter | KeyCode::Esc => vec![Action::DismissAlert],
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        let Some(message) = state.alert.as_deref() else {
            return;
        };
        let popup = centered_rect(50, 7, area);
        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    message.to_string(),
                    Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled("[ OK ]", Style::default().fg(C_MUTED))),
            ])
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(C_ACCENT))
                    .style(Style::default().bg(C_OVERLAY_BG)),
            ),
            popup,
        );
    }
}

//! Login screen: masked password field gating the rest of the app.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_ACCENT, C_PENDING, C_SECONDARY},
    widgets::{
        pane_chrome::pane_chrome,
        text_input::{InputAction, TextInput},
    },
};

pub struct LoginScreen {
    password: TextInput,
}

impl LoginScreen {
    pub fn new() -> Self {
        let mut password = TextInput::new("password", "").masked();
        password.activate();
        Self { password }
    }
}

impl Component for LoginScreen {
    fn id(&self) -> ComponentId {
        ComponentId::Login
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        // Esc clears instead of leaving the field; there is nowhere else to go.
        if key.code == KeyCode::Esc {
            self.password.clear();
            return vec![Action::PasswordChanged(String::new())];
        }
        match self.password.handle_key(key) {
            InputAction::Changed(text) => vec![Action::PasswordChanged(text)],
            InputAction::Submitted if !state.session.is_submitting() => vec![Action::SubmitLogin],
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let width = area.width.min(56);
        let x = area.x + (area.width - width) / 2;
        let column = Rect {
            x,
            width,
            ..area
        };
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(2),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(column);

        frame.render_widget(
            Paragraph::new(vec![
                Line::from(Span::styled(
                    "Channel digest",
                    Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    "Enter the access password to continue",
                    Style::default().fg(C_SECONDARY),
                )),
            ])
            .alignment(Alignment::Center),
            rows[1],
        );

        let block = pane_chrome("sign in", None, focused && state.alert.is_none(), None);
        let inner = block.inner(rows[2]);
        frame.render_widget(block, rows[2]);
        self.password.active = state.alert.is_none();
        self.password.draw(frame, inner);

        let (label, color) = if state.session.is_submitting() {
            ("Authenticating...", C_PENDING)
        } else {
            ("Enter to sign in", C_SECONDARY)
        };
        frame.render_widget(
            Paragraph::new(Span::styled(label, Style::default().fg(color)))
                .alignment(Alignment::Center),
            rows[3],
        );
    }

    fn is_editing(&self) -> bool {
        true
    }
}

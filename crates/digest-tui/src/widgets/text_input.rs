//! TextInput: single-line field on top of tui-input, optionally masked.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{C_INPUT_BG, C_INPUT_FG, C_MUTED, C_SECONDARY};

#[derive(Debug, Clone, PartialEq)]
pub enum InputAction {
    Changed(String),
    Submitted,
    Cancelled,
    None,
}

pub struct TextInput {
    input: Input,
    pub active: bool,
    masked: bool,
    prompt: &'static str,
    placeholder: String,
}

impl TextInput {
    pub fn new(prompt: &'static str, placeholder: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            active: false,
            masked: false,
            prompt,
            placeholder: placeholder.into(),
        }
    }

    /// Render every character as `*`.
    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.set_value(value);
        self
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn clear(&mut self) {
        self.input = Input::default();
    }

    pub fn set_value(&mut self, value: &str) {
        self.input = Input::new(value.to_string());
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.input.value().is_empty()
    }

    /// Enter submits and Esc cancels; the field stays active on Enter so the
    /// caller decides whether editing continues.
    pub fn handle_key(&mut self, key: KeyEvent) -> InputAction {
        match key.code {
            KeyCode::Esc => {
                self.deactivate();
                InputAction::Cancelled
            }
            KeyCode::Enter => InputAction::Submitted,
            _ => {
                let before = self.input.value().to_string();
                self.input.handle_event(&Event::Key(key));
                if self.input.value() != before {
                    InputAction::Changed(self.input.value().to_string())
                } else {
                    InputAction::None
                }
            }
        }
    }

    fn display_text(&self) -> String {
        if self.masked {
            "*".repeat(self.input.value().chars().count())
        } else {
            self.input.value().to_string()
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let prompt_w = self.prompt.chars().count() as u16 + 1;
        let scroll = self
            .input
            .visual_scroll(area.width.saturating_sub(prompt_w + 1) as usize);

        let prompt = Span::styled(format!("{} ", self.prompt), Style::default().fg(C_SECONDARY));
        let body = if self.is_empty() {
            Span::styled(self.placeholder.clone(), Style::default().fg(C_MUTED))
        } else {
            let shown: String = self.display_text().chars().skip(scroll).collect();
            Span::styled(shown, Style::default().fg(C_INPUT_FG))
        };

        frame.render_widget(
            Paragraph::new(Line::from(vec![prompt, body])).style(Style::default().bg(C_INPUT_BG)),
            area,
        );

        if self.active {
            let cursor_x = area.x + prompt_w + (self.input.visual_cursor().saturating_sub(scroll)) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
        }
    }
}

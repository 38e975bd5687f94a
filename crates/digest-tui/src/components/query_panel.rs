//! QueryPanel component: question input, final answer, how the backend got
//! there, and the full message trace.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use digest_proto::protocol::{Message, QueryResult};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    markdown::render_markdown,
    theme::{
        style_error, style_muted, style_title, C_ACCENT, C_CODE, C_PENDING, C_PRIMARY,
        C_ROLE_ASSISTANT, C_ROLE_TOOL, C_ROLE_USER, C_SECONDARY,
    },
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        text_input::{InputAction, TextInput},
        wrap::wrap_lines,
    },
};

pub const PROCESSING: &str = "Processing...";

pub struct QueryPanel {
    input: TextInput,
    scroll: u16,
}

impl QueryPanel {
    pub fn new() -> Self {
        Self {
            input: TextInput::new(">", "Ask a question about the Discord data..."),
            scroll: 0,
        }
    }

    fn scroll_by(&mut self, delta: i32) {
        self.scroll = (self.scroll as i32 + delta).clamp(0, u16::MAX as i32) as u16;
    }
}

impl Component for QueryPanel {
    fn id(&self) -> ComponentId {
        ComponentId::QueryPanel
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        if self.input.is_active() {
            return match self.input.handle_key(key) {
                InputAction::Changed(text) => vec![Action::QueryChanged(text)],
                InputAction::Submitted if state.desk.is_loading() => vec![],
                InputAction::Submitted => {
                    self.input.deactivate();
                    self.scroll = 0;
                    vec![Action::SubmitQuery, Action::EndEditing]
                }
                InputAction::Cancelled => vec![Action::EndEditing],
                InputAction::None => vec![],
            };
        }
        match key.code {
            KeyCode::Char('/') | KeyCode::Char('i') | KeyCode::Enter => {
                self.input.activate();
                vec![Action::BeginEditing]
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll_by(-1);
                vec![]
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll_by(1);
                vec![]
            }
            KeyCode::PageUp => {
                self.scroll_by(-10);
                vec![]
            }
            KeyCode::PageDown => {
                self.scroll_by(10);
                vec![]
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.scroll = 0;
                vec![]
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.scroll = u16::MAX;
                vec![]
            }
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::ScrollUp => self.scroll_by(-3),
            MouseEventKind::ScrollDown => self.scroll_by(3),
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        // Focus moved away mid-edit.
        if matches!(action, Action::FocusNext | Action::FocusPrev | Action::SwitchWorkspace(_)) {
            self.input.deactivate();
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let badge = if state.desk.is_loading() {
            Some(Badge {
                text: "ASKING",
                color: C_PENDING,
            })
        } else {
            None
        };
        let block = pane_chrome("Custom Query", Some('2'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        self.input.draw(frame, rows[0]);

        let status = if state.desk.is_loading() {
            Line::from(Span::styled(PROCESSING, Style::default().fg(C_PENDING)))
        } else if let Some(err) = state.desk.error() {
            Line::from(Span::styled(err.to_string(), style_error()))
        } else {
            Line::from("")
        };
        frame.render_widget(Paragraph::new(status), rows[1]);

        let lines = match state.desk.result() {
            Some(result) => result_lines(result),
            None => vec![Line::from(Span::styled(
                "Press / to ask a question.",
                style_muted(),
            ))],
        };
        let lines = wrap_lines(lines, rows[2].width);
        let max_scroll = lines.len().saturating_sub(rows[2].height as usize);
        self.scroll = self.scroll.min(max_scroll.min(u16::MAX as usize) as u16);
        frame.render_widget(Paragraph::new(lines).scroll((self.scroll, 0)), rows[2]);
    }

    fn is_editing(&self) -> bool {
        self.input.is_active()
    }
}

fn heading(title: &str) -> Line<'static> {
    Line::from(Span::styled(title.to_string(), style_title().fg(C_ACCENT)))
}

/// Final answer, approach insights, then the trace.
pub fn result_lines(result: &QueryResult) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(""), heading("Final Answer")];
    lines.extend(render_markdown(&result.answer));
    lines.push(Line::from(""));

    if let Some(approach) = result.approach() {
        lines.push(Line::from(vec![
            Span::styled("Selected Approach: ", style_title()),
            Span::styled(approach.label(), Style::default().fg(C_PRIMARY)),
        ]));
        if let Some(sql) = result.generated_sql() {
            lines.push(Line::from(Span::styled("Generated SQL:", style_title())));
            for line in sql.lines() {
                lines.push(Line::from(Span::styled(
                    format!("  {}", line),
                    Style::default().fg(C_CODE),
                )));
            }
        }
        lines.push(Line::from(""));
    }

    if !result.chat_history.is_empty() {
        lines.push(heading("Message History"));
        for message in &result.chat_history {
            lines.extend(message_lines(message));
        }
    }
    lines
}

fn role_color(role: &str) -> Color {
    match role {
        "user" => C_ROLE_USER,
        "assistant" => C_ROLE_ASSISTANT,
        "tool" | "function" => C_ROLE_TOOL,
        _ => C_SECONDARY,
    }
}

fn message_lines(message: &Message) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        message.role.clone(),
        Style::default()
            .fg(role_color(&message.role))
            .add_modifier(Modifier::BOLD),
    ))];
    for line in message.content_text().lines() {
        lines.push(Line::from(Span::styled(
            format!("  {}", line),
            Style::default().fg(C_PRIMARY),
        )));
    }
    for call in message.tool_calls() {
        lines.push(Line::from(vec![
            Span::styled("  Tool Call: ", Style::default().fg(C_SECONDARY)),
            Span::styled(
                call.function.name.clone(),
                Style::default().fg(C_ROLE_TOOL).add_modifier(Modifier::BOLD),
            ),
        ]));
        lines.push(Line::from(Span::styled(
            format!("    {}", call.function.arguments),
            Style::default().fg(C_CODE),
        )));
    }
    lines.push(Line::from(""));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use digest_proto::protocol::{ToolCall, ToolFunction};
    use ratatui::backend::TestBackend;
    use ratatui::crossterm::event::KeyModifiers;
    use ratatui::Terminal;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn text(lines: &[Line]) -> String {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn sql_result() -> QueryResult {
        QueryResult {
            answer: "42 users".to_string(),
            chat_history: vec![
                Message {
                    role: "user".to_string(),
                    content: Some("how many users?".to_string()),
                    tool_calls: None,
                },
                Message {
                    role: "assistant".to_string(),
                    content: None,
                    tool_calls: Some(vec![ToolCall {
                        id: Some("call_0".to_string()),
                        function: ToolFunction {
                            name: "route_query".to_string(),
                            arguments: r#"{"approach":"sql","sql_query":"SELECT COUNT(*) FROM users"}"#
                                .to_string(),
                        },
                    }]),
                },
            ],
        }
    }

    #[test]
    fn test_result_sections() {
        let rendered = text(&result_lines(&sql_result()));
        assert!(rendered.contains("Final Answer\n42 users"));
        assert!(rendered.contains("Selected Approach: SQL Query Generation"));
        assert!(rendered.contains("  SELECT COUNT(*) FROM users"));
        assert!(rendered.contains("user\n  how many users?"));
        assert!(rendered.contains("  Tool Call: route_query"));
    }

    #[test]
    fn test_no_insights_without_tool_calls() {
        let result = QueryResult {
            answer: "hi".to_string(),
            chat_history: Vec::new(),
        };
        let rendered = text(&result_lines(&result));
        assert!(!rendered.contains("Selected Approach"));
        assert!(!rendered.contains("Message History"));
    }

    #[test]
    fn test_editing_flow() {
        let mut panel = QueryPanel::new();
        let state = AppState::new(Vec::new(), false, 100);

        assert!(!panel.is_editing());
        assert_eq!(panel.handle_key(key(KeyCode::Char('/')), &state), vec![Action::BeginEditing]);
        assert!(panel.is_editing());
        assert_eq!(
            panel.handle_key(key(KeyCode::Char('q')), &state),
            vec![Action::QueryChanged("q".to_string())]
        );
        assert_eq!(
            panel.handle_key(key(KeyCode::Enter), &state),
            vec![Action::SubmitQuery, Action::EndEditing]
        );
        assert!(!panel.is_editing());
    }

    #[test]
    fn test_submit_ignored_while_processing() {
        let mut panel = QueryPanel::new();
        let mut state = AppState::new(Vec::new(), false, 100);
        state.desk.begin_submit();
        panel.handle_key(key(KeyCode::Char('i')), &state);
        assert!(panel.handle_key(key(KeyCode::Enter), &state).is_empty());
        assert!(panel.is_editing());
    }

    #[test]
    fn test_esc_leaves_editing() {
        let mut panel = QueryPanel::new();
        let state = AppState::new(Vec::new(), false, 100);
        panel.handle_key(key(KeyCode::Char('i')), &state);
        assert_eq!(panel.handle_key(key(KeyCode::Esc), &state), vec![Action::EndEditing]);
        assert!(!panel.is_editing());
    }

    #[test]
    fn test_end_reaches_end_of_wrapped_answer() {
        let mut panel = QueryPanel::new();
        let mut state = AppState::new(Vec::new(), false, 100);
        let (ticket, _) = state.desk.begin_submit();
        let answer = format!(
            "{}closing-remark",
            "Most activity came from the release channel. ".repeat(40)
        );
        state.desk.settle(
            ticket,
            Ok(QueryResult {
                answer,
                chat_history: Vec::new(),
            }),
        );
        panel.handle_key(key(KeyCode::End), &state);

        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal
            .draw(|frame| panel.draw(frame, frame.area(), true, &state))
            .unwrap();

        let screen: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(screen.contains("closing-remark"));
        assert!(!screen.contains("Final Answer"));
    }
}

//! Header tab strip and the bottom keybindings bar.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::action::Workspace;
use crate::theme::{
    C_ACCENT, C_MODE_ALERT, C_MODE_EDIT, C_MODE_NORMAL, C_MUTED, C_NUMBER_HINT, C_PRIMARY,
    C_SECONDARY,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    /// A text field owns the keyboard.
    Editing,
    /// A blocking alert owns the keyboard.
    Alert,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Editing => "EDIT",
            Self::Alert => "ALERT",
        }
    }

    pub fn color(self) -> ratatui::style::Color {
        match self {
            Self::Normal => C_MODE_NORMAL,
            Self::Editing => C_MODE_EDIT,
            Self::Alert => C_MODE_ALERT,
        }
    }
}

/// Draw the one-row tab strip: app name, tabs, and the last-update stamp.
pub fn draw_tab_bar(
    frame: &mut Frame,
    area: Rect,
    workspace: Workspace,
    last_update: Option<&str>,
) {
    let mut spans = vec![Span::styled(
        " digest ",
        Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
    )];
    for (i, ws) in [Workspace::Summaries, Workspace::Query].iter().enumerate() {
        spans.push(Span::styled(
            format!(" [{}] ", i + 1),
            Style::default().fg(C_NUMBER_HINT),
        ));
        let style = if *ws == workspace {
            Style::default()
                .fg(C_PRIMARY)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(C_MUTED)
        };
        spans.push(Span::styled(ws.title(), style));
    }

    let left = Line::from(spans);
    frame.render_widget(Paragraph::new(left), area);

    if let Some(stamp) = last_update {
        let right = Line::from(Span::styled(
            format!("last update {} ", stamp),
            Style::default().fg(C_SECONDARY),
        ))
        .right_aligned();
        frame.render_widget(Paragraph::new(right), area);
    }
}

pub fn keys_hint(mode: InputMode, workspace: Workspace, authenticated: bool) -> &'static str {
    if !authenticated {
        return match mode {
            InputMode::Alert => " Enter/Esc dismiss  Ctrl-C quit",
            _ => " type password  Enter sign in  Esc clear  Ctrl-C quit",
        };
    }
    match mode {
        InputMode::Normal => match workspace {
            Workspace::Summaries => {
                " ↑↓/jk scroll  R refresh  Tab panes  1/2 tabs  L logs  K keys  ? help  q quit"
            }
            Workspace::Query => {
                " / or i ask  ↑↓/jk scroll trace  1/2 tabs  L logs  K keys  ? help  q quit"
            }
        },
        InputMode::Editing => " type  Enter submit  Esc stop editing",
        InputMode::Alert => " Enter/Esc dismiss",
    }
}

/// Draw the keybindings footer bar (one row).
pub fn draw_keys_bar(
    frame: &mut Frame,
    area: Rect,
    mode: InputMode,
    workspace: Workspace,
    authenticated: bool,
) {
    let label = if authenticated {
        match mode {
            InputMode::Normal => match workspace {
                Workspace::Summaries => "SUMMARIES",
                Workspace::Query => "QUERY",
            },
            other => other.label(),
        }
    } else {
        "LOGIN"
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", label),
            Style::default()
                .fg(mode.color())
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            keys_hint(mode, workspace, authenticated),
            Style::default().fg(C_MUTED),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

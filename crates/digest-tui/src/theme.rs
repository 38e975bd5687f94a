//! Color palette and style constants for the digest TUI.

use ratatui::style::{Color, Modifier, Style};

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_BG: Color = Color::Rgb(18, 18, 18);
pub const C_ACCENT: Color = Color::Rgb(255, 95, 95);
pub const C_OK: Color = Color::Rgb(80, 200, 120);
pub const C_PENDING: Color = Color::Rgb(255, 184, 80);
pub const C_ERROR: Color = Color::Rgb(255, 80, 80);
pub const C_MUTED: Color = Color::Rgb(72, 72, 88);
pub const C_SEPARATOR: Color = Color::Rgb(40, 40, 52);
pub const C_SECONDARY: Color = Color::Rgb(115, 115, 138);
pub const C_PRIMARY: Color = Color::Rgb(210, 210, 225);
pub const C_PANEL_BORDER: Color = Color::Rgb(40, 40, 52);
pub const C_PANEL_BORDER_FOCUSED: Color = Color::Rgb(120, 100, 200);
pub const C_NUMBER_HINT: Color = Color::Rgb(90, 90, 115);
pub const C_INPUT_BG: Color = Color::Rgb(20, 20, 32);
pub const C_INPUT_FG: Color = Color::Rgb(255, 200, 80);
pub const C_SKELETON: Color = Color::Rgb(32, 32, 44);
pub const C_OVERLAY_BG: Color = Color::Rgb(18, 18, 26);
pub const C_HEADING: Color = Color::Rgb(255, 184, 80);
pub const C_LINK: Color = Color::Rgb(80, 140, 200);
pub const C_CODE: Color = Color::Rgb(100, 160, 130);
pub const C_ROLE_USER: Color = Color::Rgb(80, 140, 200);
pub const C_ROLE_ASSISTANT: Color = Color::Rgb(180, 120, 220);
pub const C_ROLE_TOOL: Color = Color::Rgb(100, 160, 130);
pub const C_TOAST_INFO: Color = Color::Rgb(80, 160, 220);
pub const C_TOAST_SUCCESS: Color = Color::Rgb(80, 200, 120);
pub const C_TOAST_WARNING: Color = Color::Rgb(255, 184, 80);
pub const C_TOAST_ERROR: Color = Color::Rgb(255, 95, 95);
pub const C_MODE_NORMAL: Color = Color::Rgb(115, 115, 138);
pub const C_MODE_EDIT: Color = Color::Rgb(255, 200, 80);
pub const C_MODE_ALERT: Color = Color::Rgb(255, 95, 95);

// ── Predefined styles ─────────────────────────────────────────────────────────

pub fn style_error() -> Style {
    Style::default().fg(C_ERROR)
}

pub fn style_title() -> Style {
    Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn style_focused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER_FOCUSED)
}

pub fn style_unfocused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER)
}

pub fn style_muted() -> Style {
    Style::default().fg(C_MUTED)
}

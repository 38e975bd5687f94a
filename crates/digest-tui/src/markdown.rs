//! Markdown to ratatui lines, for channel summaries and query answers.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use crate::theme::{C_CODE, C_HEADING, C_LINK, C_MUTED, C_PRIMARY, C_SEPARATOR};

struct StyleStack {
    styles: Vec<Style>,
}

impl StyleStack {
    fn new() -> Self {
        Self {
            styles: vec![Style::default().fg(C_PRIMARY)],
        }
    }

    fn current(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push(&mut self, modifier: impl Fn(Style) -> Style) {
        let next = modifier(self.current());
        self.styles.push(next);
    }

    fn pop(&mut self) {
        if self.styles.len() > 1 {
            self.styles.pop();
        }
    }
}

/// Ordered lists count per nesting level; `None` marks a bullet list.
struct ListStack(Vec<Option<u64>>);

impl ListStack {
    fn marker(&mut self) -> String {
        let depth = self.0.len().saturating_sub(1);
        let indent = "  ".repeat(depth);
        match self.0.last_mut() {
            Some(Some(n)) => {
                let marker = format!("{}{}. ", indent, n);
                *n += 1;
                marker
            }
            _ => format!("{}• ", indent),
        }
    }
}

fn flush(lines: &mut Vec<Line<'static>>, current: &mut Vec<Span<'static>>) {
    if !current.is_empty() {
        lines.push(Line::from(std::mem::take(current)));
    }
}

pub fn render_markdown(text: &str) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut styles = StyleStack::new();
    let mut lists = ListStack(Vec::new());
    let mut in_code_block = false;

    for event in Parser::new(text) {
        match event {
            Event::Start(tag) => match tag {
                Tag::Heading { .. } => {
                    styles.push(|s| s.fg(C_HEADING).add_modifier(Modifier::BOLD));
                }
                Tag::BlockQuote(_) => {
                    styles.push(|s| s.fg(C_MUTED).add_modifier(Modifier::ITALIC));
                }
                Tag::CodeBlock(_) => {
                    flush(&mut lines, &mut current);
                    in_code_block = true;
                }
                Tag::List(start) => {
                    flush(&mut lines, &mut current);
                    lists.0.push(start);
                }
                Tag::Item => {
                    current.push(Span::styled(lists.marker(), Style::default().fg(C_MUTED)));
                }
                Tag::Emphasis => styles.push(|s| s.add_modifier(Modifier::ITALIC)),
                Tag::Strong => styles.push(|s| s.add_modifier(Modifier::BOLD)),
                Tag::Strikethrough => styles.push(|s| s.add_modifier(Modifier::CROSSED_OUT)),
                Tag::Link { .. } | Tag::Image { .. } => {
                    styles.push(|s| s.fg(C_LINK).add_modifier(Modifier::UNDERLINED));
                }
                _ => {}
            },
            Event::End(tag_end) => match tag_end {
                TagEnd::Paragraph => {
                    flush(&mut lines, &mut current);
                    if lists.0.is_empty() {
                        lines.push(Line::from(""));
                    }
                }
                TagEnd::Heading(_) | TagEnd::BlockQuote(_) => {
                    flush(&mut lines, &mut current);
                    lines.push(Line::from(""));
                    styles.pop();
                }
                TagEnd::CodeBlock => {
                    in_code_block = false;
                    lines.push(Line::from(""));
                }
                TagEnd::List(_) => {
                    flush(&mut lines, &mut current);
                    lists.0.pop();
                    if lists.0.is_empty() {
                        lines.push(Line::from(""));
                    }
                }
                TagEnd::Item => flush(&mut lines, &mut current),
                TagEnd::Emphasis
                | TagEnd::Strong
                | TagEnd::Strikethrough
                | TagEnd::Link
                | TagEnd::Image => styles.pop(),
                _ => {}
            },
            Event::Text(text) => {
                if in_code_block {
                    for line in text.lines() {
                        lines.push(Line::from(Span::styled(
                            format!("  {}", line),
                            Style::default().fg(C_CODE),
                        )));
                    }
                } else {
                    current.push(Span::styled(text.to_string(), styles.current()));
                }
            }
            Event::Code(code) => {
                current.push(Span::styled(code.to_string(), Style::default().fg(C_CODE)));
            }
            Event::SoftBreak => current.push(Span::styled(" ", styles.current())),
            Event::HardBreak => flush(&mut lines, &mut current),
            Event::Rule => {
                flush(&mut lines, &mut current);
                lines.push(Line::from(Span::styled(
                    "─".repeat(40),
                    Style::default().fg(C_SEPARATOR),
                )));
            }
            _ => {}
        }
    }
    flush(&mut lines, &mut current);

    while lines.last().map_or(false, |l| l.width() == 0) {
        lines.pop();
    }
    if lines.is_empty() && !text.trim().is_empty() {
        lines.push(Line::from(Span::styled(
            text.to_string(),
            Style::default().fg(C_PRIMARY),
        )));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_render_plain_text() {
        let lines = render_markdown("Quiet week, mostly release chatter.");
        assert_eq!(plain(&lines), vec!["Quiet week, mostly release chatter."]);
    }

    #[test]
    fn test_bold_keeps_text_and_sets_modifier() {
        let lines = render_markdown("**Key topics**");
        let span = &lines[0].spans[0];
        assert_eq!(span.content, "Key topics");
        assert!(span.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_bullets_and_numbers() {
        let lines = render_markdown("- alpha\n- beta\n\n1. one\n2. two\n");
        let text = plain(&lines);
        assert!(text.contains(&"• alpha".to_string()));
        assert!(text.contains(&"• beta".to_string()));
        assert!(text.contains(&"1. one".to_string()));
        assert!(text.contains(&"2. two".to_string()));
    }

    #[test]
    fn test_code_block_lines() {
        let lines = render_markdown("```sql\nSELECT 1;\nSELECT 2;\n```");
        let text = plain(&lines);
        assert_eq!(text, vec!["  SELECT 1;", "  SELECT 2;"]);
    }

    #[test]
    fn test_soft_break_joins_lines() {
        let lines = render_markdown("first\nsecond");
        assert_eq!(plain(&lines), vec!["first second"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(render_markdown("").is_empty());
    }
}

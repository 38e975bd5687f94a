//! Word wrapping for styled lines.
//!
//! Panes wrap their content up front so that one `Line` is one terminal row
//! and scroll limits can be taken from `Vec::len`.

use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Greedy word wrap to `width` columns. Words wider than a row are split by
/// character; whitespace at a break is dropped.
pub fn wrap_lines(lines: Vec<Line<'static>>, width: u16) -> Vec<Line<'static>> {
    let width = width.max(1) as usize;
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        if line.width() <= width {
            out.push(line);
        } else {
            wrap_line(line, width, &mut out);
        }
    }
    out
}

struct RowBuilder<'a> {
    template: &'a Line<'static>,
    spans: Vec<Span<'static>>,
    used: usize,
}

impl RowBuilder<'_> {
    fn push(&mut self, text: &str, span: &Span<'static>, w: usize) {
        self.spans.push(Span::styled(text.to_string(), span.style));
        self.used += w;
    }

    fn flush(&mut self, out: &mut Vec<Line<'static>>) {
        let mut row = Line::from(std::mem::take(&mut self.spans)).style(self.template.style);
        row.alignment = self.template.alignment;
        out.push(row);
        self.used = 0;
    }
}

fn wrap_line(line: Line<'static>, width: usize, out: &mut Vec<Line<'static>>) {
    let mut row = RowBuilder {
        template: &line,
        spans: Vec::new(),
        used: 0,
    };

    for span in &line.spans {
        for piece in pieces(&span.content) {
            let w = piece.width();
            if row.used + w <= width {
                row.push(piece, span, w);
                continue;
            }
            if piece.trim().is_empty() {
                row.flush(out);
                continue;
            }
            if w <= width {
                row.flush(out);
                row.push(piece, span, w);
                continue;
            }
            for ch in piece.chars() {
                let cw = ch.width().unwrap_or(0);
                if row.used + cw > width && row.used > 0 {
                    row.flush(out);
                }
                let mut buf = [0u8; 4];
                row.push(ch.encode_utf8(&mut buf), span, cw);
            }
        }
    }
    if !row.spans.is_empty() {
        row.flush(out);
    }
}

/// Split into alternating runs of whitespace and non-whitespace.
fn pieces(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_space = None;
    for (i, c) in text.char_indices() {
        let space = c.is_whitespace();
        if in_space.is_some_and(|s| s != space) {
            out.push(&text[start..i]);
            start = i;
        }
        in_space = Some(space);
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

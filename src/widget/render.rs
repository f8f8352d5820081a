use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use unicode_width::UnicodeWidthStr;

use super::CodeEditorWidget;
use crate::beautify::Beautifier;
use crate::ui::style::Theme;

/// Draw the bordered editor: gutter, highlighted text, placeholder, cursor.
pub(super) fn draw<B: Beautifier>(widget: &mut CodeEditorWidget<B>, frame: &mut Frame, area: Rect) {
    let theme = Theme::for_background(widget.options.background);
    let options = widget.options;
    let readonly = widget.readonly;

    let border_style = match widget.surface.as_ref() {
        _ if readonly => theme.border_readonly,
        Some(surface) if surface.is_focused() => theme.border_focused,
        _ => theme.border_unfocused,
    };
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    if readonly {
        block = block.title(" read-only ");
    }
    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let Some(surface) = widget.surface.as_ref() else {
        return;
    };
    let buffer = surface.buffer();
    let text = buffer.text();
    let total_lines = buffer.line_count();
    let cursor = buffer.cursor();
    let cursor_line_text = buffer.line_at(cursor.line).unwrap_or_default();
    let focused = surface.is_focused();
    let start = surface.scroll_offset();
    let brackets = if options.bracket_matching && focused {
        surface
            .matching_bracket()
            .map(|(a, b)| [buffer.char_position(a), buffer.char_position(b)])
    } else {
        None
    };
    let is_empty = buffer.len_chars() == 0;

    let gutter_width = if options.line_numbers {
        line_number_width(total_lines) + 1
    } else {
        0
    };
    let visible_rows = usize::from(inner.height);
    let end = (start + visible_rows).min(total_lines);
    let placeholder = widget.placeholder.clone();
    let highlighted = widget.highlighted_lines(&text);

    let mut content: Vec<Line> = Vec::with_capacity(end.saturating_sub(start));
    for line_idx in start..end {
        let mut spans = Vec::new();
        if options.line_numbers {
            let gutter_style = if focused && line_idx == cursor.line {
                theme.active_gutter
            } else {
                theme.gutter
            };
            spans.push(Span::styled(
                format!("{:>width$} ", line_idx + 1, width = usize::from(gutter_width - 1)),
                gutter_style,
            ));
        }

        let mut text_spans: Vec<Span<'static>> = highlighted
            .get(line_idx)
            .map(|line| {
                line.iter()
                    .map(|s| Span::styled(s.text.clone(), theme.style_for(s.category)))
                    .collect()
            })
            .unwrap_or_default();
        if let Some(pair) = brackets {
            for (line, col) in pair {
                if line == line_idx {
                    text_spans = patch_char(text_spans, col, theme.matching_bracket);
                }
            }
        }
        spans.extend(text_spans);

        let mut line = Line::from(spans);
        if focused && options.highlight_active_line && line_idx == cursor.line {
            line = line.style(theme.active_line);
        }
        content.push(line);
    }

    if is_empty && let Some(placeholder) = placeholder {
        let mut spans = Vec::new();
        if let Some(Line { spans: gutter, .. }) = content.first() {
            spans.extend(gutter.iter().take(usize::from(options.line_numbers)).cloned());
        }
        spans.push(Span::styled(placeholder, theme.placeholder));
        content = vec![Line::from(spans)];
    }

    frame.render_widget(Paragraph::new(content), inner);

    if focused && cursor.line >= start && cursor.line < end {
        let col = cursor.col.min(cursor_line_text.len());
        let text_width = u16::try_from(cursor_line_text[..col].width()).unwrap_or(u16::MAX);
        let row = u16::try_from(cursor.line - start).unwrap_or(u16::MAX);
        let x = inner
            .x
            .saturating_add(gutter_width)
            .saturating_add(text_width)
            .min(inner.right().saturating_sub(1));
        frame.set_cursor_position(Position::new(x, inner.y.saturating_add(row)));
    }
}

/// Calculate the width needed for line numbers.
pub const fn line_number_width(total_lines: usize) -> u16 {
    if total_lines < 10 {
        1
    } else if total_lines < 100 {
        2
    } else if total_lines < 1_000 {
        3
    } else if total_lines < 10_000 {
        4
    } else if total_lines < 100_000 {
        5
    } else {
        6
    }
}

/// Patch `style` onto the char at column `col` (in chars) of a span list.
fn patch_char(spans: Vec<Span<'static>>, col: usize, style: Style) -> Vec<Span<'static>> {
    let mut out = Vec::with_capacity(spans.len() + 2);
    let mut seen = 0usize;
    for span in spans {
        let len = span.content.chars().count();
        if col < seen || col >= seen + len {
            seen += len;
            out.push(span);
            continue;
        }
        let rel = col - seen;
        let content = span.content.as_ref();
        let (before, rest) = content.split_at(byte_index(content, rel));
        let (target, after) = rest.split_at(byte_index(rest, 1));
        if !before.is_empty() {
            out.push(Span::styled(before.to_string(), span.style));
        }
        out.push(Span::styled(target.to_string(), span.style.patch(style)));
        if !after.is_empty() {
            out.push(Span::styled(after.to_string(), span.style));
        }
        seen += len;
    }
    out
}

fn byte_index(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(i, _)| i)
}

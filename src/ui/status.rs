use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Model, ToastLevel};

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let position = model
        .widget
        .surface()
        .map(|surface| {
            let cursor = surface.buffer().cursor();
            format!(
                "Ln {}/{}",
                cursor.line + 1,
                surface.buffer().line_count()
            )
        })
        .unwrap_or_default();
    let mode = if model.widget.is_readonly() {
        " [read-only]"
    } else {
        ""
    };
    let hints = if model.widget.is_focused() {
        "Esc:blur  ^S:save  ^R:read-only  ^Q:quit"
    } else {
        "Enter:edit  ^S:save  ^R:read-only  Esc:quit"
    };

    let status = format!(" {position}{mode}  {hints}");
    let status_bar =
        Paragraph::new(status).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(status_bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let bar = Paragraph::new(format!(" {prefix} {message}")).style(style);
    frame.render_widget(bar, area);
}

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Model, ToastLevel};

use super::status;

/// Draw the whole screen: field label, the field, and the status bar.
pub fn render(model: &mut Model, frame: &mut Frame) {
    let area = frame.area();
    let [label_area, field_area, _, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(model.widget.desired_height()),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_label(model, frame, label_area);

    if let Err(err) = model.widget.render(frame, field_area) {
        model.show_toast(ToastLevel::Error, err.to_string());
    }

    if model.active_toast().is_some() {
        status::render_toast_bar(model, frame, status_area);
    } else {
        status::render_status_bar(model, frame, status_area);
    }
}

fn render_label(model: &Model, frame: &mut Frame, area: Rect) {
    let dirty = if model.is_dirty() { " [+]" } else { "" };
    let label = Line::from(vec![
        Span::styled("Template", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("  {}{dirty}", model.display_name())),
    ]);
    frame.render_widget(Paragraph::new(label), area);
}

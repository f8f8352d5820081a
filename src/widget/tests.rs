use std::cell::RefCell;
use std::rc::Rc;

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use super::{CodeEditorWidget, WidgetOptions};
use crate::beautify::{BeautifyError, beautify};
use crate::editor::SurfaceEvent;
use crate::error::Error;
use crate::form::{WidgetProps, aria_described_by_ids};

type Calls = Rc<RefCell<Vec<String>>>;

fn props(value: Option<&str>) -> (WidgetProps, Calls) {
    let calls: Calls = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&calls);
    let props = WidgetProps::new("root_template")
        .with_value(value)
        .with_on_change(move |v| sink.borrow_mut().push(v));
    (props, calls)
}

fn mounted(props: WidgetProps) -> CodeEditorWidget {
    let mut widget = CodeEditorWidget::new(props);
    widget.attach(Rect::new(0, 0, 40, 10));
    assert!(widget.mount().unwrap());
    widget
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn type_str<B: crate::beautify::Beautifier>(widget: &mut CodeEditorWidget<B>, s: &str) {
    for ch in s.chars() {
        widget.handle_key(key(KeyCode::Char(ch))).unwrap();
    }
}

fn row_text(terminal: &Terminal<TestBackend>, row: u16) -> String {
    let buffer = terminal.backend().buffer();
    (0..buffer.area.width)
        .map(|col| buffer[(col, row)].symbol())
        .collect()
}

// --- Mount ---

#[test]
fn test_mount_shows_beautified_value_without_callback() {
    let (props, calls) = props(Some("{{ x }}"));
    let widget = mounted(props);
    assert_eq!(widget.document().as_deref(), Some(beautify("{{ x }}").as_str()));
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_mount_reformats_unformatted_value_silently() {
    let (props, calls) = props(Some("{%if a%}\n{{b}}\n{%endif%}"));
    let widget = mounted(props);
    assert_eq!(
        widget.document().as_deref(),
        Some("{% if a %}\n  {{ b }}\n{% endif %}")
    );
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_mount_with_no_value_is_empty_and_editable() {
    let (props, calls) = props(None);
    let mut widget = mounted(props);
    assert_eq!(widget.document().as_deref(), Some(""));
    assert!(calls.borrow().is_empty());
    assert!(widget.surface().is_some_and(crate::editor::EditorSurface::is_editable));

    type_str(&mut widget, "a");
    assert_eq!(*calls.borrow(), vec!["a".to_string()]);
}

#[test]
fn test_mount_without_container_does_nothing() {
    let (props, _calls) = props(Some("x"));
    let mut widget = CodeEditorWidget::new(props);
    assert!(!widget.mount().unwrap());
    assert!(!widget.is_mounted());
}

#[test]
fn test_mount_without_callback_does_nothing() {
    let mut widget = CodeEditorWidget::new(WidgetProps::new("f").with_value(Some("x")));
    widget.attach(Rect::new(0, 0, 20, 5));
    assert!(!widget.mount().unwrap());
    assert!(!widget.is_mounted());
    assert_eq!(widget.container().map(|c| c.live_surfaces()), Some(0));
}

#[test]
fn test_mount_twice_is_noop() {
    let (props, _calls) = props(Some("x"));
    let mut widget = mounted(props);
    assert!(!widget.mount().unwrap());
    assert_eq!(widget.container().map(|c| c.live_surfaces()), Some(1));
}

#[test]
fn test_autofocus_focuses_at_start() {
    let (props, _calls) = props(Some("{{ x }}"));
    let widget = mounted(props.with_autofocus(true));
    assert!(widget.is_focused());
    assert_eq!(widget.anchor(), Some(0));
}

#[test]
fn test_no_autofocus_leaves_surface_unfocused() {
    let (props, _calls) = props(Some("{{ x }}"));
    let widget = mounted(props);
    assert!(!widget.is_focused());
}

#[test]
fn test_mount_propagates_beautifier_error() {
    let (props, calls) = props(Some("boom"));
    let failing = |s: &str| -> Result<String, BeautifyError> {
        if s.contains("boom") {
            Err(BeautifyError::new("unbalanced"))
        } else {
            Ok(s.to_string())
        }
    };
    let mut widget = CodeEditorWidget::with_beautifier(props, failing);
    widget.attach(Rect::new(0, 0, 20, 5));
    let err = widget.mount().unwrap_err();
    assert!(matches!(err, Error::Beautify(_)));
    assert!(!widget.is_mounted());
    assert!(calls.borrow().is_empty());
}

// --- Edits ---

#[test]
fn test_edit_reports_beautified_value_and_rewrites_document() {
    let (props, calls) = props(None);
    let mut widget = mounted(props);
    widget.handle_paste("{{x}}").unwrap();
    assert_eq!(*calls.borrow(), vec!["{{ x }}".to_string()]);
    assert_eq!(widget.document().as_deref(), Some("{{ x }}"));
    assert_eq!(widget.value(), "{{ x }}");
}

#[test]
fn test_edits_are_reported_in_order() {
    let (props, calls) = props(None);
    let mut widget = mounted(props);
    type_str(&mut widget, "ab");
    assert_eq!(*calls.borrow(), vec!["a".to_string(), "ab".to_string()]);
}

#[test]
fn test_change_equal_to_reported_value_is_suppressed() {
    let (props, calls) = props(Some("{{ x }}"));
    let mut widget = mounted(props);
    widget.set_anchor(7);

    // Trailing whitespace is stripped, so the beautified text is unchanged.
    let event = widget.handle_key(key(KeyCode::Char(' '))).unwrap();
    assert_eq!(event, SurfaceEvent::Changed);
    assert!(calls.borrow().is_empty());
    assert_eq!(widget.document().as_deref(), Some("{{ x }}"));
}

#[test]
fn test_repeated_change_notification_reports_once() {
    let (props, calls) = props(Some("{{ x }}"));
    let mut widget = mounted(props);
    widget.set_anchor(7);
    type_str(&mut widget, "y");
    widget.document_changed().unwrap();
    widget.document_changed().unwrap();
    assert_eq!(*calls.borrow(), vec!["{{ x }}y".to_string()]);
}

#[test]
fn test_reported_value_matches_displayed_document() {
    let (props, calls) = props(None);
    let mut widget = mounted(props);
    widget.handle_paste("{%if a%}\n{{b}}").unwrap();
    widget.handle_key(key(KeyCode::End)).unwrap();
    widget.handle_key(key(KeyCode::Enter)).unwrap();
    widget.handle_paste("{%endif%}").unwrap();
    let last = calls.borrow().last().cloned().unwrap();
    assert_eq!(last, "{% if a %}\n  {{ b }}\n{% endif %}");
    assert_eq!(widget.document().as_deref(), Some(last.as_str()));
    assert_eq!(widget.value(), last);
}

#[test]
fn test_edit_error_propagates_and_keeps_typed_text() {
    let (props, calls) = props(Some("x"));
    let failing = |s: &str| -> Result<String, BeautifyError> {
        if s.contains("boom") {
            Err(BeautifyError::new("unbalanced"))
        } else {
            Ok(s.to_string())
        }
    };
    let mut widget = CodeEditorWidget::with_beautifier(props, failing);
    widget.attach(Rect::new(0, 0, 20, 5));
    widget.mount().unwrap();

    assert!(widget.handle_paste("boom").is_err());
    assert_eq!(widget.document().as_deref(), Some("boomx"));
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_malformed_template_is_not_an_error() {
    let (props, calls) = props(None);
    let mut widget = mounted(props);
    widget.handle_paste("{% if x").unwrap();
    assert_eq!(*calls.borrow(), vec!["{% if x".to_string()]);
}

// --- Read-only ---

#[test]
fn test_readonly_rejects_input() {
    let (props, calls) = props(Some("{{ x }}"));
    let mut widget = mounted(props.with_readonly(true));

    assert_eq!(
        widget.handle_key(key(KeyCode::Char('a'))).unwrap(),
        SurfaceEvent::Ignored
    );
    assert_eq!(widget.handle_paste("zzz").unwrap(), SurfaceEvent::Ignored);
    assert_eq!(
        widget.handle_key(key(KeyCode::Backspace)).unwrap(),
        SurfaceEvent::Ignored
    );
    assert_eq!(widget.document().as_deref(), Some("{{ x }}"));
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_readonly_still_moves_cursor() {
    let (props, _calls) = props(Some("{{ x }}"));
    let mut widget = mounted(props.with_readonly(true));
    assert_eq!(widget.handle_key(key(KeyCode::End)).unwrap(), SurfaceEvent::Moved);
    assert_eq!(widget.anchor(), Some(7));
}

// --- Anchor ---

#[test]
fn test_anchor_is_clamped_after_shortening_reformat() {
    let (props, calls) = props(Some("{{ foo }}{{ bar }}"));
    let shorten = |s: &str| -> Result<String, BeautifyError> {
        if s.chars().count() > 18 {
            Ok("{{ ab }}".to_string())
        } else {
            Ok(s.to_string())
        }
    };
    let mut widget = CodeEditorWidget::with_beautifier(props, shorten);
    widget.attach(Rect::new(0, 0, 40, 10));
    widget.mount().unwrap();
    widget.set_anchor(10);

    type_str(&mut widget, "x");

    assert_eq!(*calls.borrow(), vec!["{{ ab }}".to_string()]);
    assert_eq!(widget.document().as_deref(), Some("{{ ab }}"));
    assert_eq!(widget.anchor(), Some(8));
}

#[test]
fn test_anchor_survives_reformat() {
    let (props, _calls) = props(None);
    let mut widget = mounted(props);
    widget.handle_paste("{{x}}").unwrap();
    // Cursor was after the 5 pasted chars.
    assert_eq!(widget.remembered_anchor(), Some(5));
    assert_eq!(widget.anchor(), Some(5));
}

#[test]
fn test_focus_survives_reformat() {
    let (props, _calls) = props(None);
    let mut widget = mounted(props.with_autofocus(false));
    widget.focus();
    widget.handle_paste("{{x}}").unwrap();
    assert!(widget.is_focused());
}

#[test]
fn test_autofocus_restores_remembered_anchor_on_remount() {
    let (props, _calls) = props(Some("{{ foo }}"));
    let mut widget = mounted(props.with_autofocus(true));
    widget.set_anchor(4);
    type_str(&mut widget, "x");
    widget.unmount();
    widget.mount().unwrap();
    assert!(widget.is_focused());
    assert_eq!(widget.anchor(), Some(5));
}

// --- Props updates ---

#[test]
fn test_set_props_with_same_value_keeps_surface() {
    let (p, _calls) = props(Some("{{ x }}"));
    let mut widget = mounted(p);
    widget.set_anchor(3);
    let (next, _) = props(Some("{{ x }}"));
    widget.set_props(next).unwrap();
    assert_eq!(widget.anchor(), Some(3));
}

#[test]
fn test_set_props_with_new_value_rebuilds() {
    let (p, calls) = props(Some("{{ long_name }}"));
    let mut widget = mounted(p);
    widget.set_anchor(12);
    let (next, _) = props(Some("{{y}}"));
    widget.set_props(next).unwrap();
    assert_eq!(widget.document().as_deref(), Some("{{ y }}"));
    assert_eq!(widget.anchor(), Some(7));
    assert_eq!(widget.container().map(|c| c.live_surfaces()), Some(1));
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_set_props_with_new_id_keeps_anchor() {
    let (p, _calls) = props(Some("{{ x }}"));
    let mut widget = mounted(p);
    widget.set_anchor(4);
    let (next, _) = props(Some("{{ x }}"));
    let next = WidgetProps {
        id: "root_other".to_string(),
        ..next
    };
    widget.set_props(next).unwrap();
    assert_eq!(widget.container().map(|c| c.id()), Some("root_other"));
    assert_eq!(widget.anchor(), Some(4));
}

#[test]
fn test_set_props_readonly_toggle_rebuilds() {
    let (p, _calls) = props(Some("x"));
    let mut widget = mounted(p);
    let (next, _) = props(Some("x"));
    widget.set_props(next.with_readonly(true)).unwrap();
    assert!(widget.is_readonly());
    assert!(widget.surface().is_some_and(|s| !s.is_editable()));
}

#[test]
fn test_set_props_uses_new_callback() {
    let (p, first) = props(None);
    let mut widget = mounted(p);
    let (next, second) = props(None);
    widget.set_props(next).unwrap();
    type_str(&mut widget, "a");
    assert!(first.borrow().is_empty());
    assert_eq!(*second.borrow(), vec!["a".to_string()]);
}

#[test]
fn test_set_props_mounts_when_callback_arrives() {
    let mut widget = CodeEditorWidget::new(WidgetProps::new("root_template"));
    widget.attach(Rect::new(0, 0, 20, 5));
    assert!(!widget.mount().unwrap());
    let (p, _calls) = props(Some("x"));
    widget.set_props(p).unwrap();
    assert!(widget.is_mounted());
}

// --- Teardown ---

#[test]
fn test_remounting_keeps_single_listener() {
    let (props, calls) = props(Some("{{ x }}"));
    let mut widget = mounted(props);
    for _ in 0..2 {
        widget.unmount();
        assert_eq!(widget.container().map(|c| c.live_surfaces()), Some(0));
        widget.mount().unwrap();
        assert_eq!(widget.container().map(|c| c.live_surfaces()), Some(1));
    }

    widget.set_anchor(7);
    type_str(&mut widget, "y");
    assert_eq!(calls.borrow().len(), 1);
    assert_eq!(widget.container().map(|c| c.live_surfaces()), Some(1));
}

#[test]
fn test_reformat_releases_old_surface() {
    let (props, _calls) = props(None);
    let mut widget = mounted(props);
    widget.handle_paste("{{x}}").unwrap();
    assert_eq!(widget.container().map(|c| c.live_surfaces()), Some(1));
}

#[test]
fn test_events_after_unmount_are_ignored() {
    let (props, calls) = props(Some("x"));
    let mut widget = mounted(props);
    widget.unmount();
    assert_eq!(
        widget.handle_key(key(KeyCode::Char('a'))).unwrap(),
        SurfaceEvent::Ignored
    );
    assert!(calls.borrow().is_empty());
}

// --- Events ---

#[test]
fn test_handle_event_ignores_key_release() {
    let (props, calls) = props(None);
    let mut widget = mounted(props);
    let release = Event::Key(KeyEvent::new_with_kind(
        KeyCode::Char('a'),
        KeyModifiers::NONE,
        KeyEventKind::Release,
    ));
    assert_eq!(widget.handle_event(&release).unwrap(), SurfaceEvent::Ignored);
    let paste = Event::Paste("{{a}}".to_string());
    assert_eq!(widget.handle_event(&paste).unwrap(), SurfaceEvent::Changed);
    assert_eq!(*calls.borrow(), vec!["{{ a }}".to_string()]);
}

fn mouse(kind: MouseEventKind) -> Event {
    Event::Mouse(MouseEvent {
        kind,
        column: 5,
        row: 3,
        modifiers: KeyModifiers::NONE,
    })
}

#[test]
fn test_mouse_wheel_scrolls_readonly_field() {
    let text = (0..20).map(|i| format!("l{i}")).collect::<Vec<_>>().join("\n");
    let (props, calls) = props(Some(&text));
    let mut widget = CodeEditorWidget::new(props.with_readonly(true));
    let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
    let mut draw = |widget: &mut CodeEditorWidget| {
        terminal
            .draw(|frame| {
                let area = frame.area();
                widget.render(frame, area).unwrap();
            })
            .unwrap();
    };
    draw(&mut widget);

    let down = mouse(MouseEventKind::ScrollDown);
    assert_eq!(widget.handle_event(&down).unwrap(), SurfaceEvent::Moved);
    draw(&mut widget);
    assert_eq!(widget.surface().map(|s| s.scroll_offset()), Some(3));
    assert_eq!(widget.anchor(), Some(0));
    assert!(row_text(&terminal, 1).contains("l3"));

    let up = mouse(MouseEventKind::ScrollUp);
    assert_eq!(widget.handle_event(&up).unwrap(), SurfaceEvent::Moved);
    assert_eq!(widget.handle_event(&up).unwrap(), SurfaceEvent::Ignored);
    assert_eq!(widget.surface().map(|s| s.scroll_offset()), Some(0));
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_mouse_moves_are_ignored() {
    let (props, _calls) = props(Some("a\nb"));
    let mut widget = mounted(props);
    let moved = mouse(MouseEventKind::Moved);
    assert_eq!(widget.handle_event(&moved).unwrap(), SurfaceEvent::Ignored);
}

// --- Rendering ---

#[test]
fn test_render_mounts_and_carries_accessibility_attributes() {
    let (props, _calls) = props(Some("{{ x }}"));
    let mut widget = CodeEditorWidget::new(props);
    let mut terminal = Terminal::new(TestBackend::new(30, 6)).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            widget.render(frame, area).unwrap();
        })
        .unwrap();

    assert!(widget.is_mounted());
    let container = widget.container().unwrap();
    assert_eq!(container.id(), "root_template");
    assert_eq!(
        container.aria_describedby(),
        aria_described_by_ids("root_template", false)
    );
    assert_eq!(container.area(), Rect::new(0, 0, 30, 6));
}

#[test]
fn test_render_shows_line_numbers_and_text() {
    let (props, _calls) = props(Some("{% if a %}\nhi\n{% endif %}"));
    let mut widget = CodeEditorWidget::new(props);
    let mut terminal = Terminal::new(TestBackend::new(30, 6)).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            widget.render(frame, area).unwrap();
        })
        .unwrap();

    assert!(row_text(&terminal, 1).contains("1 {% if a %}"));
    assert!(row_text(&terminal, 2).contains("2   hi"));
    assert!(row_text(&terminal, 3).contains("3 {% endif %}"));
}

#[test]
fn test_render_without_line_numbers() {
    let (props, _calls) = props(Some("hi"));
    let options = WidgetOptions {
        line_numbers: false,
        ..WidgetOptions::default()
    };
    let mut widget = CodeEditorWidget::new(props).with_options(options);
    let mut terminal = Terminal::new(TestBackend::new(20, 4)).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            widget.render(frame, area).unwrap();
        })
        .unwrap();
    assert!(row_text(&terminal, 1).starts_with("│hi"));
}

#[test]
fn test_render_placeholder_when_empty() {
    let (props, _calls) = props(None);
    let mut widget = CodeEditorWidget::new(props.with_placeholder("Enter a template"));
    let mut terminal = Terminal::new(TestBackend::new(30, 4)).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            widget.render(frame, area).unwrap();
        })
        .unwrap();
    assert!(row_text(&terminal, 1).contains("Enter a template"));
}

#[test]
fn test_render_readonly_title() {
    let (props, _calls) = props(Some("x"));
    let mut widget = CodeEditorWidget::new(props.with_readonly(true));
    let mut terminal = Terminal::new(TestBackend::new(30, 4)).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            widget.render(frame, area).unwrap();
        })
        .unwrap();
    assert!(row_text(&terminal, 0).contains("read-only"));
}

#[test]
fn test_render_places_cursor_when_focused() {
    let (props, _calls) = props(Some("{{ x }}"));
    let mut widget = CodeEditorWidget::new(props.with_autofocus(true));
    let mut terminal = Terminal::new(TestBackend::new(30, 6)).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            widget.render(frame, area).unwrap();
        })
        .unwrap();
    widget.handle_key(key(KeyCode::End)).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            widget.render(frame, area).unwrap();
        })
        .unwrap();

    // Border (1) + gutter "1 " (2) + 7 chars.
    let position = terminal.get_cursor_position().unwrap();
    assert_eq!((position.x, position.y), (10, 1));
}

#[test]
fn test_desired_height_includes_border() {
    let (props, _calls) = props(None);
    let widget = CodeEditorWidget::new(props);
    assert_eq!(widget.desired_height(), WidgetOptions::default().height + 2);
}

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};

use crate::app::{App, Message, Model};

impl App {
    pub(super) fn handle_event(event: &Event, model: &Model) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Release => None,
            Event::Key(key) => Self::handle_key(*key, model),
            Event::Paste(_) if model.widget.is_focused() => Some(Message::Input(event.clone())),
            Event::Mouse(mouse) => Self::handle_mouse(*mouse),
            Event::Resize(..) => Some(Message::Redraw),
            _ => None,
        }
    }

    pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let focused = model.widget.is_focused();
        match key.code {
            KeyCode::Char('q' | 'c') if ctrl => Some(Message::Quit),
            KeyCode::Char('s') if ctrl => Some(Message::Save),
            KeyCode::Char('r') if ctrl => Some(Message::ToggleReadonly),
            KeyCode::Esc if focused => Some(Message::Blur),
            KeyCode::Esc => Some(Message::Quit),
            KeyCode::Enter | KeyCode::Tab if !focused => Some(Message::Focus),
            _ if focused => Some(Message::Input(Event::Key(key))),
            _ => None,
        }
    }

    /// The wheel scrolls the field whether or not it has focus.
    pub(super) fn handle_mouse(mouse: MouseEvent) -> Option<Message> {
        match mouse.kind {
            MouseEventKind::ScrollDown | MouseEventKind::ScrollUp => {
                Some(Message::Input(Event::Mouse(mouse)))
            }
            _ => None,
        }
    }
}

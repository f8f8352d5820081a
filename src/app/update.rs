use crossterm::event::Event;
use tracing::debug;

use crate::app::{Model, ToastLevel};

/// All possible events and actions in the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Key press or paste routed to the field
    Input(Event),
    /// Give the field keyboard focus
    Focus,
    /// Take keyboard focus away from the field
    Blur,
    /// Flip the field between editable and read-only
    ToggleReadonly,
    /// Write the value back to the file
    Save,
    /// Terminal resized; redraw
    Redraw,
    /// Quit the application
    Quit,
}

/// Apply a message to the model.
///
/// File writes happen afterwards in the side-effect pass.
pub fn update(mut model: Model, msg: Message) -> Model {
    match msg {
        Message::Input(event) => {
            if let Err(err) = model.widget.handle_event(&event) {
                model.show_toast(ToastLevel::Error, err.to_string());
            }
        }
        Message::Focus => model.widget.focus(),
        Message::Blur => model.widget.blur(),
        Message::ToggleReadonly => {
            let readonly = !model.widget.is_readonly();
            let props = model.props(readonly);
            match model.widget.set_props(props) {
                Ok(()) => {
                    debug!(readonly, "toggled read-only");
                    let label = if readonly { "Read-only" } else { "Editable" };
                    model.show_toast(ToastLevel::Info, label);
                }
                Err(err) => model.show_toast(ToastLevel::Error, err.to_string()),
            }
        }
        Message::Quit => model.should_quit = true,
        Message::Save | Message::Redraw => {}
    }
    model
}

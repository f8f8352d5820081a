use tracing::warn;

use crate::app::{App, Message, Model, ToastLevel};

impl App {
    pub(super) fn handle_message_side_effects(model: &mut Model, msg: &Message) {
        if *msg == Message::Save {
            match model.save() {
                Ok(path) => model.show_toast(ToastLevel::Info, format!("Saved {}", path.display())),
                Err(err) => {
                    warn!("save failed: {err:#}");
                    model.show_toast(ToastLevel::Error, format!("Save failed: {err:#}"));
                }
            }
        }
    }
}

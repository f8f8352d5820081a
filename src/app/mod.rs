//! Terminal host for a single template field.
//!
//! This module follows The Elm Architecture (TEA):
//! - [`Model`]: the field widget plus the form value it reports into
//! - [`Message`]: all possible events and actions
//! - [`update`]: state transitions
//! - [`App::run`]: main event loop with rendering

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{FIELD_ID, Model, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;

use crate::widget::WidgetOptions;

/// Owns the terminal and runs the event loop.
pub struct App {
    file_path: Option<PathBuf>,
    readonly: bool,
    autofocus: bool,
    options: WidgetOptions,
}

impl App {
    /// Create an application editing `file_path`, or an empty field.
    pub fn new(file_path: Option<PathBuf>) -> Self {
        Self {
            file_path,
            readonly: false,
            autofocus: true,
            options: WidgetOptions::default(),
        }
    }

    pub const fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    /// Focus the field when it mounts.
    pub const fn with_autofocus(mut self, autofocus: bool) -> Self {
        self.autofocus = autofocus;
        self
    }

    pub const fn with_options(mut self, options: WidgetOptions) -> Self {
        self.options = options;
        self
    }
}

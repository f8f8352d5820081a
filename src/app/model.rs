use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::form::WidgetProps;
use crate::widget::{CodeEditorWidget, WidgetOptions};

/// Id of the single field the demo host renders.
pub const FIELD_ID: &str = "root_template";

const PLACEHOLDER: &str = "Enter a Jinja template";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// The complete application state.
///
/// The field value lives in a shared cell the change callback writes to,
/// the way a form keeps its data outside the widget.
pub struct Model {
    pub file_path: Option<PathBuf>,
    pub widget: CodeEditorWidget,
    pub should_quit: bool,
    value: Rc<RefCell<String>>,
    saved: String,
    autofocus: bool,
    toast: Option<Toast>,
}

impl Model {
    pub fn new(
        file_path: Option<PathBuf>,
        text: Option<String>,
        readonly: bool,
        autofocus: bool,
        options: WidgetOptions,
    ) -> Self {
        let saved = text.clone().unwrap_or_default();
        let value = Rc::new(RefCell::new(saved.clone()));
        let props = field_props(&value, text, readonly, autofocus);
        Self {
            file_path,
            widget: CodeEditorWidget::new(props).with_options(options),
            should_quit: false,
            value,
            saved,
            autofocus,
            toast: None,
        }
    }

    /// The latest value reported by the field.
    pub fn value(&self) -> String {
        self.value.borrow().clone()
    }

    /// Whether the value differs from what was loaded or last saved.
    pub fn is_dirty(&self) -> bool {
        *self.value.borrow() != self.saved
    }

    /// Props for the field as the form would pass them now.
    pub(super) fn props(&self, readonly: bool) -> WidgetProps {
        field_props(
            &self.value,
            Some(self.value()),
            readonly,
            self.autofocus,
        )
    }

    /// Write the value to the file it was loaded from.
    pub(super) fn save(&mut self) -> Result<PathBuf> {
        let path = self
            .file_path
            .clone()
            .context("No file to save to; pass a FILE argument")?;
        let value = self.value();
        std::fs::write(&path, &value)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        self.saved = value;
        Ok(path)
    }

    pub fn display_name(&self) -> String {
        self.file_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map_or_else(|| "untitled".to_string(), |s| s.to_string_lossy().to_string())
    }

    pub fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + Duration::from_secs(4),
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new(None, None, false, true, WidgetOptions::default())
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("file_path", &self.file_path)
            .field("widget", &self.widget)
            .field("should_quit", &self.should_quit)
            .field("value", &self.value.borrow())
            .field("toast", &self.toast)
            .finish_non_exhaustive()
    }
}

fn field_props(
    value: &Rc<RefCell<String>>,
    text: Option<String>,
    readonly: bool,
    autofocus: bool,
) -> WidgetProps {
    let sink = Rc::clone(value);
    WidgetProps::new(FIELD_ID)
        .with_value(text)
        .with_readonly(readonly)
        .with_autofocus(autofocus)
        .with_placeholder(PLACEHOLDER)
        .with_on_change(move |v| *sink.borrow_mut() = v)
}

//! The contract with the surrounding schema-form framework.
//!
//! The form owns field state and validation. It hands a widget a
//! [`WidgetProps`] for one field and receives updated values through the
//! [`ChangeCallback`]. Ids for the field's error, description and help
//! elements follow the form's naming scheme so labels stay associated.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use ratatui::layout::Rect;

/// Receives the field's new value after every distinct change.
pub type ChangeCallback = Box<dyn FnMut(String)>;

/// Everything the form passes to a widget for one field.
pub struct WidgetProps {
    /// Element id of the field.
    pub id: String,
    /// Current field value; `None` when the form has no value yet.
    pub value: Option<String>,
    pub readonly: bool,
    pub autofocus: bool,
    /// Text shown while the field is empty.
    pub placeholder: Option<String>,
    pub on_change: Option<ChangeCallback>,
}

impl WidgetProps {
    /// Props for a field with no value and no callback.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: None,
            readonly: false,
            autofocus: false,
            placeholder: None,
            on_change: None,
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: Option<impl Into<String>>) -> Self {
        self.value = value.map(Into::into);
        self
    }

    #[must_use]
    pub const fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    #[must_use]
    pub const fn with_autofocus(mut self, autofocus: bool) -> Self {
        self.autofocus = autofocus;
        self
    }

    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    #[must_use]
    pub fn with_on_change(mut self, on_change: impl FnMut(String) + 'static) -> Self {
        self.on_change = Some(Box::new(on_change));
        self
    }
}

impl fmt::Debug for WidgetProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetProps")
            .field("id", &self.id)
            .field("value", &self.value)
            .field("readonly", &self.readonly)
            .field("autofocus", &self.autofocus)
            .field("placeholder", &self.placeholder)
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

/// Id of the element holding the field's validation errors.
pub fn error_id(id: &str) -> String {
    format!("{id}__error")
}

/// Id of the element holding the field's description.
pub fn description_id(id: &str) -> String {
    format!("{id}__description")
}

/// Id of the element holding the field's help text.
pub fn help_id(id: &str) -> String {
    format!("{id}__help")
}

/// Id of the element listing the field's schema examples.
pub fn examples_id(id: &str) -> String {
    format!("{id}__examples")
}

/// The `aria-describedby` value for a field: its error, description and
/// help ids, plus the examples id when requested.
pub fn aria_described_by_ids(id: &str, include_examples: bool) -> String {
    let mut ids = vec![error_id(id), description_id(id), help_id(id)];
    if include_examples {
        ids.push(examples_id(id));
    }
    ids.join(" ")
}

/// The root element a widget renders into.
///
/// Carries the field's id and described-by attribute, the screen area
/// assigned on the last render, and a count of editing surfaces currently
/// attached to it.
#[derive(Debug)]
pub struct Container {
    id: String,
    aria_describedby: String,
    area: Rect,
    live_surfaces: Rc<Cell<usize>>,
}

impl Container {
    /// Create the container for a field, computing its described-by value.
    pub fn new(id: &str, area: Rect) -> Self {
        Self {
            id: id.to_string(),
            aria_describedby: aria_described_by_ids(id, false),
            area,
            live_surfaces: Rc::new(Cell::new(0)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn aria_describedby(&self) -> &str {
        &self.aria_describedby
    }

    pub const fn area(&self) -> Rect {
        self.area
    }

    pub const fn set_area(&mut self, area: Rect) {
        self.area = area;
    }

    /// Number of editing surfaces currently attached.
    pub fn live_surfaces(&self) -> usize {
        self.live_surfaces.get()
    }

    pub(crate) fn attach(&self) -> Attachment {
        self.live_surfaces.set(self.live_surfaces.get() + 1);
        Attachment {
            live_surfaces: Rc::clone(&self.live_surfaces),
        }
    }
}

/// A surface's registration with its container; released on drop.
#[derive(Debug)]
pub struct Attachment {
    live_surfaces: Rc<Cell<usize>>,
}

impl Drop for Attachment {
    fn drop(&mut self) {
        self.live_surfaces
            .set(self.live_surfaces.get().saturating_sub(1));
    }
}

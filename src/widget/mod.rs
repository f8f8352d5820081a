//! The Jinja code editor form widget.
//!
//! [`CodeEditorWidget`] binds one form field's string value to one
//! [`EditorSurface`]:
//! - On mount the field value is beautified and loaded into a new surface.
//! - Every document change is beautified, reported through the field's
//!   change callback when it differs from the last reported value, and
//!   written back so the display always matches the reported value.
//! - Changing the value or read-only flag from outside releases the surface
//!   and creates a new one; the cursor offset is carried across.
//!
//! The widget mounts lazily: the first [`CodeEditorWidget::render`] gives it
//! a [`Container`], and a surface is only created once both a container and a
//! change callback exist.

mod render;

use crossterm::event::{Event, KeyEvent, KeyEventKind, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::Rect;
use tracing::{debug, trace};

use crate::beautify::{Beautifier, JinjaBeautifier};
use crate::editor::{EditorSurface, SurfaceConfig, SurfaceEvent};
use crate::error::Result;
use crate::form::{ChangeCallback, Container, WidgetProps};
use crate::highlight::HighlightSpan;
use crate::ui::style::Background;

pub use render::line_number_width;

/// Lines scrolled per mouse wheel notch.
const WHEEL_LINES: isize = 3;

/// Presentation options that the form does not control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetOptions {
    /// Text rows inside the border.
    pub height: u16,
    pub line_numbers: bool,
    pub highlight_active_line: bool,
    pub bracket_matching: bool,
    pub close_brackets: bool,
    pub background: Background,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            height: 12,
            line_numbers: true,
            highlight_active_line: true,
            bracket_matching: true,
            close_brackets: true,
            background: Background::Light,
        }
    }
}

/// Form widget editing a Jinja template string.
pub struct CodeEditorWidget<B = JinjaBeautifier> {
    id: String,
    readonly: bool,
    autofocus: bool,
    placeholder: Option<String>,
    on_change: Option<ChangeCallback>,
    /// Last value received from the form or reported to it.
    reported: String,
    /// Cursor offset carried across surface reconstruction.
    anchor: Option<usize>,
    container: Option<Container>,
    surface: Option<EditorSurface>,
    beautifier: B,
    options: WidgetOptions,
    highlight_cache: Option<(String, Vec<Vec<HighlightSpan>>)>,
}

impl CodeEditorWidget<JinjaBeautifier> {
    /// Create a widget for a field using the default beautifier.
    pub fn new(props: WidgetProps) -> Self {
        Self::with_beautifier(props, JinjaBeautifier::new())
    }
}

impl<B: Beautifier> CodeEditorWidget<B> {
    /// Create a widget for a field with a custom beautifier.
    pub fn with_beautifier(props: WidgetProps, beautifier: B) -> Self {
        Self {
            id: props.id,
            readonly: props.readonly,
            autofocus: props.autofocus,
            placeholder: props.placeholder,
            on_change: props.on_change,
            reported: props.value.unwrap_or_default(),
            anchor: None,
            container: None,
            surface: None,
            beautifier,
            options: WidgetOptions::default(),
            highlight_cache: None,
        }
    }

    #[must_use]
    pub const fn with_options(mut self, options: WidgetOptions) -> Self {
        self.options = options;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn options(&self) -> WidgetOptions {
        self.options
    }

    /// Rows the widget wants, including its border.
    pub const fn desired_height(&self) -> u16 {
        self.options.height.saturating_add(2)
    }

    /// The last value received from or reported to the form.
    pub fn value(&self) -> &str {
        &self.reported
    }

    /// The displayed document, if mounted.
    pub fn document(&self) -> Option<String> {
        self.surface.as_ref().map(EditorSurface::text)
    }

    pub const fn surface(&self) -> Option<&EditorSurface> {
        self.surface.as_ref()
    }

    pub const fn container(&self) -> Option<&Container> {
        self.container.as_ref()
    }

    pub const fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    pub const fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// The cursor offset remembered for the next reconstruction.
    pub const fn remembered_anchor(&self) -> Option<usize> {
        self.anchor
    }

    /// The live cursor offset, if mounted.
    pub fn anchor(&self) -> Option<usize> {
        self.surface.as_ref().map(EditorSurface::anchor)
    }

    /// Move the cursor of the live surface.
    pub fn set_anchor(&mut self, offset: usize) {
        if let Some(surface) = self.surface.as_mut() {
            surface.set_anchor(offset);
        }
    }

    pub fn is_focused(&self) -> bool {
        self.surface.as_ref().is_some_and(EditorSurface::is_focused)
    }

    pub fn focus(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.focus();
        }
    }

    pub fn blur(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.blur();
        }
    }

    /// Give the widget a container occupying `area`.
    ///
    /// [`render`](Self::render) does this on every frame; hosts that mount
    /// before the first frame call it directly.
    pub fn attach(&mut self, area: Rect) {
        match self.container.as_mut() {
            Some(container) => container.set_area(area),
            None => self.container = Some(Container::new(&self.id, area)),
        }
    }

    /// Create the editing surface from the current field value.
    ///
    /// Returns `Ok(false)` without doing anything when already mounted, or
    /// when the container or change callback is missing.
    ///
    /// # Errors
    ///
    /// Propagates beautifier failures.
    pub fn mount(&mut self) -> Result<bool> {
        if self.surface.is_some() {
            return Ok(false);
        }
        if self.container.is_none() || self.on_change.is_none() {
            debug!(
                id = %self.id,
                container = self.container.is_some(),
                callback = self.on_change.is_some(),
                "mount skipped"
            );
            return Ok(false);
        }
        let text = self.beautifier.beautify(&self.reported)?;
        Ok(self.create_surface(&text, false))
    }

    /// Release the editing surface. The remembered anchor is kept.
    pub fn unmount(&mut self) {
        if let Some(surface) = self.surface.take() {
            debug!(id = %self.id, "unmounting");
            surface.destroy();
        }
        self.highlight_cache = None;
    }

    /// Apply new props from the form.
    ///
    /// A changed value, read-only flag or id rebuilds the surface. Other
    /// props are applied in place.
    ///
    /// # Errors
    ///
    /// Propagates beautifier failures from remounting.
    pub fn set_props(&mut self, props: WidgetProps) -> Result<()> {
        let value = props.value.unwrap_or_default();
        let value_changed = value != self.reported;
        let readonly_changed = props.readonly != self.readonly;
        let id_changed = props.id != self.id;

        self.readonly = props.readonly;
        self.autofocus = props.autofocus;
        self.placeholder = props.placeholder;
        self.on_change = props.on_change;
        self.reported = value;

        if id_changed {
            self.id = props.id;
            let area = self.container.as_ref().map(Container::area);
            self.remember_anchor();
            self.unmount();
            self.container = area.map(|area| Container::new(&self.id, area));
        }

        if self.surface.is_some() && (value_changed || readonly_changed) {
            self.remember_anchor();
            let focused = self.is_focused();
            self.unmount();
            self.mount()?;
            if focused {
                self.focus();
            }
        } else if self.surface.is_none() {
            self.mount()?;
        }
        Ok(())
    }

    /// Route a terminal event to the surface.
    ///
    /// Key presses and pastes are handled, and the mouse wheel scrolls the
    /// view. Everything else is ignored.
    ///
    /// # Errors
    ///
    /// Propagates beautifier failures.
    pub fn handle_event(&mut self, event: &Event) -> Result<SurfaceEvent> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(*key),
            Event::Paste(text) => self.handle_paste(text),
            Event::Mouse(mouse) => Ok(match mouse.kind {
                MouseEventKind::ScrollDown => self.scroll_by(WHEEL_LINES),
                MouseEventKind::ScrollUp => self.scroll_by(-WHEEL_LINES),
                _ => SurfaceEvent::Ignored,
            }),
            _ => Ok(SurfaceEvent::Ignored),
        }
    }

    /// Apply a key press and propagate any document change.
    ///
    /// # Errors
    ///
    /// Propagates beautifier failures.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<SurfaceEvent> {
        let Some(surface) = self.surface.as_mut() else {
            return Ok(SurfaceEvent::Ignored);
        };
        let event = surface.handle_key(key);
        if event == SurfaceEvent::Changed {
            self.document_changed()?;
        }
        Ok(event)
    }

    /// Scroll the view by `delta` lines without moving the cursor. Works in
    /// read-only fields.
    pub fn scroll_by(&mut self, delta: isize) -> SurfaceEvent {
        self.surface
            .as_mut()
            .map_or(SurfaceEvent::Ignored, |surface| surface.scroll_by(delta))
    }

    /// Insert pasted text and propagate the change.
    ///
    /// # Errors
    ///
    /// Propagates beautifier failures.
    pub fn handle_paste(&mut self, text: &str) -> Result<SurfaceEvent> {
        let Some(surface) = self.surface.as_mut() else {
            return Ok(SurfaceEvent::Ignored);
        };
        let event = surface.paste(text);
        if event == SurfaceEvent::Changed {
            self.document_changed()?;
        }
        Ok(event)
    }

    /// React to a change of the surface's document.
    ///
    /// Beautifies the document; reports it when it differs from the last
    /// reported value; then replaces the document with the beautified text
    /// if the two differ, keeping the cursor offset.
    ///
    /// # Errors
    ///
    /// Propagates beautifier failures; the document is left as typed.
    pub fn document_changed(&mut self) -> Result<()> {
        let Some(surface) = self.surface.as_ref() else {
            return Ok(());
        };
        let text = surface.text();
        let anchor = surface.anchor();
        let formatted = self.beautifier.beautify(&text)?;

        if formatted != self.reported {
            self.anchor = Some(anchor);
            trace!(id = %self.id, chars = formatted.chars().count(), "reporting change");
            if let Some(on_change) = self.on_change.as_mut() {
                on_change(formatted.clone());
            }
            self.reported.clone_from(&formatted);
        }

        if text != formatted {
            self.anchor = Some(anchor);
            let focused = self.is_focused();
            self.unmount();
            self.create_surface(&formatted, focused);
        }
        Ok(())
    }

    /// Draw the widget into `area`, mounting it first if needed.
    ///
    /// # Errors
    ///
    /// Propagates beautifier failures from mounting.
    pub fn render(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        self.attach(area);
        if self.surface.is_none() {
            self.mount()?;
        }
        let rows = usize::from(area.height.saturating_sub(2));
        if let Some(surface) = self.surface.as_mut() {
            surface.set_rows(rows);
        }
        render::draw(self, frame, area);
        Ok(())
    }

    // --- Private helpers ---

    fn remember_anchor(&mut self) {
        if let Some(surface) = self.surface.as_ref() {
            self.anchor = Some(surface.anchor());
        }
    }

    fn create_surface(&mut self, text: &str, focused: bool) -> bool {
        let Some(container) = self.container.as_ref() else {
            return false;
        };
        let config = SurfaceConfig {
            editable: !self.readonly,
            close_brackets: self.options.close_brackets,
            rows: usize::from(container.area().height.saturating_sub(2)),
        };
        let mut surface = EditorSurface::create(container, text, config);
        if let Some(anchor) = self.anchor {
            surface.set_anchor(anchor);
        }
        if focused {
            surface.focus();
        } else if self.autofocus && !surface.is_focused() {
            surface.focus();
            surface.set_anchor(self.anchor.unwrap_or(0));
        }
        debug!(id = %self.id, anchor = surface.anchor(), focused = surface.is_focused(), "mounted");
        self.surface = Some(surface);
        true
    }

    fn highlighted_lines(&mut self, text: &str) -> &[Vec<HighlightSpan>] {
        let stale = self
            .highlight_cache
            .as_ref()
            .is_none_or(|(cached, _)| cached != text);
        if stale {
            let lines = crate::highlight::highlight_template(text);
            self.highlight_cache = Some((text.to_string(), lines));
        }
        match self.highlight_cache.as_ref() {
            Some((_, lines)) => lines,
            None => &[],
        }
    }
}

impl<B> Drop for CodeEditorWidget<B> {
    fn drop(&mut self) {
        if let Some(surface) = self.surface.take() {
            surface.destroy();
        }
    }
}

impl<B> std::fmt::Debug for CodeEditorWidget<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeEditorWidget")
            .field("id", &self.id)
            .field("readonly", &self.readonly)
            .field("autofocus", &self.autofocus)
            .field("reported", &self.reported)
            .field("anchor", &self.anchor)
            .field("mounted", &self.surface.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;

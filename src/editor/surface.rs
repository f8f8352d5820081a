use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use super::buffer::{Direction, EditorBuffer};
use crate::form::{Attachment, Container};

/// What a key press or paste did to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// Nothing happened (unbound key, or an edit rejected in read-only mode).
    Ignored,
    /// Cursor or scroll moved; the document is unchanged.
    Moved,
    /// The document text changed.
    Changed,
}

/// Options fixed for the lifetime of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceConfig {
    /// When false, all user edits are rejected.
    pub editable: bool,
    /// Insert the closing bracket or quote when an opening one is typed.
    pub close_brackets: bool,
    /// Visible text rows, used for scrolling.
    pub rows: usize,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            editable: true,
            close_brackets: true,
            rows: 12,
        }
    }
}

const BRACKET_PAIRS: [(char, char); 5] = [('(', ')'), ('[', ']'), ('{', '}'), ('"', '"'), ('\'', '\'')];
const TAB: &str = "  ";

/// A live editing surface mounted in a [`Container`].
///
/// The surface owns the document, cursor, focus and scroll position. It is
/// attached to its container for as long as it exists; dropping it (or
/// calling [`EditorSurface::destroy`]) detaches it.
#[derive(Debug)]
pub struct EditorSurface {
    buffer: EditorBuffer,
    config: SurfaceConfig,
    focused: bool,
    scroll_offset: usize,
    _attachment: Attachment,
}

impl EditorSurface {
    /// Create a surface holding `text`, attached to `container`.
    pub fn create(container: &Container, text: &str, config: SurfaceConfig) -> Self {
        debug!(
            id = container.id(),
            editable = config.editable,
            chars = text.chars().count(),
            "editor surface created"
        );
        Self {
            buffer: EditorBuffer::from_text(text),
            config,
            focused: false,
            scroll_offset: 0,
            _attachment: container.attach(),
        }
    }

    /// Release the surface and detach it from its container.
    pub fn destroy(self) {
        debug!(revision = self.buffer.revision(), "editor surface destroyed");
    }

    pub const fn config(&self) -> SurfaceConfig {
        self.config
    }

    pub const fn is_editable(&self) -> bool {
        self.config.editable
    }

    pub const fn buffer(&self) -> &EditorBuffer {
        &self.buffer
    }

    /// The current document text.
    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// Selection anchor as a char offset.
    pub fn anchor(&self) -> usize {
        self.buffer.char_offset()
    }

    /// Move the selection anchor, clamped to the document length.
    pub fn set_anchor(&mut self, offset: usize) {
        self.buffer.set_char_offset(offset);
        self.ensure_cursor_visible();
    }

    pub const fn is_focused(&self) -> bool {
        self.focused
    }

    pub const fn focus(&mut self) {
        self.focused = true;
    }

    pub const fn blur(&mut self) {
        self.focused = false;
    }

    /// First visible line.
    pub const fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Update the number of visible rows, e.g. after a resize.
    pub fn set_rows(&mut self, rows: usize) {
        if rows != self.config.rows {
            self.config.rows = rows;
            self.ensure_cursor_visible();
        }
    }

    /// Scroll the view without moving the cursor.
    pub fn scroll_by(&mut self, delta: isize) -> SurfaceEvent {
        let max = self.buffer.line_count().saturating_sub(1);
        let next = self.scroll_offset.saturating_add_signed(delta).min(max);
        if next == self.scroll_offset {
            return SurfaceEvent::Ignored;
        }
        self.scroll_offset = next;
        SurfaceEvent::Moved
    }

    /// Apply a key press.
    pub fn handle_key(&mut self, key: KeyEvent) -> SurfaceEvent {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let event = match key.code {
            KeyCode::Left if ctrl => self.navigate(EditorBuffer::move_word_left),
            KeyCode::Right if ctrl => self.navigate(EditorBuffer::move_word_right),
            KeyCode::Home if ctrl => self.navigate(EditorBuffer::move_to_start),
            KeyCode::End if ctrl => self.navigate(EditorBuffer::move_to_end),
            KeyCode::Left => self.navigate(|b| b.move_cursor(Direction::Left)),
            KeyCode::Right => self.navigate(|b| b.move_cursor(Direction::Right)),
            KeyCode::Up => self.navigate(|b| b.move_cursor(Direction::Up)),
            KeyCode::Down => self.navigate(|b| b.move_cursor(Direction::Down)),
            KeyCode::Home => self.navigate(EditorBuffer::move_home),
            KeyCode::End => self.navigate(EditorBuffer::move_end),
            KeyCode::PageUp => {
                let rows = self.config.rows.max(1);
                self.navigate(|b| {
                    let c = b.cursor();
                    b.move_to(c.line.saturating_sub(rows), c.col);
                })
            }
            KeyCode::PageDown => {
                let rows = self.config.rows.max(1);
                self.navigate(|b| {
                    let c = b.cursor();
                    b.move_to(c.line + rows, c.col);
                })
            }
            KeyCode::Char(ch) if !ctrl => self.edit(|s| s.type_char(ch)),
            KeyCode::Enter => self.edit(|s| {
                s.buffer.split_line();
                true
            }),
            KeyCode::Tab => self.edit(|s| {
                s.buffer.insert_str(TAB);
                true
            }),
            KeyCode::Backspace => self.edit(Self::delete_back),
            KeyCode::Delete => self.edit(|s| s.buffer.delete_forward()),
            _ => SurfaceEvent::Ignored,
        };
        if event != SurfaceEvent::Ignored {
            self.ensure_cursor_visible();
        }
        event
    }

    /// Insert pasted text at the cursor.
    pub fn paste(&mut self, text: &str) -> SurfaceEvent {
        let event = self.edit(|s| {
            s.buffer.insert_str(text);
            !text.is_empty()
        });
        self.ensure_cursor_visible();
        event
    }

    /// Char offsets of the bracket next to the cursor and its partner.
    ///
    /// The char under the cursor is checked first, then the one before it.
    pub fn matching_bracket(&self) -> Option<(usize, usize)> {
        let offset = self.buffer.char_offset();
        let candidates = [Some(offset), offset.checked_sub(1)];
        candidates
            .into_iter()
            .flatten()
            .find_map(|at| self.find_partner(at).map(|partner| (at, partner)))
    }

    // --- Private helpers ---

    fn navigate(&mut self, f: impl FnOnce(&mut EditorBuffer)) -> SurfaceEvent {
        let before = self.buffer.cursor();
        f(&mut self.buffer);
        if self.buffer.cursor() == before {
            SurfaceEvent::Ignored
        } else {
            SurfaceEvent::Moved
        }
    }

    fn edit(&mut self, f: impl FnOnce(&mut Self) -> bool) -> SurfaceEvent {
        if !self.config.editable {
            return SurfaceEvent::Ignored;
        }
        let before = self.buffer.revision();
        if f(self) && self.buffer.revision() != before {
            SurfaceEvent::Changed
        } else {
            SurfaceEvent::Moved
        }
    }

    fn type_char(&mut self, ch: char) -> bool {
        if self.config.close_brackets {
            let next = self.buffer.char_at(self.buffer.char_offset());
            let is_closer = BRACKET_PAIRS.iter().any(|&(_, close)| close == ch);
            if is_closer && next == Some(ch) {
                self.buffer.move_cursor(Direction::Right);
                return false;
            }
            if let Some(&(open, close)) = BRACKET_PAIRS.iter().find(|&&(open, _)| open == ch) {
                let at = self.buffer.char_offset();
                self.buffer.insert_char(open);
                self.buffer.insert_char(close);
                self.buffer.set_char_offset(at + 1);
                return true;
            }
        }
        self.buffer.insert_char(ch);
        true
    }

    fn delete_back(&mut self) -> bool {
        let at = self.buffer.char_offset();
        if self.config.close_brackets && at > 0 {
            let prev = self.buffer.char_at(at - 1);
            let next = self.buffer.char_at(at);
            let empty_pair = BRACKET_PAIRS
                .iter()
                .any(|&(open, close)| prev == Some(open) && next == Some(close));
            if empty_pair {
                self.buffer.delete_forward();
            }
        }
        self.buffer.delete_back()
    }

    fn find_partner(&self, at: usize) -> Option<usize> {
        let ch = self.buffer.char_at(at)?;
        let (open, close, forward) = BRACKET_PAIRS[..3].iter().find_map(|&(open, close)| {
            if ch == open {
                Some((open, close, true))
            } else if ch == close {
                Some((open, close, false))
            } else {
                None
            }
        })?;

        let mut depth = 0usize;
        if forward {
            for idx in at..self.buffer.len_chars() {
                match self.buffer.char_at(idx) {
                    Some(c) if c == open => depth += 1,
                    Some(c) if c == close => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(idx);
                        }
                    }
                    _ => {}
                }
            }
        } else {
            for idx in (0..=at).rev() {
                match self.buffer.char_at(idx) {
                    Some(c) if c == close => depth += 1,
                    Some(c) if c == open => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(idx);
                        }
                    }
                    _ => {}
                }
            }
        }
        None
    }

    fn ensure_cursor_visible(&mut self) {
        let cursor_line = self.buffer.cursor().line;
        let rows = self.config.rows;
        if rows == 0 {
            self.scroll_offset = cursor_line;
            return;
        }
        if cursor_line < self.scroll_offset {
            self.scroll_offset = cursor_line;
        } else if cursor_line >= self.scroll_offset + rows {
            self.scroll_offset = cursor_line + 1 - rows;
        }
    }
}

//! The editing surface embedded in the widget.
//!
//! [`EditorBuffer`] is a rope-backed document with a line/column cursor.
//! [`EditorSurface`] wraps one buffer with editability, focus, scrolling and
//! key handling, and is attached to a form [`Container`](crate::form::Container)
//! for as long as it lives.

mod buffer;
mod surface;

pub use buffer::{Cursor, Direction, EditorBuffer};
pub use surface::{EditorSurface, SurfaceConfig, SurfaceEvent};

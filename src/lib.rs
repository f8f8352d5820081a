// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. editor::EditorBuffer)
    clippy::module_name_repetitions
)]

//! # jinja-field
//!
//! A form widget for editing Jinja2 templates in the terminal.
//!
//! The widget binds one string field of a schema-driven form to an editing
//! surface with:
//! - Jinja syntax highlighting
//! - Automatic reformatting after every edit
//! - Change reporting with duplicate suppression
//! - Cursor preservation across reformatting
//! - Read-only mode and autofocus
//!
//! ## Modules
//!
//! - [`widget`]: the form widget binding a field to an editor
//! - [`editor`]: text buffer and editing surface
//! - [`beautify`]: template reformatting
//! - [`highlight`]: syntax highlighting
//! - [`form`]: props, change callback and container the form supplies
//! - [`ui`]: themes and the demo host view
//! - [`app`]: terminal demo host
//! - [`config`]: saved defaults for the demo host

pub mod app;
pub mod beautify;
pub mod config;
pub mod editor;
pub mod error;
pub mod form;
pub mod highlight;
pub mod ui;
pub mod widget;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::beautify::{Beautifier, BeautifyError, JinjaBeautifier, beautify};
    pub use crate::form::{ChangeCallback, Container, WidgetProps, aria_described_by_ids};
    pub use crate::widget::{CodeEditorWidget, WidgetOptions};
}

//! Terminal UI for the demo host.
//!
//! - [`style`]: themes mapping token categories to styles
//! - [`render`]: the full-screen view of the app model

pub mod style;

mod render;
mod status;

pub use render::render;

//! Reformatting of Jinja template source.
//!
//! The widget runs every document change through a [`Beautifier`] and shows
//! the result. Beautifiers must be idempotent: formatting already formatted
//! text returns it unchanged, otherwise every keystroke would reformat
//! forever.
//!
//! [`JinjaBeautifier`] normalizes the spacing inside `{{ }}`, `{% %}` and
//! `{# #}` tags, strips trailing whitespace from template text, and indents
//! the lines between block statements (`if`/`endif`, `for`/`endfor`, ...).
//! Text inside `{% raw %}` blocks, inside multi-line tags and after an
//! unterminated tag is passed through.

mod scan;

use thiserror::Error;

use scan::{Segment, Tag, scan};

/// A beautifier failed to produce output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("beautify failed: {message}")]
pub struct BeautifyError {
    message: String,
}

impl BeautifyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Reformats template text into a canonical layout.
pub trait Beautifier {
    /// Reformat `text`.
    ///
    /// # Errors
    ///
    /// Implementations may fail on input they cannot handle; the widget
    /// propagates the error to its caller unchanged.
    fn beautify(&self, text: &str) -> Result<String, BeautifyError>;
}

impl<F> Beautifier for F
where
    F: Fn(&str) -> Result<String, BeautifyError>,
{
    fn beautify(&self, text: &str) -> Result<String, BeautifyError> {
        self(text)
    }
}

/// The default Jinja beautifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JinjaBeautifier {
    indent_width: usize,
}

impl JinjaBeautifier {
    pub const fn new() -> Self {
        Self { indent_width: 2 }
    }

    /// Spaces per nesting level.
    #[must_use]
    pub const fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    /// Format `text`. Never fails.
    pub fn format(&self, text: &str) -> String {
        let lines = layout(&scan(text));
        let mut out = Vec::with_capacity(lines.len());
        let mut depth = 0usize;

        for line in lines {
            if line.verbatim {
                out.push(line.text);
            } else {
                let content = if line.open_end {
                    line.text.trim_start()
                } else {
                    line.text.trim()
                };
                if content.is_empty() {
                    out.push(String::new());
                } else {
                    let level = depth.saturating_sub(usize::from(line.dedent));
                    out.push(format!("{}{content}", " ".repeat(level * self.indent_width)));
                }
            }
            depth = depth.saturating_add_signed(line.delta);
        }

        out.join("\n")
    }
}

impl Default for JinjaBeautifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Beautifier for JinjaBeautifier {
    fn beautify(&self, text: &str) -> Result<String, BeautifyError> {
        Ok(self.format(text))
    }
}

/// Format with the default settings.
pub fn beautify(text: &str) -> String {
    JinjaBeautifier::new().format(text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Open,
    Middle,
    Close,
    Inline,
}

const OPENERS: [&str; 10] = [
    "if",
    "for",
    "block",
    "macro",
    "call",
    "filter",
    "with",
    "trans",
    "autoescape",
    "raw",
];
const MIDDLES: [&str; 3] = ["elif", "else", "pluralize"];

fn block_kind(tag: &Tag<'_>) -> Block {
    let Some(keyword) = tag.keyword() else {
        return Block::Inline;
    };
    if keyword.starts_with("end") {
        Block::Close
    } else if MIDDLES.contains(&keyword) {
        Block::Middle
    } else if OPENERS.contains(&keyword) || (keyword == "set" && !tag.body.contains('=')) {
        Block::Open
    } else {
        Block::Inline
    }
}

#[derive(Debug, Default)]
struct Line {
    text: String,
    /// Started inside a tag or raw block; emitted untouched.
    verbatim: bool,
    /// Ends inside a tag or raw block, so trailing whitespace is content.
    open_end: bool,
    /// Starts with a closing or middle tag, so sits one level out.
    dedent: bool,
    /// Net block depth change caused by tags starting on this line.
    delta: isize,
}

fn layout(segments: &[Segment<'_>]) -> Vec<Line> {
    let mut lines = vec![Line::default()];

    for segment in segments {
        match segment {
            Segment::Text(text) => append(&mut lines, text, false),
            Segment::Verbatim(text) => append(&mut lines, text, true),
            Segment::Tag(tag) => {
                let kind = block_kind(tag);
                if let Some(line) = lines.last_mut() {
                    // `{% endraw %}` opening the last line of a raw block.
                    if line.verbatim && line.text.is_empty() {
                        line.verbatim = false;
                    }
                    let at_start = line.text.trim().is_empty();
                    if at_start && matches!(kind, Block::Middle | Block::Close) {
                        line.dedent = true;
                    }
                    line.delta += match kind {
                        Block::Open => 1,
                        Block::Close => -1,
                        Block::Middle | Block::Inline => 0,
                    };
                }
                append(&mut lines, &tag.render(), true);
            }
        }
    }

    lines
}

/// Append `text`; lines it starts are verbatim when `continuation` is set.
fn append(lines: &mut Vec<Line>, text: &str, continuation: bool) {
    for (i, part) in text.split('\n').enumerate() {
        if i > 0 {
            lines.push(Line {
                verbatim: continuation,
                ..Line::default()
            });
        }
        if let Some(line) = lines.last_mut()
            && !part.is_empty()
        {
            line.text.push_str(part);
            line.open_end = continuation;
        }
    }
}

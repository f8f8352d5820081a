//! Syntax highlighting for Jinja templates.
//!
//! Uses syntect with an embedded Sublime Text syntax definition. Scopes are
//! reduced to a small set of [`TokenCategory`] values that the theme maps
//! to styles.

use std::sync::OnceLock;

use syntect::parsing::{
    ParseState, Scope, ScopeStack, SyntaxDefinition, SyntaxReference, SyntaxSet, SyntaxSetBuilder,
};
use tracing::warn;

use crate::error::{Error, Result};

const JINJA_SYNTAX: &str = include_str!("jinja.sublime-syntax");
const JINJA_NAME: &str = "Jinja";

/// Syntactic category of a highlighted span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenCategory {
    Plain,
    /// `{{`, `}}`, `{%`, `%}` and their whitespace-control variants.
    Delimiter,
    Keyword,
    Operator,
    String,
    Escape,
    Number,
    /// `true`, `false`, `none`.
    Atom,
    Variable,
    /// Filter names after `|`.
    Filter,
    Comment,
    Punctuation,
}

/// A run of text with one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
    pub category: TokenCategory,
    pub text: String,
}

impl HighlightSpan {
    pub fn new(category: TokenCategory, text: impl Into<String>) -> Self {
        Self {
            category,
            text: text.into(),
        }
    }
}

/// The syntax set holding the Jinja definition, loaded once.
///
/// # Errors
///
/// Returns [`Error::Highlight`] if the embedded definition fails to load.
pub fn syntax_set() -> Result<&'static SyntaxSet> {
    static SYNTAX_SET: OnceLock<std::result::Result<SyntaxSet, String>> = OnceLock::new();
    SYNTAX_SET
        .get_or_init(|| {
            let definition = SyntaxDefinition::load_from_str(JINJA_SYNTAX, true, None)
                .map_err(|err| err.to_string())?;
            let mut builder = SyntaxSetBuilder::new();
            builder.add(definition);
            Ok(builder.build())
        })
        .as_ref()
        .map_err(|msg| Error::Highlight(msg.clone()))
}

/// The Jinja syntax definition.
///
/// # Errors
///
/// Returns [`Error::Highlight`] if the syntax set cannot be loaded.
pub fn jinja_syntax() -> Result<&'static SyntaxReference> {
    let set = syntax_set()?;
    set.find_syntax_by_name(JINJA_NAME)
        .ok_or_else(|| Error::Highlight(format!("syntax {JINJA_NAME} missing from set")))
}

/// Highlight template text, one `Vec` of spans per line.
///
/// Lines are split on `\n` so the result lines up with the editor buffer.
/// If highlighting fails the text is returned as plain spans.
pub fn highlight_template(text: &str) -> Vec<Vec<HighlightSpan>> {
    match try_highlight_template(text) {
        Ok(lines) => lines,
        Err(err) => {
            warn!(error = %err, "highlighting failed, rendering plain text");
            plain_lines(text)
        }
    }
}

/// Like [`highlight_template`] but reports failures.
///
/// # Errors
///
/// Returns [`Error::Highlight`] if the syntax cannot be loaded or a line
/// fails to parse.
pub fn try_highlight_template(text: &str) -> Result<Vec<Vec<HighlightSpan>>> {
    let set = syntax_set()?;
    let syntax = jinja_syntax()?;
    let mut state = ParseState::new(syntax);
    let mut stack = ScopeStack::new();
    let mut lines = Vec::new();

    for line in text.split('\n') {
        let with_newline = format!("{line}\n");
        let ops = state
            .parse_line(&with_newline, set)
            .map_err(|err| Error::Highlight(err.to_string()))?;

        let mut spans: Vec<HighlightSpan> = Vec::new();
        let mut last = 0;
        for (pos, op) in ops {
            let end = pos.min(line.len());
            if end > last {
                push_span(&mut spans, category_for(&stack), &line[last..end]);
                last = end;
            }
            stack
                .apply(&op)
                .map_err(|err| Error::Highlight(format!("{err:?}")))?;
        }
        if last < line.len() {
            push_span(&mut spans, category_for(&stack), &line[last..]);
        }
        lines.push(spans);
    }

    Ok(lines)
}

fn plain_lines(text: &str) -> Vec<Vec<HighlightSpan>> {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                Vec::new()
            } else {
                vec![HighlightSpan::new(TokenCategory::Plain, line)]
            }
        })
        .collect()
}

/// Push a span, merging with the previous one when the category matches.
fn push_span(spans: &mut Vec<HighlightSpan>, category: TokenCategory, text: &str) {
    if let Some(last) = spans.last_mut()
        && last.category == category
    {
        last.text.push_str(text);
        return;
    }
    spans.push(HighlightSpan::new(category, text));
}

fn category_for(stack: &ScopeStack) -> TokenCategory {
    stack
        .as_slice()
        .iter()
        .rev()
        .find_map(|scope| category_for_scope(*scope))
        .unwrap_or(TokenCategory::Plain)
}

fn category_for_scope(scope: Scope) -> Option<TokenCategory> {
    const RULES: [(&str, TokenCategory); 13] = [
        ("punctuation.definition.comment", TokenCategory::Comment),
        ("comment", TokenCategory::Comment),
        ("constant.character.escape", TokenCategory::Escape),
        ("punctuation.definition.string", TokenCategory::String),
        ("string", TokenCategory::String),
        ("punctuation.section.embedded", TokenCategory::Delimiter),
        ("keyword.control", TokenCategory::Keyword),
        ("keyword.operator", TokenCategory::Operator),
        ("support.function", TokenCategory::Filter),
        ("constant.numeric", TokenCategory::Number),
        ("constant.language", TokenCategory::Atom),
        ("variable", TokenCategory::Variable),
        ("punctuation", TokenCategory::Punctuation),
    ];
    let name = scope.build_string();
    RULES
        .iter()
        .find(|(prefix, _)| name.starts_with(*prefix))
        .map(|&(_, category)| category)
}

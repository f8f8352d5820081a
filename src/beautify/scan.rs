//! Splits template source into text and tag segments.

/// Which delimiter pair a tag uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delim {
    /// `{{ ... }}`
    Expression,
    /// `{% ... %}`
    Statement,
    /// `{# ... #}`
    Comment,
}

impl Delim {
    const fn open(self) -> &'static str {
        match self {
            Self::Expression => "{{",
            Self::Statement => "{%",
            Self::Comment => "{#",
        }
    }

    const fn close(self) -> &'static str {
        match self {
            Self::Expression => "}}",
            Self::Statement => "%}",
            Self::Comment => "#}",
        }
    }
}

/// A delimited tag with its whitespace-control markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'a> {
    pub delim: Delim,
    pub open_marker: Option<char>,
    pub close_marker: Option<char>,
    pub body: &'a str,
}

impl Tag<'_> {
    /// Canonical form: one space inside each delimiter, body trimmed.
    pub fn render(&self) -> String {
        let body = self.body.trim();
        let mut out = String::with_capacity(body.len() + 8);
        out.push_str(self.delim.open());
        out.extend(self.open_marker);
        out.push(' ');
        if !body.is_empty() {
            out.push_str(body);
            out.push(' ');
        }
        out.extend(self.close_marker);
        out.push_str(self.delim.close());
        out
    }

    /// First word of a statement body, e.g. `if` or `endfor`.
    pub fn keyword(&self) -> Option<&str> {
        if self.delim != Delim::Statement {
            return None;
        }
        self.body.split_whitespace().next()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Template text outside any tag.
    Text(&'a str),
    /// Text inside a `raw` block or after an unterminated tag; never reformatted.
    Verbatim(&'a str),
    Tag(Tag<'a>),
}

const MARKERS: [char; 2] = ['-', '+'];

/// Scan `src` into segments. Concatenating the source spans of the result
/// reproduces `src`.
pub fn scan(src: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut pos = 0;
    let mut text_start = 0;

    while let Some(rel) = src[pos..].find('{') {
        let open_at = pos + rel;
        let Some(delim) = delim_at(src, open_at) else {
            pos = open_at + 1;
            continue;
        };
        let Some((tag, end)) = parse_tag(src, open_at, delim) else {
            // Unterminated tag: everything from here on is left alone.
            push_text(&mut segments, &src[text_start..open_at]);
            segments.push(Segment::Verbatim(&src[open_at..]));
            return segments;
        };

        push_text(&mut segments, &src[text_start..open_at]);
        segments.push(Segment::Tag(tag));
        pos = end;
        text_start = end;

        if tag.keyword() == Some("raw") {
            match find_endraw(src, pos) {
                Some(endraw_at) => {
                    if endraw_at > pos {
                        segments.push(Segment::Verbatim(&src[pos..endraw_at]));
                    }
                    pos = endraw_at;
                    text_start = endraw_at;
                }
                None => {
                    if pos < src.len() {
                        segments.push(Segment::Verbatim(&src[pos..]));
                    }
                    return segments;
                }
            }
        }
    }

    push_text(&mut segments, &src[text_start..]);
    segments
}

fn push_text<'a>(segments: &mut Vec<Segment<'a>>, text: &'a str) {
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
}

fn delim_at(src: &str, at: usize) -> Option<Delim> {
    match src.as_bytes().get(at + 1)? {
        b'{' => Some(Delim::Expression),
        b'%' => Some(Delim::Statement),
        b'#' => Some(Delim::Comment),
        _ => None,
    }
}

/// Parse the tag opening at `open_at`, returning it and the offset just
/// past its closing delimiter.
fn parse_tag(src: &str, open_at: usize, delim: Delim) -> Option<(Tag<'_>, usize)> {
    let mut inner = open_at + 2;
    let open_marker = src[inner..].chars().next().filter(|c| MARKERS.contains(c));
    if open_marker.is_some() {
        inner += 1;
    }

    let close_at = find_close(src, inner, delim)?;
    let mut body = &src[inner..close_at];
    let close_marker = body.chars().next_back().filter(|c| MARKERS.contains(c));
    if close_marker.is_some() {
        body = &body[..body.len() - 1];
    }

    let tag = Tag {
        delim,
        open_marker,
        close_marker,
        body,
    };
    Some((tag, close_at + delim.close().len()))
}

/// Find the closing delimiter, skipping over quoted strings in code tags.
fn find_close(src: &str, from: usize, delim: Delim) -> Option<usize> {
    let close = delim.close();
    if delim == Delim::Comment {
        return src[from..].find(close).map(|rel| from + rel);
    }

    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (rel, ch) in src[from..].char_indices() {
        let at = from + rel;
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            _ if src[at..].starts_with(close) => return Some(at),
            _ => {}
        }
    }
    None
}

/// Offset of the `{% endraw %}` tag closing a raw block that starts at `from`.
fn find_endraw(src: &str, from: usize) -> Option<usize> {
    let mut pos = from;
    while let Some(rel) = src[pos..].find("{%") {
        let at = pos + rel;
        if let Some((tag, _)) = parse_tag(src, at, Delim::Statement)
            && tag.body.trim() == "endraw"
        {
            return Some(at);
        }
        pos = at + 2;
    }
    None
}

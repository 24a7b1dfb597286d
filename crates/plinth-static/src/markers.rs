//! Marker scanner.
//!
//! Splits page text into literal spans and marker spans. Three kinds of HTML
//! comment are markers:
//!
//! - `<!--/posts/x.html-->` embeds the link card of the entry at that path
//! - `<!--MACRO:name-->` runs template `name` before the body is rendered
//! - `<!--MACRO_WEB:name-->` runs template `name` after the body is rendered
//!
//! Every other comment is literal text.

const OPEN: &str = "<!--";
const CLOSE: &str = "-->";
const MACRO_PREFIX: &str = "MACRO:";
const WEB_MACRO_PREFIX: &str = "MACRO_WEB:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Embed,
    Macro,
    WebMacro,
}

/// One recognized marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker<'a> {
    pub kind: MarkerKind,
    /// Site path for embeds, template name for macros
    pub key: &'a str,
    /// The whole comment as written
    pub raw: &'a str,
}

impl<'a> Marker<'a> {
    fn parse(inner: &'a str, raw: &'a str) -> Option<Self> {
        let (kind, key) = if let Some(name) = inner.strip_prefix(WEB_MACRO_PREFIX) {
            (MarkerKind::WebMacro, name)
        } else if let Some(name) = inner.strip_prefix(MACRO_PREFIX) {
            (MarkerKind::Macro, name)
        } else if inner.len() > 1 && inner.starts_with('/') {
            (MarkerKind::Embed, inner)
        } else {
            return None;
        };

        if key.is_empty() || key.contains(char::is_whitespace) {
            return None;
        }

        Some(Self { kind, key, raw })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Marker(Marker<'a>),
}

/// Iterator over the segments of a text. Concatenating the text of every
/// segment (using `raw` for markers) gives back the input.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    rest: &'a str,
}

pub fn scan(text: &str) -> Scanner<'_> {
    Scanner { rest: text }
}

impl<'a> Scanner<'a> {
    fn take_text(&mut self, len: usize) -> Segment<'a> {
        let (text, rest) = self.rest.split_at(len);
        self.rest = rest;
        Segment::Text(text)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        if self.rest.is_empty() {
            return None;
        }

        let mut from = 0;
        loop {
            let Some(open) = self.rest[from..].find(OPEN).map(|i| i + from) else {
                return Some(self.take_text(self.rest.len()));
            };
            let inner_start = open + OPEN.len();
            let Some(close) = self.rest[inner_start..].find(CLOSE).map(|i| i + inner_start) else {
                return Some(self.take_text(self.rest.len()));
            };
            let end = close + CLOSE.len();

            let Some(marker) = Marker::parse(&self.rest[inner_start..close], &self.rest[open..end])
            else {
                from = end;
                continue;
            };

            if open > 0 {
                return Some(self.take_text(open));
            }
            self.rest = &self.rest[end..];
            return Some(Segment::Marker(marker));
        }
    }
}

//! The in-memory form of one content file.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Selects how an entry is post-processed once its body is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Wrapped in a layout and written as-is.
    #[default]
    Page,
    /// A page whose body is followed by a card for every dated entry.
    Index,
    /// Replaced entirely by the site's Atom feed.
    Feed,
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "page" => Ok(Self::Page),
            "index" => Ok(Self::Index),
            "feed" => Ok(Self::Feed),
            other => Err(other.to_string()),
        }
    }
}

/// Source format of an entry's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentFormat {
    /// Content is already HTML and is used untouched.
    #[default]
    Html,
    /// Content is Markdown and gets converted before templating.
    Markdown,
}

impl FromStr for ContentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "html" => Ok(Self::Html),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(other.to_string()),
        }
    }
}

/// One content file plus its parsed metadata.
///
/// `Entry::default()` is the zero value handed to templates when a lookup
/// misses, so every field must have an empty default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entry {
    /// Where the entry was read from. Only used in diagnostics.
    pub file_path: PathBuf,

    /// Output-relative URL, unique across a site (e.g. `/posts/hello.html`)
    pub site_path: String,

    pub kind: EntryKind,

    pub title: String,

    /// RFC3339 timestamp; empty for undated pages
    pub date: String,

    pub image: String,

    /// Snippet exactly as written in the metadata block
    pub snippet: String,

    /// Card text derived from the snippet
    pub description: String,

    pub author: String,

    pub labels: BTreeSet<String>,

    /// Site paths of entries to recommend after this one
    pub related: Vec<String>,

    /// Layout override; empty means the site default
    pub template: String,

    /// Body with the metadata block removed, before any expansion
    pub content: String,
}

impl Entry {
    /// Whether the entry takes part in chronological listings.
    pub fn is_dated(&self) -> bool {
        !self.date.is_empty()
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }
}

//! Entry parser.
//!
//! Turns the text of one content file into an [`Entry`]: the metadata block
//! is extracted, validated and merged with the site defaults, and the body is
//! converted to HTML when the entry asks for it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat};
use pulldown_cmark::{html, Options, Parser};

use crate::entry::{ContentFormat, Entry, EntryKind};
use crate::frontmatter::{extract_frontmatter, FrontmatterError};
use crate::site::SiteConfig;

/// Card text for entries without a snippet.
pub const MISSING_DESCRIPTION: &str = "Description unavailable.";

/// Errors that can occur when parsing an entry. Each carries the path of the
/// offending file.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("{}: {source}", .path.display())]
    Frontmatter {
        path: PathBuf,
        #[source]
        source: FrontmatterError,
    },

    #[error("{}: date {date:?}: {source}", .path.display())]
    Date {
        path: PathBuf,
        date: String,
        #[source]
        source: DateError,
    },

    #[error("{}: unknown entry type {kind:?}", .path.display())]
    UnknownKind { path: PathBuf, kind: String },

    #[error("{}: unknown parser {parser:?}", .path.display())]
    UnknownParser { path: PathBuf, parser: String },
}

/// Why a `date` value was rejected.
#[derive(Debug, thiserror::Error)]
pub enum DateError {
    #[error("not RFC3339: {0}")]
    Invalid(#[from] chrono::ParseError),

    #[error("does not round-trip, formats as {formatted:?}")]
    NotCanonical { formatted: String },
}

/// Check that `date` is strict RFC3339 and formats back to itself.
///
/// Fractional seconds and `+00:00` offsets are rejected because they would
/// be written differently than they were read.
pub fn validate_date(date: &str) -> Result<(), DateError> {
    let parsed = DateTime::parse_from_rfc3339(date)?;
    let formatted = parsed.to_rfc3339_opts(SecondsFormat::Secs, true);
    if formatted != date {
        return Err(DateError::NotCanonical { formatted });
    }
    Ok(())
}

/// Parse one content file into an [`Entry`].
///
/// `site_path` is the entry's output-relative URL; `file_path` is only kept
/// for diagnostics.
pub fn parse_entry(
    source: &str,
    file_path: &Path,
    site_path: &str,
    site: &SiteConfig,
) -> Result<Entry, ParseError> {
    let (frontmatter, content) =
        extract_frontmatter(source).map_err(|source| ParseError::Frontmatter {
            path: file_path.to_path_buf(),
            source,
        })?;
    let fm = frontmatter.unwrap_or_default();

    let kind: EntryKind = fm
        .kind
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|kind| ParseError::UnknownKind {
            path: file_path.to_path_buf(),
            kind,
        })?;

    let format: ContentFormat = fm
        .parser
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|parser| ParseError::UnknownParser {
            path: file_path.to_path_buf(),
            parser,
        })?;

    let date = fm.date.unwrap_or_default();
    if !date.is_empty() {
        validate_date(&date).map_err(|source| ParseError::Date {
            path: file_path.to_path_buf(),
            date: date.clone(),
            source,
        })?;
    }

    let content = match format {
        ContentFormat::Html => content,
        ContentFormat::Markdown => render_markdown(&content),
    };

    let snippet = fm.snippet.unwrap_or_default();
    let description = describe(&snippet);

    Ok(Entry {
        file_path: file_path.to_path_buf(),
        site_path: site_path.to_string(),
        kind,
        title: or_default(fm.title, &site.title),
        date,
        image: or_default(fm.image, &site.image),
        snippet,
        description,
        author: or_default(fm.author, &site.author),
        labels: fm.labels.into_iter().collect::<BTreeSet<_>>(),
        related: fm.related,
        template: fm.template.unwrap_or_default(),
        content,
    })
}

fn or_default(value: Option<String>, fallback: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => fallback.to_string(),
    }
}

/// Card text for a snippet: the snippet followed by an ellipsis, or a fixed
/// notice when there is none.
pub fn describe(snippet: &str) -> String {
    let snippet = snippet.trim();
    if snippet.is_empty() {
        MISSING_DESCRIPTION.to_string()
    } else {
        format!("{snippet}...")
    }
}

/// Convert Markdown content to HTML.
pub fn render_markdown(content: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    let parser = Parser::new_ext(content, options);

    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    html_output
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn site() -> SiteConfig {
        SiteConfig {
            title: "Site Title".to_string(),
            image: "/img/default.png".to_string(),
            author: "Site Author".to_string(),
            ..Default::default()
        }
    }

    fn parse(source: &str) -> Result<Entry, ParseError> {
        parse_entry(source, Path::new("posts/a.html"), "/a.html", &site())
    }

    #[test]
    fn parses_complete_entry() {
        let source = r#"<!-- CONFIG
type: page
title: Hello
snippet: A greeting
image: /img/hello.png
date: 2021-06-01T00:00:00Z
labels: [greeting, rust, greeting]
related: [/b.html, /c.html]
template: wide
CONFIG -->
<p>Hello</p>"#;

        let entry = parse(source).unwrap();

        assert_eq!(entry.site_path, "/a.html");
        assert_eq!(entry.file_path, PathBuf::from("posts/a.html"));
        assert_eq!(entry.kind, EntryKind::Page);
        assert_eq!(entry.title, "Hello");
        assert_eq!(entry.date, "2021-06-01T00:00:00Z");
        assert_eq!(entry.image, "/img/hello.png");
        assert_eq!(entry.snippet, "A greeting");
        assert_eq!(entry.description, "A greeting...");
        assert_eq!(entry.author, "Site Author");
        assert_eq!(entry.labels.len(), 2);
        assert!(entry.has_label("rust"));
        assert_eq!(entry.related, vec!["/b.html", "/c.html"]);
        assert_eq!(entry.template, "wide");
        assert_eq!(entry.content, "<p>Hello</p>");
    }

    #[test]
    fn applies_site_defaults_without_block() {
        let entry = parse("<p>Just content</p>").unwrap();

        assert_eq!(entry.title, "Site Title");
        assert_eq!(entry.image, "/img/default.png");
        assert_eq!(entry.description, MISSING_DESCRIPTION);
        assert_eq!(entry.date, "");
        assert!(!entry.is_dated());
        assert_eq!(entry.content, "<p>Just content</p>");
    }

    #[test]
    fn reads_entry_kinds() {
        let index = parse("<!-- CONFIG\ntype: index\nCONFIG -->\n").unwrap();
        let feed = parse("<!-- CONFIG\ntype: feed\nCONFIG -->\n").unwrap();

        assert_eq!(index.kind, EntryKind::Index);
        assert_eq!(feed.kind, EntryKind::Feed);
    }

    #[test]
    fn rejects_unknown_kind() {
        let err = parse("<!-- CONFIG\ntype: gallery\nCONFIG -->\n").unwrap_err();

        assert!(matches!(err, ParseError::UnknownKind { ref kind, .. } if kind == "gallery"));
        assert!(err.to_string().contains("posts/a.html"));
    }

    #[test]
    fn converts_markdown_bodies() {
        let entry = parse("<!-- CONFIG\nparser: markdown\nCONFIG -->\n# Title\n\nSome *text*.").unwrap();

        assert!(entry.content.contains("<h1>Title</h1>"));
        assert!(entry.content.contains("<em>text</em>"));
    }

    #[test]
    fn rejects_unknown_parser() {
        let err = parse("<!-- CONFIG\nparser: asciidoc\nCONFIG -->\n").unwrap_err();

        assert!(matches!(err, ParseError::UnknownParser { .. }));
    }

    #[test]
    fn accepts_canonical_dates() {
        assert!(validate_date("2020-07-29T13:40:21Z").is_ok());
        assert!(validate_date("2020-07-29T13:40:21+05:30").is_ok());
    }

    #[test]
    fn rejects_non_rfc3339_dates() {
        assert!(matches!(validate_date("2020-07-29"), Err(DateError::Invalid(_))));
        assert!(matches!(validate_date("July 29, 2020"), Err(DateError::Invalid(_))));
    }

    #[test]
    fn rejects_dates_that_do_not_round_trip() {
        assert!(matches!(
            validate_date("2020-07-29T13:40:21+00:00"),
            Err(DateError::NotCanonical { .. })
        ));
        assert!(matches!(
            validate_date("2020-07-29T13:40:21.5Z"),
            Err(DateError::NotCanonical { .. })
        ));
    }

    #[test]
    fn bad_date_is_a_parse_error() {
        let err = parse("<!-- CONFIG\ndate: yesterday\nCONFIG -->\n").unwrap_err();

        assert!(matches!(err, ParseError::Date { ref date, .. } if date == "yesterday"));
    }

    #[test]
    fn invalid_block_is_a_parse_error() {
        let err = parse("<!-- CONFIG\nfrog\nCONFIG -->\n").unwrap_err();

        assert!(matches!(err, ParseError::Frontmatter { .. }));
    }

    #[test]
    fn describes_snippets() {
        assert_eq!(describe("Short"), "Short...");
        assert_eq!(describe("   "), MISSING_DESCRIPTION);
    }
}

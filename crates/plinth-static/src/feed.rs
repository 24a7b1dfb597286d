//! Atom feed generation.

use std::borrow::{Borrow, Cow};
use std::fmt::Write;

use plinth_entry::{Entry, SiteConfig};

use crate::index::sort_by_date;

/// Feed-level metadata, taken from the site configuration.
#[derive(Debug, Clone, Default)]
pub struct FeedConfig {
    pub title: String,
    pub url: String,
    pub id: String,
    pub author: String,
}

impl From<&SiteConfig> for FeedConfig {
    fn from(site: &SiteConfig) -> Self {
        Self {
            title: site.title.clone(),
            url: site.url.trim_end_matches('/').to_string(),
            id: site.feed_id().to_string(),
            author: site.author.clone(),
        }
    }
}

/// An entry together with its rendered body.
#[derive(Debug, Clone, Copy)]
pub struct FeedItem<'a> {
    pub entry: &'a Entry,
    pub content: &'a str,
}

impl Borrow<Entry> for FeedItem<'_> {
    fn borrow(&self) -> &Entry {
        self.entry
    }
}

/// Render an Atom document for the dated items, newest first.
pub fn atom_feed<'a>(
    config: &FeedConfig,
    items: impl IntoIterator<Item = FeedItem<'a>>,
) -> Result<String, FeedError> {
    let items = sort_by_date(items);
    let Some(newest) = items.first() else {
        return Err(FeedError::NoEntries);
    };

    let mut xml = String::new();
    writeln!(xml, r#"<?xml version="1.0" encoding="utf-8"?>"#)?;
    writeln!(xml, r#"<feed xmlns="http://www.w3.org/2005/Atom">"#)?;
    writeln!(xml, "  <title>{}</title>", escape_xml(&config.title))?;
    writeln!(xml, r#"  <link href="{}/" />"#, escape_xml(&config.url))?;
    writeln!(xml, "  <updated>{}</updated>", newest.entry.date)?;
    writeln!(xml, "  <id>{}</id>", escape_xml(&config.id))?;

    for item in &items {
        let entry = item.entry;
        let link = format!("{}{}", config.url, entry.site_path);
        let author = if entry.author.is_empty() {
            &config.author
        } else {
            &entry.author
        };

        writeln!(xml, "<entry>")?;
        writeln!(xml, "  <title>{}</title>", escape_xml(&entry.title))?;
        writeln!(xml, r#"  <link href="{}" />"#, escape_xml(&link))?;
        writeln!(xml, "  <updated>{}</updated>", entry.date)?;
        writeln!(xml, "  <id>{}</id>", escape_xml(&link))?;
        writeln!(xml, "  <author><name>{}</name></author>", escape_xml(author))?;
        writeln!(xml, r#"  <content type="html"><![CDATA["#)?;
        writeln!(xml, "{}", cdata(item.content))?;
        writeln!(xml, "  ]]></content>")?;
        writeln!(xml, "</entry>")?;
    }

    writeln!(xml, "</feed>")?;
    Ok(xml)
}

fn escape_xml(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    Cow::Owned(
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;"),
    )
}

/// Split any `]]>` so the text can sit inside a single CDATA section.
fn cdata(text: &str) -> String {
    text.replace("]]>", "]]]]><![CDATA[>")
}

/// Errors that can occur when generating a feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("no entries")]
    NoEntries,

    #[error("Failed to format feed: {0}")]
    Fmt(#[from] std::fmt::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::tests::entry;
    use pretty_assertions::assert_eq;

    fn config() -> FeedConfig {
        FeedConfig {
            title: "Blog".to_string(),
            url: "https://example.com".to_string(),
            id: "https://example.com".to_string(),
            author: "Site Author".to_string(),
        }
    }

    fn items(entries: &[Entry]) -> Vec<FeedItem<'_>> {
        entries
            .iter()
            .map(|entry| FeedItem {
                entry,
                content: &entry.content,
            })
            .collect()
    }

    #[test]
    fn fails_without_dated_entries() {
        let entries = vec![entry("/a", "", &[])];

        let err = atom_feed(&config(), items(&entries)).unwrap_err();

        assert!(matches!(err, FeedError::NoEntries));
        assert_eq!(err.to_string(), "no entries");
        assert!(atom_feed(&config(), Vec::<FeedItem>::new()).is_err());
    }

    #[test]
    fn renders_single_entry() {
        let mut a = entry("/a.html", "2021-01-01T00:00:00Z", &[]);
        a.content = "<p>Hello</p>".to_string();
        let entries = vec![a];

        let xml = atom_feed(&config(), items(&entries)).unwrap();

        assert_eq!(
            xml,
            r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Blog</title>
  <link href="https://example.com/" />
  <updated>2021-01-01T00:00:00Z</updated>
  <id>https://example.com</id>
<entry>
  <title>Title /a.html</title>
  <link href="https://example.com/a.html" />
  <updated>2021-01-01T00:00:00Z</updated>
  <id>https://example.com/a.html</id>
  <author><name>Site Author</name></author>
  <content type="html"><![CDATA[
<p>Hello</p>
  ]]></content>
</entry>
</feed>
"#
        );
    }

    #[test]
    fn newest_entry_sets_feed_date() {
        let entries = vec![
            entry("/a", "2021-01-01T00:00:00Z", &[]),
            entry("/b", "2021-06-01T00:00:00Z", &[]),
            entry("/c", "", &[]),
        ];

        let xml = atom_feed(&config(), items(&entries)).unwrap();

        assert_eq!(xml.matches("<entry>").count(), 2);
        let header = xml.split("<entry>").next().unwrap();
        assert!(header.contains("<updated>2021-06-01T00:00:00Z</updated>"));
        let b = xml.find("https://example.com/b").unwrap();
        let a = xml.find("https://example.com/a").unwrap();
        assert!(b < a);
    }

    #[test]
    fn escapes_text_and_cdata() {
        let mut a = entry("/a", "2021-01-01T00:00:00Z", &[]);
        a.title = "Fish & <Chips>".to_string();
        a.author = "Ann".to_string();
        a.content = "x ]]> y".to_string();
        let entries = vec![a];

        let xml = atom_feed(&config(), items(&entries)).unwrap();

        assert!(xml.contains("<title>Fish &amp; &lt;Chips&gt;</title>"));
        assert!(xml.contains("<author><name>Ann</name></author>"));
        assert!(xml.contains("x ]]]]><![CDATA[> y"));
    }

    #[test]
    fn config_from_site() {
        let site = SiteConfig {
            title: "T".to_string(),
            url: "https://example.com/".to_string(),
            id: "urn:x".to_string(),
            ..Default::default()
        };

        let feed = FeedConfig::from(&site);

        assert_eq!(feed.url, "https://example.com");
        assert_eq!(feed.id, "urn:x");
    }
}

//! The site index and the ordering policy shared by templates, index pages
//! and the feed.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::path::PathBuf;

use plinth_entry::{Entry, SiteConfig};

/// Every entry of a build, keyed by site path.
///
/// Built once before any rendering starts and never modified afterwards, so
/// a page may look up any other page regardless of traversal order.
#[derive(Debug, Default)]
pub struct SiteIndex {
    entries: Vec<Entry>,
    by_path: HashMap<String, usize>,
}

impl SiteIndex {
    /// Build an index from entries in traversal order.
    pub fn new(entries: Vec<Entry>) -> Result<Self, IndexError> {
        let mut by_path = HashMap::with_capacity(entries.len());

        for (i, entry) in entries.iter().enumerate() {
            if let Some(prev) = by_path.insert(entry.site_path.clone(), i) {
                return Err(IndexError::DuplicatePath {
                    site_path: entry.site_path.clone(),
                    first: entries[prev].file_path.clone(),
                    second: entry.file_path.clone(),
                });
            }
        }

        Ok(Self { entries, by_path })
    }

    /// Look up an entry by site path.
    pub fn get(&self, site_path: &str) -> Option<&Entry> {
        self.by_path.get(site_path).map(|&i| &self.entries[i])
    }

    /// All entries in traversal order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dated entries, newest first.
    pub fn chronological(&self) -> Vec<&Entry> {
        sort_by_date(&self.entries)
    }
}

/// Read-only state shared by every render of a build.
#[derive(Debug, Default)]
pub struct SiteContext {
    pub config: SiteConfig,
    pub index: SiteIndex,
}

impl SiteContext {
    pub fn new(config: SiteConfig, index: SiteIndex) -> Self {
        Self { config, index }
    }
}

/// Drop undated entries and order the rest newest first.
///
/// RFC3339 dates with fixed-width fields sort lexicographically in
/// chronological order, so the date strings are compared directly. The sort
/// is stable: entries sharing a date keep their input order.
pub fn sort_by_date<E: Borrow<Entry>>(entries: impl IntoIterator<Item = E>) -> Vec<E> {
    let mut dated: Vec<E> = entries
        .into_iter()
        .filter(|e| e.borrow().is_dated())
        .collect();
    dated.sort_by(|a, b| b.borrow().date.cmp(&a.borrow().date));
    dated
}

/// Entries carrying `label`.
pub fn with_label<E: Borrow<Entry>>(entries: impl IntoIterator<Item = E>, label: &str) -> Vec<E> {
    entries
        .into_iter()
        .filter(|e| e.borrow().has_label(label))
        .collect()
}

/// Entries not carrying `label`.
pub fn without_label<E: Borrow<Entry>>(
    entries: impl IntoIterator<Item = E>,
    label: &str,
) -> Vec<E> {
    entries
        .into_iter()
        .filter(|e| !e.borrow().has_label(label))
        .collect()
}

/// The first `n` items, or all of them if there are fewer.
pub fn top_n<T>(mut items: Vec<T>, n: usize) -> Vec<T> {
    items.truncate(n);
    items
}

/// Errors that can occur when assembling the index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Duplicate site path {site_path}: {} and {}", .first.display(), .second.display())]
    DuplicatePath {
        site_path: String,
        first: PathBuf,
        second: PathBuf,
    },
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn entry(site_path: &str, date: &str, labels: &[&str]) -> Entry {
        Entry {
            site_path: site_path.to_string(),
            file_path: PathBuf::from(format!("posts{site_path}")),
            title: format!("Title {site_path}"),
            date: date.to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            ..Default::default()
        }
    }

    fn paths(entries: &[&Entry]) -> Vec<String> {
        entries.iter().map(|e| e.site_path.clone()).collect()
    }

    #[test]
    fn sorts_newest_first_and_drops_undated() {
        let entries = vec![
            entry("/a", "2021-01-01T00:00:00Z", &[]),
            entry("/b", "2021-06-01T00:00:00Z", &[]),
            entry("/c", "", &[]),
        ];

        let sorted = sort_by_date(&entries);

        assert_eq!(paths(&sorted), vec!["/b", "/a"]);
    }

    #[test]
    fn sort_is_non_increasing_and_stable() {
        let entries = vec![
            entry("/1", "2020-03-01T00:00:00Z", &[]),
            entry("/2", "2022-03-01T00:00:00Z", &[]),
            entry("/3", "", &[]),
            entry("/4", "2020-03-01T00:00:00Z", &[]),
            entry("/5", "2019-12-31T23:59:59Z", &[]),
        ];

        let sorted = sort_by_date(&entries);

        assert!(sorted.windows(2).all(|w| w[0].date >= w[1].date));
        assert!(sorted.iter().all(|e| e.is_dated()));
        assert_eq!(paths(&sorted), vec!["/2", "/1", "/4", "/5"]);
    }

    #[test]
    fn filters_by_label() {
        let entries = vec![
            entry("/a", "", &["rust"]),
            entry("/b", "", &["go"]),
            entry("/c", "", &["rust", "go"]),
        ];

        assert_eq!(paths(&with_label(&entries, "rust")), vec!["/a", "/c"]);
        assert_eq!(paths(&without_label(&entries, "rust")), vec!["/b"]);
        assert!(with_label(&entries, "zig").is_empty());
    }

    #[test]
    fn takes_top_n() {
        assert_eq!(top_n(vec![1, 2, 3], 2), vec![1, 2]);
        assert_eq!(top_n(vec![1, 2], 5), vec![1, 2]);
        assert!(top_n(vec![1, 2], 0).is_empty());
    }

    #[test]
    fn looks_up_by_site_path() {
        let index = SiteIndex::new(vec![entry("/a", "", &[]), entry("/b", "", &[])]).unwrap();

        assert_eq!(index.len(), 2);
        assert!(!index.is_empty());
        assert!(SiteIndex::default().is_empty());
        assert_eq!(index.get("/b").map(|e| e.title.as_str()), Some("Title /b"));
        assert!(index.get("/missing").is_none());
        assert_eq!(index.entries()[0].site_path, "/a");
    }

    #[test]
    fn rejects_duplicate_paths() {
        let result = SiteIndex::new(vec![entry("/a", "", &[]), entry("/a", "", &[])]);

        assert!(matches!(result, Err(IndexError::DuplicatePath { ref site_path, .. }) if site_path == "/a"));
    }
}

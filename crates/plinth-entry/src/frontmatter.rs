//! Metadata block extraction and parsing.
//!
//! A content file may carry its metadata in an HTML comment so the file
//! stays a valid fragment:
//!
//! ```html
//! <!-- CONFIG
//! title: Hello
//! date: 2021-06-01T00:00:00Z
//! CONFIG -->
//! <p>Body</p>
//! ```

use serde::Deserialize;

/// Opening marker of a metadata block.
pub const OPEN_MARKER: &str = "<!-- CONFIG";

/// Closing marker of a metadata block.
pub const CLOSE_MARKER: &str = "CONFIG -->";

/// Metadata exactly as written in a block. Every key is optional and
/// unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Frontmatter {
    /// Entry kind (`page`, `index` or `feed`)
    #[serde(rename = "type")]
    pub kind: Option<String>,

    pub title: Option<String>,

    /// Short summary shown on link cards
    #[serde(alias = "description")]
    pub snippet: Option<String>,

    pub image: Option<String>,

    /// RFC3339 publication date
    pub date: Option<String>,

    pub author: Option<String>,

    #[serde(alias = "tags")]
    pub labels: Vec<String>,

    pub related: Vec<String>,

    /// Layout override
    pub template: Option<String>,

    /// Content format (`html` or `markdown`)
    pub parser: Option<String>,
}

/// Byte offsets of a metadata block inside a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    /// Start of the opening marker
    start: usize,
    /// Start of the closing marker
    close: usize,
    /// First byte after the block and its trailing line break
    end: usize,
}

fn locate(source: &str) -> Option<Block> {
    let start = source.find(OPEN_MARKER)?;
    let yaml_start = start + OPEN_MARKER.len();
    let close = yaml_start + source[yaml_start..].find(CLOSE_MARKER)?;

    let mut end = close + CLOSE_MARKER.len();
    let rest = &source[end..];
    let blank = rest.len() - rest.trim_start_matches(|c: char| c == ' ' || c == '\t').len();
    let after = &rest[blank..];
    if after.starts_with("\r\n") {
        end += blank + 2;
    } else if after.starts_with('\n') {
        end += blank + 1;
    }

    Some(Block { start, close, end })
}

/// Remove the metadata block, including the line break that follows it.
///
/// Content without both markers is returned unchanged.
pub fn strip_metadata_block(source: &str) -> String {
    match locate(source) {
        Some(block) => format!("{}{}", &source[..block.start], &source[block.end..]),
        None => source.to_string(),
    }
}

/// Extract the metadata block from a content file.
///
/// Returns the parsed metadata (if a block is present) and the content with
/// the block removed.
pub fn extract_frontmatter(source: &str) -> Result<(Option<Frontmatter>, String), FrontmatterError> {
    let Some(block) = locate(source) else {
        return Ok((None, source.to_string()));
    };

    let yaml = &source[block.start + OPEN_MARKER.len()..block.close];
    let frontmatter = if yaml.trim().is_empty() {
        Frontmatter::default()
    } else {
        serde_yaml::from_str(yaml).map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?
    };

    let content = format!("{}{}", &source[..block.start], &source[block.end..]);
    Ok((Some(frontmatter), content))
}

/// Errors that can occur when parsing a metadata block.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Invalid YAML in metadata block: {0}")]
    InvalidYaml(String),
}

//! Content entries for plinth sites.
//!
//! This crate reads one content file at a time: it extracts the embedded
//! metadata block, validates it, applies the site-wide defaults, and produces
//! an [`Entry`]. It knows nothing about other entries.

pub mod entry;
pub mod frontmatter;
pub mod parser;
pub mod site;

pub use entry::{ContentFormat, Entry, EntryKind};
pub use frontmatter::{extract_frontmatter, strip_metadata_block, Frontmatter, FrontmatterError};
pub use parser::{parse_entry, render_markdown, validate_date, DateError, ParseError};
pub use site::{ConfigError, SiteConfig};

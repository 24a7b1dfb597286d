//! Static site generator for plinth.
//!
//! Builds pages, index listings and an Atom feed from a tree of content
//! entries, with every render able to see every other entry.

pub mod assets;
pub mod builder;
pub mod expand;
pub mod feed;
pub mod index;
pub mod markers;
pub mod templates;

pub use assets::{AssetError, AssetProbe, HttpProbe};
pub use builder::{BuildConfig, BuildError, BuildResult, BuiltPage, StaticBuilder};
pub use feed::{atom_feed, FeedConfig, FeedError, FeedItem};
pub use index::{IndexError, SiteContext, SiteIndex};
pub use templates::{PageRenderer, RenderError, TemplateEngine};

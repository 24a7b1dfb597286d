//! Static site builder.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use walkdir::{DirEntry, WalkDir};

use plinth_entry::{parse_entry, Entry, EntryKind, ParseError, SiteConfig};

use crate::assets::{collect_asset_urls, rewrite_asset_urls, validate_assets, AssetError, AssetProbe, HttpProbe};
use crate::expand::{expand_raw, expand_rendered, related_trailer};
use crate::feed::{atom_feed, FeedConfig, FeedError, FeedItem};
use crate::index::{IndexError, SiteContext, SiteIndex};
use crate::templates::{RenderError, TemplateEngine};

/// Configuration for building a static site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Content root
    pub source_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Template directory
    pub templates_dir: PathBuf,

    /// HEAD-check every referenced asset before writing output
    pub verify_assets: bool,

    /// Timeout for each asset request
    pub asset_timeout: Duration,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("posts"),
            output_dir: PathBuf::from("website"),
            templates_dir: PathBuf::from("templates"),
            verify_assets: true,
            asset_timeout: Duration::from_secs(10),
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of pages generated, index pages included
    pub pages: usize,

    /// Number of feeds generated
    pub feeds: usize,

    /// Number of asset URLs checked
    pub assets: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Source directory not found: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("Failed to load templates: {0}")]
    Templates(#[source] RenderError),

    #[error("{}: {source}", .path.display())]
    Page {
        path: PathBuf,
        #[source]
        source: RenderError,
    },

    #[error("{}: Can't create feed: {source}", .path.display())]
    Feed {
        path: PathBuf,
        #[source]
        source: FeedError,
    },

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One finished output file.
#[derive(Debug, Clone)]
pub struct BuiltPage {
    pub site_path: String,

    /// Rendered body before layout wrapping and asset rewriting
    pub body: String,

    /// Final file contents
    pub output: String,
}

/// Static site builder.
pub struct StaticBuilder {
    config: BuildConfig,
    site: SiteConfig,
    probe: Box<dyn AssetProbe>,
}

impl StaticBuilder {
    /// Create a new static builder that checks assets over HTTP.
    pub fn new(config: BuildConfig, site: SiteConfig) -> Self {
        let probe = Box::new(HttpProbe::new(config.asset_timeout));
        Self {
            config,
            site,
            probe,
        }
    }

    /// Replace the asset probe.
    pub fn with_probe(mut self, probe: impl AssetProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Build the static site.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        let index = SiteIndex::new(self.discover_entries()?)?;
        if index.is_empty() {
            tracing::warn!("No entries found in {}", self.config.source_dir.display());
        } else {
            tracing::info!(
                "Parsed {} entries from {}",
                index.len(),
                self.config.source_dir.display()
            );
        }

        let site = Arc::new(SiteContext::new(self.site.clone(), index));
        let engine = self.load_templates(&site)?;

        let pages = self.render_pages(&engine, &site)?;
        let assets = self.check_assets(&site, &pages)?;
        self.write_pages(&pages)?;

        let feeds = site
            .index
            .entries()
            .iter()
            .filter(|e| e.kind == EntryKind::Feed)
            .count();
        let duration = start.elapsed();

        Ok(BuildResult {
            pages: pages.len() - feeds,
            feeds,
            assets,
            duration_ms: duration.as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Parse every file under the source root, in file-name order.
    fn discover_entries(&self) -> Result<Vec<Entry>, BuildError> {
        let root = &self.config.source_dir;
        if !root.is_dir() {
            return Err(BuildError::MissingSource(root.clone()));
        }

        let mut entries = Vec::new();

        for item in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden_dir(e))
        {
            let item = item.map_err(|e| BuildError::Read {
                path: root.clone(),
                source: e.into(),
            })?;
            if !item.file_type().is_file() {
                continue;
            }

            let path = item.path();
            let source = fs::read_to_string(path).map_err(|source| BuildError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let site_path = site_path(root, path);

            tracing::debug!("Parsing {} as {}", path.display(), site_path);
            entries.push(parse_entry(&source, path, &site_path, &self.site)?);
        }

        Ok(entries)
    }

    fn load_templates(&self, site: &Arc<SiteContext>) -> Result<TemplateEngine, BuildError> {
        let mut engine = TemplateEngine::new(Arc::clone(site)).map_err(BuildError::Templates)?;

        let dir = &self.config.templates_dir;
        if dir.is_dir() {
            let count = engine.load_dir(dir).map_err(BuildError::Templates)?;
            tracing::info!("Loaded {} templates from {}", count, dir.display());
        } else {
            tracing::warn!("Template directory not found: {}", dir.display());
        }

        let link = &site.config.link_template;
        if !engine.has_template(link) {
            tracing::warn!("Link card template not found: {}", link);
        }

        Ok(engine)
    }

    /// Render every entry. Pages render in parallel; feeds are assembled
    /// afterwards from the rendered bodies.
    fn render_pages(
        &self,
        engine: &TemplateEngine,
        site: &SiteContext,
    ) -> Result<Vec<BuiltPage>, BuildError> {
        let entries = site.index.entries();

        let results: Vec<Result<BuiltPage, BuildError>> = entries
            .par_iter()
            .map(|entry| {
                self.render_page(engine, entry)
                    .map_err(|source| BuildError::Page {
                        path: entry.file_path.clone(),
                        source,
                    })
            })
            .collect();

        // First failure in traversal order.
        let mut pages = results.into_iter().collect::<Result<Vec<_>, _>>()?;

        let feed_config = FeedConfig::from(&site.config);
        let mut feeds = Vec::new();
        for (i, entry) in entries.iter().enumerate() {
            if entry.kind != EntryKind::Feed {
                continue;
            }

            let items = entries
                .iter()
                .zip(&pages)
                .filter(|(e, _)| e.kind != EntryKind::Feed)
                .map(|(entry, page)| FeedItem {
                    entry,
                    content: &page.body,
                });
            let xml = atom_feed(&feed_config, items).map_err(|source| BuildError::Feed {
                path: entry.file_path.clone(),
                source,
            })?;
            feeds.push((i, self.rewrite_assets(xml)));
        }
        for (i, xml) in feeds {
            pages[i].output = xml;
        }

        Ok(pages)
    }

    /// Raw macros, body template, rendered markers, related trailer, index
    /// listing, layout, asset rewriting.
    fn render_page(&self, engine: &TemplateEngine, entry: &Entry) -> Result<BuiltPage, RenderError> {
        if entry.kind == EntryKind::Feed {
            return Ok(BuiltPage {
                site_path: entry.site_path.clone(),
                body: String::new(),
                output: String::new(),
            });
        }

        tracing::debug!("Rendering {}", entry.site_path);
        let renderer = engine.for_entry(entry);

        let raw = expand_raw(&renderer, &entry.content)?;
        let rendered = renderer.render_body(&raw)?;
        let mut body = expand_rendered(&renderer, &rendered)?;
        body.push_str(&related_trailer(&renderer, entry)?);

        if entry.kind == EntryKind::Index {
            for target in renderer.site().index.chronological() {
                body.push_str(&renderer.link_card(target)?);
            }
        }

        let page = renderer.render_layout(&body)?;

        Ok(BuiltPage {
            site_path: entry.site_path.clone(),
            body,
            output: self.rewrite_assets(page),
        })
    }

    fn rewrite_assets(&self, text: String) -> String {
        match self.site.asset_base() {
            Some(base) => rewrite_asset_urls(&text, base),
            None => text,
        }
    }

    /// HEAD-check every asset referenced by a rendered body or an entry
    /// image. Returns the number of URLs checked.
    fn check_assets(&self, site: &SiteContext, pages: &[BuiltPage]) -> Result<usize, BuildError> {
        if !self.config.verify_assets {
            return Ok(0);
        }
        let Some(base) = self.site.asset_base() else {
            tracing::warn!("image_url is not set, skipping asset check");
            return Ok(0);
        };

        let texts = pages
            .iter()
            .map(|p| p.body.as_str())
            .chain(site.index.entries().iter().map(|e| e.image.as_str()));
        let urls = collect_asset_urls(base, texts);

        tracing::info!("Checking {} assets", urls.len());
        validate_assets(self.probe.as_ref(), &urls)?;

        Ok(urls.len())
    }

    fn write_pages(&self, pages: &[BuiltPage]) -> Result<(), BuildError> {
        for page in pages {
            let path = self.output_path(&page.site_path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|source| BuildError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(&path, &page.output).map_err(|source| BuildError::Write {
                path: path.clone(),
                source,
            })?;
        }

        Ok(())
    }

    /// Output location of a site path.
    pub fn output_path(&self, site_path: &str) -> PathBuf {
        self.config.output_dir.join(site_path.trim_start_matches('/'))
    }
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(|s| s.starts_with('.'))
}

/// Site path of a file: its path below `root`, with a leading slash and
/// forward slashes.
fn site_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!("/{}", parts.join("/"))
}

//! Asset URL rewriting and existence checks.
//!
//! Pages refer to images and documents with root-relative `/img/...` and
//! `/pdf/...` paths. Both are served from the site's asset base URL, so
//! output is rewritten against that base and every referenced URL is checked
//! with a HEAD request before the build is accepted.

use std::collections::BTreeSet;
use std::sync::LazyLock;
use std::time::Duration;

use rayon::prelude::*;
use regex::Regex;
use ureq::Agent;

static ASSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"/(img|pdf)/[^"']*"#).expect("Invalid asset regex"));

const ASSET_PREFIXES: [&str; 2] = ["/img/", "/pdf/"];

/// Issues HEAD requests.
pub trait AssetProbe: Send + Sync {
    /// Status code for `url`, or a description of the transport failure.
    fn head(&self, url: &str) -> Result<u16, String>;
}

/// [`AssetProbe`] backed by a blocking HTTP agent.
pub struct HttpProbe {
    agent: Agent,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }
}

impl AssetProbe for HttpProbe {
    fn head(&self, url: &str) -> Result<u16, String> {
        let response = self.agent.head(url).call().map_err(|e| e.to_string())?;
        Ok(response.status().as_u16())
    }
}

/// Absolute URLs of every asset referenced by `texts`, deduplicated and
/// sorted.
pub fn collect_asset_urls<'a>(
    base: &str,
    texts: impl IntoIterator<Item = &'a str>,
) -> BTreeSet<String> {
    texts
        .into_iter()
        .flat_map(|text| ASSET_RE.find_iter(text))
        .map(|m| format!("{}{}", base, &m.as_str()[4..]))
        .collect()
}

/// Check that every URL answers 200.
///
/// Requests run in parallel. When several fail, the error names the
/// smallest failing URL.
pub fn validate_assets(probe: &dyn AssetProbe, urls: &BTreeSet<String>) -> Result<(), AssetError> {
    let failure = urls
        .par_iter()
        .filter_map(|url| {
            tracing::debug!("HEAD {}", url);
            match probe.head(url) {
                Ok(200) => None,
                Ok(status) => Some(AssetError::Status {
                    url: url.clone(),
                    status,
                }),
                Err(message) => Some(AssetError::Transport {
                    url: url.clone(),
                    message,
                }),
            }
        })
        .min_by(|a, b| a.url().cmp(b.url()));

    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Point root-relative asset paths at `base`.
pub fn rewrite_asset_urls(text: &str, base: &str) -> String {
    let replacement = format!("{base}/");
    ASSET_PREFIXES
        .iter()
        .fold(text.to_string(), |acc, prefix| acc.replace(*prefix, &replacement))
}

/// Errors that can occur when checking assets.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Asset {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Asset {url} could not be fetched: {message}")]
    Transport { url: String, message: String },
}

impl AssetError {
    pub fn url(&self) -> &str {
        match self {
            Self::Status { url, .. } | Self::Transport { url, .. } => url,
        }
    }
}

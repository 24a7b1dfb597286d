//! Site-wide configuration (`ssg.yaml`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name of the link-card partial used when the config does not set one.
pub const DEFAULT_LINK_TEMPLATE: &str = "post-link";

/// Global defaults shared by every entry of a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Default layout template name
    pub template: String,

    /// Site title, also the fallback entry title
    pub title: String,

    /// Absolute site URL without a trailing slash (e.g. `https://example.com`)
    pub url: String,

    /// Fallback entry author
    pub author: String,

    /// Fallback entry image
    pub image: String,

    /// Absolute base URL that `/img/` and `/pdf/` references resolve against
    #[serde(alias = "image-url")]
    pub image_url: String,

    /// Partial used to render link cards
    #[serde(alias = "link-template")]
    pub link_template: String,

    /// Feed identifier; empty means `url`
    pub id: String,

    /// Free-form data passed through to templates verbatim
    pub custom: BTreeMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            template: String::new(),
            title: String::new(),
            url: String::new(),
            author: String::new(),
            image: String::new(),
            image_url: String::new(),
            link_template: DEFAULT_LINK_TEMPLATE.to_string(),
            id: String::new(),
            custom: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    /// Parse a site configuration document.
    pub fn from_yaml(source: &str) -> Result<Self, ConfigError> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut config: Self =
            serde_yaml::from_str(source).map_err(|e| ConfigError::InvalidYaml(e.to_string()))?;
        if config.link_template.is_empty() {
            config.link_template = DEFAULT_LINK_TEMPLATE.to_string();
        }
        Ok(config)
    }

    /// Identifier written into the feed header.
    pub fn feed_id(&self) -> &str {
        if self.id.is_empty() {
            &self.url
        } else {
            &self.id
        }
    }

    /// Asset base URL without a trailing slash, or `None` when unset.
    pub fn asset_base(&self) -> Option<&str> {
        let base = self.image_url.trim_end_matches('/');
        (!base.is_empty()).then_some(base)
    }
}

/// Errors that can occur when loading the site configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid site configuration: {0}")]
    InvalidYaml(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_scalar_document() {
        assert!(matches!(
            SiteConfig::from_yaml("Fancy Feet"),
            Err(ConfigError::InvalidYaml(_))
        ));
    }

    #[test]
    fn ignores_unknown_keys() {
        let config = SiteConfig::from_yaml("template: title-blah\nunknown: unknown-blah").unwrap();

        assert_eq!(config.template, "title-blah");
        assert_eq!(config.link_template, DEFAULT_LINK_TEMPLATE);
    }

    #[test]
    fn reads_all_fields() {
        let config = SiteConfig::from_yaml(
            r#"
template: base
title: title-blah
image: image-blah
url: https://example.com
author: author-blah
image-url: https://cdn.example/
link-template: card
custom:
  image: image-blah
"#,
        )
        .unwrap();

        assert_eq!(config.title, "title-blah");
        assert_eq!(config.image, "image-blah");
        assert_eq!(config.author, "author-blah");
        assert_eq!(config.image_url, "https://cdn.example/");
        assert_eq!(config.asset_base(), Some("https://cdn.example"));
        assert_eq!(config.link_template, "card");
        assert_eq!(config.feed_id(), "https://example.com");
        assert_eq!(
            config.custom.get("image"),
            Some(&serde_yaml::Value::String("image-blah".to_string()))
        );
    }

    #[test]
    fn empty_document_is_default() {
        let config = SiteConfig::from_yaml("  \n").unwrap();

        assert_eq!(config, SiteConfig::default());
        assert_eq!(config.asset_base(), None);
    }
}

//! Static site build command.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plinth_entry::SiteConfig;
use plinth_static::{BuildConfig, StaticBuilder};

/// Load the site configuration.
pub fn load_config(path: &Path) -> Result<SiteConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = SiteConfig::from_yaml(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Run the build command.
pub fn run(config_path: &Path, output: PathBuf, verify_assets: bool) -> Result<()> {
    tracing::info!("Building site...");

    let site = load_config(config_path)?;

    let config = BuildConfig {
        output_dir: output,
        verify_assets,
        ..Default::default()
    };

    let result = StaticBuilder::new(config, site)
        .build()
        .context("Build failed")?;

    tracing::info!(
        "Built {} pages and {} feeds in {}ms",
        result.pages,
        result.feeds,
        result.duration_ms
    );
    if verify_assets {
        tracing::info!("Checked {} assets", result.assets);
    }

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_yaml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ssg.yaml");
        fs::write(&path, "title: Blog\ntemplate: base\n").unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.title, "Blog");
        assert_eq!(config.template, "base");
    }

    #[test]
    fn missing_config_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.yaml");

        let err = load_config(&path).unwrap_err();

        assert!(err.to_string().contains("nope.yaml"));
    }
}

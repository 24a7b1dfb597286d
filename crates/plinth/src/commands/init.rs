//! Initialize a starter site.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};

/// Run the init command.
pub fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing plinth site...");

    scaffold(Path::new("."), config_path, yes)?;

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'plinth build' to generate the site.");

    Ok(())
}

/// Write the starter files under `root`. Existing files are kept unless
/// `yes` is set.
fn scaffold(root: &Path, config_path: &Path, yes: bool) -> Result<()> {
    let posts_dir = root.join("posts");

    if posts_dir.exists() {
        if !yes {
            tracing::warn!("posts/ directory already exists. Use --yes to overwrite.");
            return Ok(());
        }
    } else {
        fs::create_dir_all(&posts_dir).context("Failed to create posts directory")?;
    }
    fs::create_dir_all(root.join("templates")).context("Failed to create templates directory")?;

    let today = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let first_post = DEFAULT_POST.replace("{date}", &today);

    let files = [
        (root.join(config_path), DEFAULT_CONFIG),
        (posts_dir.join("index.html"), DEFAULT_INDEX),
        (posts_dir.join("feed.xml"), DEFAULT_FEED),
        (posts_dir.join("hello.html"), first_post.as_str()),
        (root.join("templates/base.html"), DEFAULT_LAYOUT),
        (root.join("templates/post-link.html"), DEFAULT_POST_LINK),
    ];

    for (path, content) in files {
        if path.exists() && !yes {
            continue;
        }
        fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Created {}", path.display());
    }

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# plinth site configuration

# Layout used when an entry does not name one
template: base

title: My Blog
url: https://example.com
author: Your Name

# Default card image
image: /img/default.png

# /img/ and /pdf/ links are served from here and checked on build
image-url: ""

# Anything under custom is passed to templates as site.custom
custom:
  tagline: Notes and experiments
"#;

const DEFAULT_INDEX: &str = r#"<!-- CONFIG
type: index
title: Home
CONFIG -->
<h1>{{ site.title }}</h1>
<p>{{ site.custom.tagline }}</p>
"#;

const DEFAULT_FEED: &str = r#"<!-- CONFIG
type: feed
CONFIG -->
"#;

const DEFAULT_POST: &str = r#"<!-- CONFIG
title: Hello, world
date: {date}
snippet: The first post on this site
labels: [meta]
CONFIG -->
<p>Welcome to your new site. Every page can reach every other one:</p>
<ul>
{% for p in topN(sort(allPosts()), 5) %}  <li><a href="{{ p.site_path }}">{{ p.title }}</a></li>
{% endfor %}</ul>
"#;

const DEFAULT_LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ post.title }} - {{ site.title }}</title>
</head>
<body>
  <main>
{{ Body }}
  </main>
</body>
</html>
"#;

const DEFAULT_POST_LINK: &str = r#"<div class="post-link">
  <a href="{{ post.site_path }}"><h3>{{ post.title }}</h3></a>
  <p>{{ post.description }}</p>
</div>
"#;

//! Template engine for rendering entries.
//!
//! Every render sees the same function registry, bound to the shared
//! [`SiteContext`]:
//!
//! | function | result |
//! |---|---|
//! | `siteConfig()` | the site configuration |
//! | `post()` | the entry being rendered (also readable as `post.title`) |
//! | `getPost(path)` | the entry at `path`, or an empty entry |
//! | `allPosts()` | every entry in traversal order |
//! | `sort(list)` | dated entries, newest first |
//! | `filter(list, label)` / `exclude(list, label)` | label selection |
//! | `topN(list, n)` | the first `n` items |
//! | `recurse(text, data)` | renders `text` as a template against `data` |

use std::path::{Path, PathBuf};
use std::sync::Arc;

use minijinja::value::{from_args, Enumerator, Object, ObjectRepr, ViaDeserialize};
use minijinja::{context, AutoEscape, Environment, Error, ErrorKind, State, UndefinedBehavior, Value};
use walkdir::WalkDir;

use plinth_entry::Entry;

use crate::index::{self, SiteContext};

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
    site: Arc<SiteContext>,
}

impl TemplateEngine {
    /// Create an engine with the function registry and built-in templates.
    pub fn new(site: Arc<SiteContext>) -> Result<Self, RenderError> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);

        env.add_template_owned(POST_LINK_NAME.to_string(), POST_LINK_TEMPLATE.to_string())?;

        register_functions(&mut env, &site);

        Ok(Self { env, site })
    }

    /// Register a template under `name`, replacing any previous one.
    pub fn add_template(&mut self, name: &str, source: &str) -> Result<(), RenderError> {
        self.env
            .add_template_owned(name.to_string(), source.to_string())?;
        Ok(())
    }

    /// Register every file under `dir`, keyed by its relative path without
    /// the extension (`templates/base.html` becomes `base`).
    ///
    /// Returns the number of templates loaded.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, RenderError> {
        let mut count = 0;

        for entry in WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
        {
            let entry = entry.map_err(|e| RenderError::Read {
                path: dir.to_path_buf(),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(name) = template_name(dir, path) else {
                continue;
            };
            let source = std::fs::read_to_string(path).map_err(|source| RenderError::Read {
                path: path.to_path_buf(),
                source,
            })?;

            tracing::debug!("Loaded template {} from {}", name, path.display());
            self.add_template(&name, &source)?;
            count += 1;
        }

        Ok(count)
    }

    pub fn site(&self) -> &SiteContext {
        &self.site
    }

    /// Whether a template is registered under `name`.
    pub fn has_template(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }

    /// A renderer for one entry. `post()` is bound to `entry` on a copy of
    /// the base environment.
    pub fn for_entry(&self, entry: &Entry) -> PageRenderer {
        let current = Value::from_object(CurrentEntry(Value::from_serialize(entry)));

        let mut env = self.env.clone();
        env.add_global("post", current.clone());

        PageRenderer {
            env,
            site: Arc::clone(&self.site),
            site_value: Value::from_serialize(&self.site.config),
            site_path: entry.site_path.clone(),
            layout: if entry.template.is_empty() {
                self.site.config.template.clone()
            } else {
                entry.template.clone()
            },
            current,
        }
    }
}

/// Renders the pieces of a single entry.
pub struct PageRenderer {
    env: Environment<'static>,
    site: Arc<SiteContext>,
    site_value: Value,
    site_path: String,
    layout: String,
    current: Value,
}

impl PageRenderer {
    pub fn site(&self) -> &SiteContext {
        &self.site
    }

    /// Execute `text` as the page body template.
    pub fn render_body(&self, text: &str) -> Result<String, RenderError> {
        Ok(self.env.render_str(
            text,
            context! {
                post => &self.current,
                site => &self.site_value,
            },
        )?)
    }

    /// Wrap a rendered body in the entry's layout, or the site default.
    pub fn render_layout(&self, body: &str) -> Result<String, RenderError> {
        if self.layout.is_empty() {
            return Err(RenderError::NoLayout);
        }

        let template = self.template(&self.layout)?;
        Ok(template.render(context! {
            Body => body,
            post => &self.current,
            site => &self.site_value,
        })?)
    }

    /// Run the macro template `name` at the current position.
    pub fn render_macro(&self, name: &str) -> Result<String, RenderError> {
        let template = self.template(name).map_err(|e| match e {
            RenderError::MissingTemplate(name) => RenderError::UnknownMacro(name),
            other => other,
        })?;

        Ok(template.render(context! {
            url => &self.site_path,
            post => &self.current,
            site => &self.site_value,
        })?)
    }

    /// Render the link card of `target` with the configured partial. Inside
    /// the partial `post` is the target, as a value and as a call.
    pub fn link_card(&self, target: &Entry) -> Result<String, RenderError> {
        let template = self.template(&self.site.config.link_template)?;
        Ok(template.render(context! {
            post => Value::from_object(CurrentEntry(Value::from_serialize(target))),
            site => &self.site_value,
        })?)
    }

    fn template(&self, name: &str) -> Result<minijinja::Template<'_, '_>, RenderError> {
        self.env.get_template(name).map_err(|e| match e.kind() {
            ErrorKind::TemplateNotFound => RenderError::MissingTemplate(name.to_string()),
            _ => RenderError::Template(e),
        })
    }
}

fn register_functions(env: &mut Environment<'static>, site: &Arc<SiteContext>) {
    let config = Value::from_serialize(&site.config);
    env.add_function("siteConfig", move || config.clone());

    let all = Value::from_serialize(site.index.entries());
    env.add_function("allPosts", move || all.clone());

    let lookup = Arc::clone(site);
    env.add_function("getPost", move |path: String| match lookup.index.get(&path) {
        Some(entry) => Value::from_serialize(entry),
        None => Value::from_serialize(Entry::default()),
    });

    env.add_function("sort", |list: ViaDeserialize<Vec<Entry>>| {
        Value::from_serialize(index::sort_by_date(list.0))
    });
    env.add_function("filter", |list: ViaDeserialize<Vec<Entry>>, label: String| {
        Value::from_serialize(index::with_label(list.0, &label))
    });
    env.add_function("exclude", |list: ViaDeserialize<Vec<Entry>>, label: String| {
        Value::from_serialize(index::without_label(list.0, &label))
    });
    env.add_function("topN", |list: Vec<Value>, n: usize| index::top_n(list, n));
    env.add_function("recurse", recurse);
}

/// Render a template fragment against arbitrary data, with the same
/// functions and templates as the caller. Nesting depth is not limited.
fn recurse(state: &State, text: String, data: Value) -> Result<String, Error> {
    state.env().render_str(&text, data)
}

/// The entry being rendered. Readable as a map (`post.title`) and callable
/// (`post().title`).
#[derive(Debug)]
struct CurrentEntry(Value);

impl Object for CurrentEntry {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Map
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        self.0.get_item(key).ok().filter(|v| !v.is_undefined())
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        match self.0.try_iter() {
            Ok(keys) => Enumerator::Values(keys.collect()),
            Err(_) => Enumerator::Empty,
        }
    }

    fn call(self: &Arc<Self>, _state: &State<'_, '_>, args: &[Value]) -> Result<Value, Error> {
        let () = from_args(args)?;
        Ok(self.0.clone())
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}

fn template_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?.with_extension("");
    let name = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?
        .join("/");
    (!name.is_empty()).then_some(name)
}

/// Errors that can occur while rendering an entry.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Template not found: {0}")]
    MissingTemplate(String),

    #[error("No template name: the entry sets none and the site has no default")]
    NoLayout,

    #[error("Unknown macro: {0}")]
    UnknownMacro(String),

    #[error("Unresolved references: {}", .0.join(", "))]
    UnresolvedReferences(Vec<String>),

    #[error("Unknown related entry: {0}")]
    UnknownRelated(String),

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Name of the built-in link-card partial.
pub const POST_LINK_NAME: &str = "post-link";

const POST_LINK_TEMPLATE: &str = r##"<div class="post-link">
  <a href="{{ post.site_path }}">
    {% if post.image %}<img src="{{ post.image }}" alt="{{ post.title }}">{% endif %}
    <h3>{{ post.title }}</h3>
  </a>
  <p>{{ post.description }}</p>
</div>
"##;

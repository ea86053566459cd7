//! Layout templates and post rendering, built on the Tera template engine
//!
//! A layout is a named Tera template. Built-in layouts (`base`, `post`,
//! `page`, `index`, `category`) are embedded in the binary; a site can add
//! or override them with `*.html` files in its layout directory.

mod filters;

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tera::{Context, Tera};
use walkdir::WalkDir;

use crate::config::SiteConfig;
use crate::content::{MarkdownRenderer, Metadata, Post, PostCollection};
use crate::error::RenderError;

const BUILTIN_LAYOUTS: [(&str, &str); 5] = [
    ("base.html", include_str!("default/base.html")),
    ("post.html", include_str!("default/post.html")),
    ("page.html", include_str!("default/page.html")),
    ("index.html", include_str!("default/index.html")),
    ("category.html", include_str!("default/category.html")),
];

/// Mapping from layout name to template
pub struct Layouts {
    tera: Tera,
}

impl Layouts {
    /// Only the embedded layouts
    pub fn builtin() -> Result<Self, RenderError> {
        Self::build(BUILTIN_LAYOUTS.iter().map(|(n, s)| (n.to_string(), s.to_string())))
    }

    /// Embedded layouts, overridden and extended by `*.html` files in `dir`.
    /// A missing directory yields the built-in set.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        let mut templates: IndexMap<String, String> = BUILTIN_LAYOUTS
            .iter()
            .map(|(n, s)| (n.to_string(), s.to_string()))
            .collect();

        if dir.exists() {
            for entry in WalkDir::new(dir)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("html") {
                    continue;
                }
                let name = path
                    .strip_prefix(dir)?
                    .to_string_lossy()
                    .replace('\\', "/");
                let source = fs::read_to_string(path)?;
                if templates.insert(name.clone(), source).is_some() {
                    tracing::debug!("Layout {} overrides the built-in one", name);
                }
            }
        }

        Ok(Self::build(templates)?)
    }

    /// Layouts from in-memory sources; names may omit the `.html` suffix
    pub fn from_map<I, K, V>(layouts: I) -> Result<Self, RenderError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self::build(
            layouts
                .into_iter()
                .map(|(name, source)| (template_name(name.as_ref()), source.into())),
        )
    }

    fn build<I>(templates: I) -> Result<Self, RenderError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut tera = Tera::default();
        // Layouts escape explicitly with `| escape`; paths and HTML pass through
        tera.autoescape_on(vec![]);
        tera.add_raw_templates(templates)?;
        filters::register(&mut tera);
        Ok(Self { tera })
    }

    /// Whether a layout of this name exists
    pub fn contains(&self, layout: &str) -> bool {
        let name = template_name(layout);
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Layout names, sorted, without the `.html` suffix
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tera
            .get_template_names()
            .map(|n| n.trim_end_matches(".html").to_string())
            .collect();
        names.sort();
        names
    }

    /// Render a layout by name
    pub fn render(&self, layout: &str, context: &Context) -> Result<String, RenderError> {
        if !self.contains(layout) {
            return Err(RenderError::LayoutNotFound(layout.to_string()));
        }
        Ok(self.tera.render(&template_name(layout), context)?)
    }
}

fn template_name(layout: &str) -> String {
    if layout.ends_with(".html") {
        layout.to_string()
    } else {
        format!("{}.html", layout)
    }
}

/// Renders posts and listing pages through layouts
pub struct Renderer {
    layouts: Layouts,
    markdown: MarkdownRenderer,
}

impl Renderer {
    pub fn new(layouts: Layouts, markdown: MarkdownRenderer) -> Self {
        Self { layouts, markdown }
    }

    pub fn layouts(&self) -> &Layouts {
        &self.layouts
    }

    /// Render a single post with its own layout
    pub fn render_post(&self, post: &Post, site: &SiteData) -> Result<String, RenderError> {
        self.render_post_between(post, site, None, None)
    }

    /// Render a post with links to its newer and older neighbours
    pub fn render_post_between(
        &self,
        post: &Post,
        site: &SiteData,
        newer: Option<&Post>,
        older: Option<&Post>,
    ) -> Result<String, RenderError> {
        if !self.layouts.contains(&post.layout) {
            return Err(RenderError::LayoutNotFound(post.layout.clone()));
        }
        self.render_post_data(&self.post_data(post, site), site, newer, older)
    }

    /// Render an already prepared post view with its own layout
    pub fn render_post_data(
        &self,
        post: &PostData,
        site: &SiteData,
        newer: Option<&Post>,
        older: Option<&Post>,
    ) -> Result<String, RenderError> {
        let mut context = Context::new();
        context.insert("site", site);
        context.insert("post", post);
        if let Some(newer) = newer {
            context.insert("newer", &NavPost::from(newer));
        }
        if let Some(older) = older {
            context.insert("older", &NavPost::from(older));
        }

        self.layouts.render(&post.layout, &context)
    }

    /// Render an index or category listing
    pub fn render_listing(&self, layout: &str, context: &Context) -> Result<String, RenderError> {
        self.layouts.render(layout, context)
    }

    /// Template view of a post, with its markdown rendered
    pub fn post_data(&self, post: &Post, site: &SiteData) -> PostData {
        let excerpt = MarkdownRenderer::split_excerpt(&post.body).map(|e| self.markdown.render(e));

        PostData {
            title: post.title.clone(),
            layout: post.layout.clone(),
            date: post.date,
            path: post.path.clone(),
            permalink: format!("{}{}", site.url.trim_end_matches('/'), post.path),
            categories: post
                .categories
                .iter()
                .map(|name| CategoryLink::new(name, site))
                .collect(),
            tags: post.tags.clone(),
            content: self.markdown.render(&post.body),
            excerpt,
            extra: post.extra.clone(),
        }
    }
}

/// Site-wide data available to every layout as `site`
#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub url: String,
    pub root: String,
    pub date_format: String,
    pub category_dir: String,
    pub post_count: usize,
    pub categories: Vec<CategoryData>,
}

impl SiteData {
    pub fn new(config: &SiteConfig, posts: &PostCollection) -> Self {
        let mut site = Self {
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            language: config.language.clone(),
            url: config.url.clone(),
            root: config.root.clone(),
            date_format: config.date_format.clone(),
            category_dir: config.category_dir.clone(),
            post_count: posts.len(),
            categories: Vec::new(),
        };

        let groups = posts.categories();
        let paths = category_paths(
            &config.root,
            &config.category_dir,
            groups.keys().map(String::as_str),
        );
        let categories = groups
            .iter()
            .map(|(name, posts)| CategoryData {
                name: name.clone(),
                path: paths[name].clone(),
                count: posts.len(),
            })
            .collect();
        site.categories = categories;

        site
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryData {
    pub name: String,
    pub path: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryLink {
    pub name: String,
    pub path: String,
}

impl CategoryLink {
    pub fn new(name: &str, site: &SiteData) -> Self {
        let path = match site.categories.iter().find(|c| c.name == name) {
            Some(category) => category.path.clone(),
            None => category_path(&site.root, &site.category_dir, &slug::slugify(name)),
        };
        Self {
            name: name.to_string(),
            path,
        }
    }
}

/// URL paths of category listings, e.g. `/categories/open-source/`, keyed by
/// name. Each name gets its own path: a slug already taken by another
/// category gets a `-2`, `-3`... suffix, an empty slug becomes `category`.
pub fn category_paths<'a, I>(root: &str, category_dir: &str, names: I) -> IndexMap<String, String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut paths = IndexMap::new();
    let mut taken = HashSet::new();

    for name in names {
        if paths.contains_key(name) {
            continue;
        }
        let mut base = slug::slugify(name);
        if base.is_empty() {
            tracing::warn!("Category {:?} has no usable slug", name);
            base = "category".to_string();
        }
        let mut slug = base.clone();
        let mut n = 2;
        while taken.contains(&slug) {
            slug = format!("{}-{}", base, n);
            n += 1;
        }
        if slug != base {
            tracing::warn!(
                "Category {:?} shares the slug {:?} with another category, using {:?}",
                name,
                base,
                slug
            );
        }
        paths.insert(name.to_string(), category_path(root, category_dir, &slug));
        taken.insert(slug);
    }

    paths
}

fn category_path(root: &str, category_dir: &str, slug: &str) -> String {
    format!(
        "{}/{}/{}/",
        root.trim_end_matches('/'),
        category_dir.trim_matches('/'),
        slug
    )
}

/// Template view of a post
#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub title: String,
    pub layout: String,
    pub date: DateTime<FixedOffset>,
    pub path: String,
    pub permalink: String,
    pub categories: Vec<CategoryLink>,
    pub tags: Vec<String>,
    pub content: String,
    pub excerpt: Option<String>,
    pub extra: Metadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavPost {
    pub title: String,
    pub path: String,
}

impl From<&Post> for NavPost {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            path: post.path.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationData {
    pub current: usize,
    pub total: usize,
    pub prev_link: Option<String>,
    pub next_link: Option<String>,
}

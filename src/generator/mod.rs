//! Generator module - writes the static site to the public directory

use anyhow::{Context as _, Result};
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tera::Context;
use walkdir::WalkDir;

use crate::content::loader::is_markdown_file;
use crate::content::{MarkdownRenderer, PostCollection};
use crate::templates::{Layouts, PaginationData, PostData, Renderer, SiteData};
use crate::Folio;

/// What a build produced
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub posts: usize,
    pub skipped: usize,
    pub index_pages: usize,
    pub category_pages: usize,
    pub assets: usize,
}

/// Static site generator
pub struct Generator {
    site: Folio,
    renderer: Renderer,
}

impl Generator {
    /// Create a generator using the site's layout directory
    pub fn new(site: &Folio) -> Result<Self> {
        let layouts = Layouts::from_dir(&site.layout_dir)
            .with_context(|| format!("Failed to load layouts from {:?}", site.layout_dir))?;
        let markdown = MarkdownRenderer::with_options(
            &site.config.highlight.theme,
            site.config.highlight.enable,
        );

        Ok(Self {
            site: site.clone(),
            renderer: Renderer::new(layouts, markdown),
        })
    }

    /// Generate the entire site
    pub fn generate(&self, posts: &PostCollection) -> Result<BuildReport> {
        fs::create_dir_all(&self.site.public_dir)?;

        let site_data = SiteData::new(&self.site.config, posts);
        // Markdown is rendered once per post, newest first, and shared by
        // post, index and category pages
        let rendered: Vec<PostData> = posts
            .by_date()
            .map(|post| self.renderer.post_data(post, &site_data))
            .collect();
        let mut report = BuildReport::default();

        self.generate_post_pages(posts, &rendered, &site_data, &mut report)?;
        report.index_pages = self.generate_index_pages(&rendered, &site_data)?;
        report.category_pages = self.generate_category_pages(posts, &rendered, &site_data)?;
        report.assets = self.copy_source_assets()?;

        Ok(report)
    }

    /// Generate individual post pages
    fn generate_post_pages(
        &self,
        posts: &PostCollection,
        rendered: &[PostData],
        site_data: &SiteData,
        report: &mut BuildReport,
    ) -> Result<()> {
        for ((newer, post, older), data) in posts.by_date_with_neighbors().zip(rendered) {
            let html = match self
                .renderer
                .render_post_data(data, site_data, newer, older)
            {
                Ok(html) => html,
                Err(e) if self.site.config.strict => {
                    return Err(anyhow::Error::new(e)
                        .context(format!("Failed to render {}", post.source)));
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", post.source, e);
                    report.skipped += 1;
                    continue;
                }
            };

            let output_path = self.output_for(&post.path);
            write_page(&output_path, &html)?;
            tracing::debug!("Generated post: {:?}", output_path);
            report.posts += 1;
        }

        Ok(())
    }

    /// Generate index pages with pagination
    fn generate_index_pages(&self, rendered: &[PostData], site_data: &SiteData) -> Result<usize> {
        let all: Vec<&PostData> = rendered.iter().collect();
        let root = self.site.config.root.trim_end_matches('/');
        let pages = self.paginate(&all, |page| {
            if page == 1 {
                format!("{}/", root)
            } else {
                format!("{}/{}/{}/", root, self.site.config.pagination_dir, page)
            }
        });

        for (link, posts_data, pagination) in &pages {
            let mut context = Context::new();
            context.insert("site", site_data);
            context.insert("posts", posts_data);
            context.insert("pagination", pagination);

            let html = self.renderer.render_listing("index", &context)?;
            write_page(&self.output_for(link), &html)?;
        }

        tracing::info!("Generated {} index pages", pages.len());
        Ok(pages.len())
    }

    /// Generate one listing page per category
    fn generate_category_pages(
        &self,
        posts: &PostCollection,
        rendered: &[PostData],
        site_data: &SiteData,
    ) -> Result<usize> {
        if site_data.categories.is_empty() {
            return Ok(0);
        }
        if !self.renderer.layouts().contains("category") {
            tracing::warn!("No category layout, skipping category pages");
            return Ok(0);
        }

        let mut groups: IndexMap<&str, Vec<&PostData>> = IndexMap::new();
        for (post, data) in posts.by_date().zip(rendered) {
            for category in &post.categories {
                groups.entry(category.as_str()).or_default().push(data);
            }
        }

        for category in &site_data.categories {
            let posts_data = groups.get(category.name.as_str()).cloned().unwrap_or_default();

            let mut context = Context::new();
            context.insert("site", site_data);
            context.insert("category", &category.name);
            context.insert("posts", &posts_data);

            let html = self.renderer.render_listing("category", &context)?;
            write_page(&self.output_for(&category.path), &html)?;
        }

        tracing::info!("Generated {} category pages", site_data.categories.len());
        Ok(site_data.categories.len())
    }

    /// Split posts into listing pages of `per_page`; an empty site still
    /// gets one (empty) index page
    fn paginate<'a, F>(
        &self,
        posts: &[&'a PostData],
        link_for: F,
    ) -> Vec<(String, Vec<&'a PostData>, PaginationData)>
    where
        F: Fn(usize) -> String,
    {
        let per_page = self.site.config.page_size();
        let total = posts.len().div_ceil(per_page).max(1);

        (1..=total)
            .map(|current| {
                let start = (current - 1) * per_page;
                let end = (start + per_page).min(posts.len());
                let pagination = PaginationData {
                    current,
                    total,
                    prev_link: (current > 1).then(|| link_for(current - 1)),
                    next_link: (current < total).then(|| link_for(current + 1)),
                };
                (link_for(current), posts[start..end].to_vec(), pagination)
            })
            .collect()
    }

    /// Copy non-markdown files under the source dir (images, etc.)
    fn copy_source_assets(&self) -> Result<usize> {
        let source_dir = &self.site.source_dir;
        if !source_dir.exists() {
            return Ok(0);
        }
        let exclude = self.site.config.exclude_patterns();
        let mut copied = 0;

        for entry in WalkDir::new(source_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || is_markdown_file(path) {
                continue;
            }

            let relative = path.strip_prefix(source_dir)?;
            // `_posts`, `_drafts`, dotfiles and the like are never published
            let hidden = relative.components().any(|c| {
                c.as_os_str()
                    .to_str()
                    .map(|s| s.starts_with('_') || s.starts_with('.'))
                    .unwrap_or(false)
            });
            if hidden || exclude.iter().any(|p| p.matches_path(relative)) {
                continue;
            }

            let dest = self.site.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)
                .with_context(|| format!("Failed to copy {:?} to {:?}", path, dest))?;
            tracing::debug!("Copied: {:?} -> {:?}", path, dest);
            copied += 1;
        }

        Ok(copied)
    }

    /// Map a URL path to the file written for it
    fn output_for(&self, url_path: &str) -> PathBuf {
        let root = format!("{}/", self.site.config.root.trim_matches('/'));
        let relative = url_path.trim_start_matches('/');
        let relative = relative
            .strip_prefix(root.as_str())
            .filter(|_| root != "/")
            .unwrap_or(relative);

        let target = self.site.public_dir.join(relative);
        if relative.is_empty() || relative.ends_with('/') {
            target.join("index.html")
        } else if Path::new(relative).extension().is_some() {
            target
        } else {
            target.join("index.html")
        }
    }
}

fn write_page(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create dir {:?}", parent))?;
    }
    fs::write(path, html).with_context(|| format!("Failed to write {:?}", path))
}

//! Content loader - loads posts from the source directory

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::date::parse_timezone;
use super::{Post, PostCollection, PostContext};
use crate::Folio;

/// Loads posts from `source/_posts` (and `source/_drafts` when enabled)
pub struct ContentLoader<'a> {
    site: &'a Folio,
    timezone: Option<Tz>,
    exclude: Vec<glob::Pattern>,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Folio) -> Self {
        Self {
            site,
            timezone: parse_timezone(&site.config.timezone),
            exclude: site.config.exclude_patterns(),
        }
    }

    /// Load every post. Broken documents are skipped with a warning unless
    /// the site is configured as strict.
    pub fn load_posts(&self) -> Result<PostCollection> {
        let mut posts = Vec::new();

        let mut dirs = vec![self.site.source_dir.join("_posts")];
        if self.site.config.render_drafts {
            dirs.push(self.site.source_dir.join("_drafts"));
        }

        let now = Utc::now();

        for dir in dirs.iter().filter(|d| d.exists()) {
            // Sorted walk keeps tie order stable across platforms
            for entry in WalkDir::new(dir)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if !path.is_file() || !is_markdown_file(path) || self.is_excluded(path) {
                    continue;
                }

                let post = match self.load_post(path) {
                    Ok(post) => post,
                    Err(e) if self.site.config.strict => return Err(e),
                    Err(e) => {
                        tracing::warn!("Skipping {:?}: {:#}", path, e);
                        continue;
                    }
                };

                if !post.published && !self.site.config.render_drafts {
                    tracing::debug!("Skipping unpublished post {:?}", path);
                    continue;
                }
                if !self.site.config.future && post.date > now {
                    tracing::debug!("Skipping future post {:?}", path);
                    continue;
                }

                posts.push(post);
            }
        }

        Ok(PostCollection::new(posts))
    }

    /// Load a single post from a file
    pub fn load_post(&self, path: &Path) -> Result<Post> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled")
            .to_string();

        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(|t| DateTime::<Utc>::from(t).fixed_offset());

        let source = path
            .strip_prefix(&self.site.source_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        let ctx = PostContext {
            default_layout: self.site.config.default_layout.clone(),
            timezone: self.timezone,
            fallback_title: Some(stem.clone()),
            fallback_date: modified,
            // The permalink `:title` is the file name, not the display title
            slug: Some(slug::slugify(&stem)),
            source,
            root: self.site.config.root.clone(),
            permalink: self.site.config.permalink.clone(),
        };

        Post::from_source(&content, &ctx).with_context(|| format!("Failed to parse {:?}", path))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.site.source_dir).unwrap_or(path);
        self.exclude.iter().any(|p| p.matches_path(relative))
    }
}

/// Check if a file is a markdown file
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}

//! Post model

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use serde::Serialize;

use super::date::parse_date;
use super::frontmatter::{FrontMatter, Metadata};
use crate::error::ParseError;

/// A parsed blog post. Never mutated after construction.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    /// Layout template to use
    pub layout: String,

    /// Post title
    pub title: String,

    /// Publication date, with the offset it was written in
    pub date: DateTime<FixedOffset>,

    /// Post categories, in front-matter order
    pub categories: Vec<String>,

    /// Post tags
    pub tags: Vec<String>,

    /// Raw markdown body
    pub body: String,

    /// Whether the post is published
    pub published: bool,

    /// URL-friendly name
    pub slug: String,

    /// Source file path relative to the source dir
    pub source: String,

    /// URL path (starts with the site root)
    pub path: String,

    /// Custom front-matter fields
    pub extra: Metadata,
}

/// Everything outside the document that shapes a post
#[derive(Debug, Clone)]
pub struct PostContext {
    pub default_layout: String,
    pub timezone: Option<Tz>,
    /// Used when the front matter has no title
    pub fallback_title: Option<String>,
    /// Used when the front matter has no date
    pub fallback_date: Option<DateTime<FixedOffset>>,
    /// Taken from the title when `None`
    pub slug: Option<String>,
    pub source: String,
    pub root: String,
    pub permalink: String,
}

impl Default for PostContext {
    fn default() -> Self {
        Self {
            default_layout: "post".to_string(),
            timezone: None,
            fallback_title: None,
            fallback_date: None,
            slug: None,
            source: String::new(),
            root: "/".to_string(),
            permalink: ":year/:month/:day/:title/".to_string(),
        }
    }
}

impl Post {
    /// Build a post from a whole document (front matter + body)
    pub fn from_source(content: &str, ctx: &PostContext) -> Result<Self, ParseError> {
        let (fm, body) = FrontMatter::parse(content)?;
        Self::from_front_matter(fm, body, ctx)
    }

    /// Build a post from already parsed front matter
    pub fn from_front_matter(
        fm: FrontMatter,
        body: &str,
        ctx: &PostContext,
    ) -> Result<Self, ParseError> {
        let title = non_blank(fm.title)
            .or_else(|| non_blank(ctx.fallback_title.clone()))
            .ok_or(ParseError::MissingField("title"))?;

        let layout = non_blank(fm.layout)
            .or_else(|| non_blank(Some(ctx.default_layout.clone())))
            .ok_or(ParseError::MissingField("layout"))?;

        let date = match fm.date {
            Some(raw) => {
                parse_date(&raw, ctx.timezone).ok_or(ParseError::InvalidDate(raw))?
            }
            None => ctx.fallback_date.ok_or(ParseError::MissingField("date"))?,
        };

        let slug = ctx
            .slug
            .clone()
            .unwrap_or_else(|| slug::slugify(&title));
        let path = permalink_path(&ctx.permalink, &ctx.root, &date, &slug, &fm.categories);

        Ok(Self {
            layout,
            title,
            date,
            categories: fm.categories,
            tags: fm.tags,
            body: body.to_string(),
            published: fm.published,
            slug,
            source: ctx.source.clone(),
            path,
            extra: fm.extra,
        })
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Expand a permalink pattern such as `:year/:month/:day/:title/`
pub fn permalink_path(
    pattern: &str,
    root: &str,
    date: &DateTime<FixedOffset>,
    slug: &str,
    categories: &[String],
) -> String {
    let category = categories
        .first()
        .map(|c| slug::slugify(c))
        .unwrap_or_default();

    // `:i_month` and `:i_day` first so `:month`/`:day` don't eat their suffix
    let result = pattern
        .replace(":i_month", &date.format("%-m").to_string())
        .replace(":i_day", &date.format("%-d").to_string())
        .replace(":year", &date.format("%Y").to_string())
        .replace(":month", &date.format("%m").to_string())
        .replace(":day", &date.format("%d").to_string())
        .replace(":title", slug)
        .replace(":category", &category)
        .replace("//", "/");

    format!(
        "{}/{}",
        root.trim_end_matches('/'),
        result.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_from_source() {
        let content = "---\nlayout: post\ntitle: Hello World\ndate: 2024-01-15 10:30:00 +0800\ncategories: rust blog\n---\n\nBody";
        let post = Post::from_source(content, &PostContext::default()).unwrap();
        assert_eq!(post.layout, "post");
        assert_eq!(post.title, "Hello World");
        assert_eq!(post.categories, vec!["rust", "blog"]);
        assert_eq!(post.body, "Body");
        assert_eq!(post.slug, "hello-world");
        assert_eq!(post.path, "/2024/01/15/hello-world/");
    }

    #[test]
    fn test_defaults_fill_layout_and_title() {
        let ctx = PostContext {
            default_layout: "page".to_string(),
            fallback_title: Some("from-file".to_string()),
            slug: Some("from-file".to_string()),
            ..Default::default()
        };
        let post = Post::from_source("---\ndate: 2025-01-01\n---\nx", &ctx).unwrap();
        assert_eq!(post.layout, "page");
        assert_eq!(post.title, "from-file");
        assert_eq!(post.path, "/2025/01/01/from-file/");
    }

    #[test]
    fn test_missing_title() {
        let err = Post::from_source("---\ntitle: '  '\ndate: 2025-01-01\n---\n", &PostContext::default())
            .unwrap_err();
        assert!(matches!(err, ParseError::MissingField("title")));
    }

    #[test]
    fn test_blank_layout_without_default() {
        let ctx = PostContext {
            default_layout: String::new(),
            ..Default::default()
        };
        let err = Post::from_source("---\ntitle: A\ndate: 2025-01-01\n---\n", &ctx).unwrap_err();
        assert!(matches!(err, ParseError::MissingField("layout")));
    }

    #[test]
    fn test_missing_and_bad_dates() {
        let err = Post::from_source("---\ntitle: A\n---\n", &PostContext::default()).unwrap_err();
        assert!(matches!(err, ParseError::MissingField("date")));

        let err = Post::from_source("---\ntitle: A\ndate: someday\n---\n", &PostContext::default())
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidDate(ref d) if d == "someday"));
    }

    #[test]
    fn test_permalink_tokens() {
        let date = DateTime::parse_from_rfc3339("2024-03-05T08:00:00+00:00").unwrap();
        let cats = vec!["Open Source".to_string()];
        assert_eq!(
            permalink_path(":category/:i_month/:i_day/:title.html", "/blog/", &date, "x", &cats),
            "/blog/open-source/3/5/x.html"
        );
        assert_eq!(
            permalink_path(":category/:title/", "/", &date, "x", &[]),
            "/x/"
        );
    }
}

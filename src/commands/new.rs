//! Create a new post

use anyhow::{bail, Result};
use chrono::{DateTime, FixedOffset, Local};
use std::fs;
use std::path::PathBuf;

use crate::Folio;

const DEFAULT_SCAFFOLD: &str = "---\nlayout: {{ layout }}\ntitle: \"{{ title }}\"\ndate: {{ date }}\n---\n";

/// Create a post skeleton in `_posts` (or `_drafts` for the `draft` layout)
pub fn create_post(
    site: &Folio,
    title: &str,
    layout: &str,
    now: DateTime<FixedOffset>,
) -> Result<PathBuf> {
    let target_dir = if layout == "draft" {
        site.source_dir.join("_drafts")
    } else {
        site.source_dir.join("_posts")
    };
    fs::create_dir_all(&target_dir)?;

    let slug = slug::slugify(title);
    if slug.is_empty() {
        bail!("Title {:?} does not produce a usable file name", title);
    }

    let filename = site
        .config
        .new_post_name
        .replace(":title", &slug)
        .replace(":year", &now.format("%Y").to_string())
        .replace(":month", &now.format("%m").to_string())
        .replace(":day", &now.format("%d").to_string());
    let file_path = target_dir.join(filename);

    if file_path.exists() {
        bail!("File already exists: {:?}", file_path);
    }

    let scaffold_path = site.base_dir.join("scaffolds").join(format!("{}.md", layout));
    let fallback_path = site.base_dir.join("scaffolds/post.md");
    let scaffold = if scaffold_path.exists() {
        fs::read_to_string(&scaffold_path)?
    } else if fallback_path.exists() {
        fs::read_to_string(&fallback_path)?
    } else {
        DEFAULT_SCAFFOLD.to_string()
    };

    // Drafts are rendered with the site's default layout once published
    let front_layout = if layout == "draft" {
        site.config.default_layout.as_str()
    } else {
        layout
    };

    let content = scaffold
        .replace("{{ layout }}", front_layout)
        .replace("{{ title }}", &escape_double_quoted(title))
        .replace("{{ date }}", &now.format("%Y-%m-%d %H:%M:%S %z").to_string());

    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}

/// Escape text for use inside a YAML double-quoted scalar
fn escape_double_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Run the new command
pub fn run(site: &Folio, title: &str, layout: Option<&str>) -> Result<PathBuf> {
    let layout = layout.unwrap_or(&site.config.default_layout);
    create_post(site, title, layout, Local::now().fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::FrontMatter;

    #[test]
    fn test_new_post_parses_back() {
        let tmp = tempfile::tempdir().unwrap();
        let config = SiteConfig {
            new_post_name: ":year-:month-:day-:title.md".to_string(),
            ..Default::default()
        };
        let site = Folio::with_config(tmp.path(), config);
        let now = DateTime::parse_from_rfc3339("2025-03-04T05:06:07+02:00").unwrap();

        let path = create_post(&site, "Reporting a \"scope\" bug", "post", now).unwrap();
        assert!(path.ends_with("_posts/2025-03-04-reporting-a-scope-bug.md"));

        let text = fs::read_to_string(&path).unwrap();
        let (fm, body) = FrontMatter::parse(&text).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Reporting a \"scope\" bug"));
        assert_eq!(fm.layout.as_deref(), Some("post"));
        assert_eq!(fm.date.as_deref(), Some("2025-03-04 05:06:07 +0200"));
        assert_eq!(body, "");

        assert!(create_post(&site, "Reporting a \"scope\" bug", "post", now).is_err());
    }

    #[test]
    fn test_backslash_titles_parse_back() {
        let tmp = tempfile::tempdir().unwrap();
        let site = Folio::with_config(tmp.path(), SiteConfig::default());
        let now = DateTime::parse_from_rfc3339("2025-03-04T05:06:07+00:00").unwrap();

        for title in ["Paths like C:\\temp", "regex \\d+ and \"quotes\""] {
            let path = create_post(&site, title, "post", now).unwrap();
            let (fm, _) = FrontMatter::parse(&fs::read_to_string(path).unwrap()).unwrap();
            assert_eq!(fm.title.as_deref(), Some(title));
        }
    }

    #[test]
    fn test_draft_goes_to_drafts() {
        let tmp = tempfile::tempdir().unwrap();
        let site = Folio::with_config(tmp.path(), SiteConfig::default());
        let now = DateTime::parse_from_rfc3339("2025-03-04T05:06:07+00:00").unwrap();

        let path = create_post(&site, "Half done", "draft", now).unwrap();
        assert!(path.ends_with("_drafts/half-done.md"));
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("layout: post"));
    }

    #[test]
    fn test_custom_scaffold() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("scaffolds")).unwrap();
        fs::write(
            tmp.path().join("scaffolds/page.md"),
            "---\nlayout: {{ layout }}\ntitle: \"{{ title }}\"\ndate: {{ date }}\ncategories: pages\n---\n",
        )
        .unwrap();
        let site = Folio::with_config(tmp.path(), SiteConfig::default());
        let now = DateTime::parse_from_rfc3339("2025-03-04T05:06:07+00:00").unwrap();

        let path = create_post(&site, "About", "page", now).unwrap();
        let (fm, _) = FrontMatter::parse(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(fm.layout.as_deref(), Some("page"));
        assert_eq!(fm.categories, vec!["pages"]);
    }
}

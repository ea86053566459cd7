//! List site content

use anyhow::Result;
use indexmap::IndexMap;

use crate::content::loader::ContentLoader;
use crate::templates::Layouts;
use crate::Folio;

/// Build the listing lines for a content type
pub fn lines(site: &Folio, content_type: &str) -> Result<Vec<String>> {
    let mut out = Vec::new();

    match content_type {
        "post" | "posts" => {
            let posts = ContentLoader::new(site).load_posts()?;
            out.push(format!("Posts ({}):", posts.len()));
            for post in posts.by_date() {
                out.push(format!(
                    "  {} - {} [{}] ({})",
                    post.date.format("%Y-%m-%d"),
                    post.title,
                    post.source,
                    post.layout
                ));
            }
        }
        "category" | "categories" => {
            let posts = ContentLoader::new(site).load_posts()?;
            let categories = posts.categories();
            out.push(format!("Categories ({}):", categories.len()));
            for (name, posts) in &categories {
                out.push(format!("  {} ({})", name, posts.len()));
            }
        }
        "tag" | "tags" => {
            let posts = ContentLoader::new(site).load_posts()?;
            let mut tags: IndexMap<&str, usize> = IndexMap::new();
            for post in posts.by_date() {
                for tag in &post.tags {
                    *tags.entry(tag.as_str()).or_insert(0) += 1;
                }
            }
            // Most used first; stable sort keeps first-seen order on ties
            tags.sort_by(|_, a, _, b| b.cmp(a));
            out.push(format!("Tags ({}):", tags.len()));
            for (tag, count) in tags {
                out.push(format!("  {} ({})", tag, count));
            }
        }
        "layout" | "layouts" => {
            let layouts = Layouts::from_dir(&site.layout_dir)?;
            let names = layouts.names();
            out.push(format!("Layouts ({}):", names.len()));
            out.extend(names.into_iter().map(|n| format!("  {}", n)));
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, category, tag, layout",
                content_type
            );
        }
    }

    Ok(out)
}

/// List site content by type
pub fn run(site: &Folio, content_type: &str) -> Result<()> {
    for line in lines(site, content_type)? {
        println!("{}", line);
    }
    Ok(())
}

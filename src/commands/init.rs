//! Initialize a new site

use anyhow::{bail, Result};
use std::fs;
use std::path::Path;

use crate::Folio;

const CONFIG_TEMPLATE: &str = r#"# Site
title: Folio
subtitle: ''
description: ''
author: John Doe
language: en
timezone: ''

# URL
url: http://example.com
root: /
permalink: :year/:month/:day/:title/

# Directory
source_dir: source
public_dir: public
layout_dir: layouts
category_dir: categories
exclude: []

# Writing
new_post_name: :title.md
default_layout: post
render_drafts: false
future: true
strict: false
highlight:
  enable: true
  theme: InspiredGitHub

# Listing
per_page: 10
pagination_dir: page
date_format: YYYY-MM-DD
"#;

const POST_SCAFFOLD: &str = r#"---
layout: {{ layout }}
title: "{{ title }}"
date: {{ date }}
categories:
---
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        bail!("{:?} already contains a site", target_dir);
    }

    fs::create_dir_all(target_dir.join("source/_posts"))?;
    fs::create_dir_all(target_dir.join("source/_drafts"))?;
    fs::create_dir_all(target_dir.join("layouts"))?;
    fs::create_dir_all(target_dir.join("scaffolds"))?;

    fs::write(&config_path, CONFIG_TEMPLATE)?;
    fs::write(target_dir.join("scaffolds/post.md"), POST_SCAFFOLD)?;

    let now = chrono::Local::now();
    let sample_post = format!(
        r#"---
layout: post
title: Hello World
date: {}
categories: meta
---

Welcome to your new blog. Posts live in `source/_posts`, one Markdown file each.

<!-- more -->

## Writing

```bash
$ folio new "My New Post"
```

## Building

```bash
$ folio generate
```

Drop a `post.html` into `layouts/` to replace the built-in post layout.
"#,
        now.format("%Y-%m-%d %H:%M:%S %z")
    );
    fs::write(target_dir.join("source/_posts/hello-world.md"), sample_post)?;

    tracing::info!("Initialized site in {:?}", target_dir);
    Ok(())
}

/// Run the init command with an existing site
pub fn run(site: &Folio) -> Result<()> {
    init_site(&site.base_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::loader::ContentLoader;

    #[test]
    fn test_init_creates_loadable_site() {
        let tmp = tempfile::tempdir().unwrap();
        init_site(tmp.path()).unwrap();

        let config = SiteConfig::load(tmp.path().join("_config.yml")).unwrap();
        assert_eq!(config.default_layout, "post");

        let site = Folio::new(tmp.path()).unwrap();
        let posts = ContentLoader::new(&site).load_posts().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts.by_date().next().unwrap().categories, vec!["meta"]);

        assert!(init_site(tmp.path()).is_err());
    }
}

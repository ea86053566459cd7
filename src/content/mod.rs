//! Content module - front matter, posts and markdown processing

mod collection;
pub mod date;
pub mod frontmatter;
pub mod loader;
mod markdown;
mod post;

pub use collection::PostCollection;
pub use frontmatter::{FrontMatter, Metadata};
pub use markdown::{html_escape, MarkdownRenderer};
pub use post::{permalink_path, Post, PostContext};

//! Error types for parsing and rendering posts

use thiserror::Error;

/// Malformed or missing front matter
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("document does not start with a `---` front-matter marker")]
    MissingOpeningMarker,

    #[error("front matter is never closed by a `---` marker")]
    UnterminatedFrontMatter,

    #[error("invalid YAML in front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("front matter is not a key-value mapping")]
    NotAMapping,

    #[error("front matter is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("unrecognized date: {0}")]
    InvalidDate(String),
}

/// Failure while turning a post into an output page
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("layout not found: {0}")]
    LayoutNotFound(String),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

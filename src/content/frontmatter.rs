//! Front-matter parsing

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ParseError;

/// Marker line that opens and closes a front-matter block
pub const MARKER: &str = "---";

/// Raw key-value pairs of a front-matter block, in document order
pub type Metadata = IndexMap<String, serde_yaml::Value>;

/// Plain YAML scalars as text, so `title: 404` or `date: 2025` still read
fn scalar_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn optional_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    scalar_text(&value)
        .map(Some)
        .ok_or_else(|| D::Error::custom("expected a string, number or boolean"))
}

/// Returns (scalar, list); both `None` for null
fn scalar_or_list<'de, D>(deserializer: D) -> Result<(Option<String>, Vec<String>), D::Error>
where
    D: Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Ok((None, Vec::new())),
        serde_yaml::Value::Sequence(items) => {
            let list = items
                .iter()
                .filter(|item| !item.is_null())
                .map(|item| {
                    scalar_text(item).ok_or_else(|| D::Error::custom("list items must be scalars"))
                })
                .collect::<Result<_, _>>()?;
            Ok((None, list))
        }
        other => scalar_text(&other)
            .map(|s| (Some(s), Vec::new()))
            .ok_or_else(|| D::Error::custom("expected a string or a list")),
    }
}

/// Categories accept a list or a single whitespace-separated string
fn words_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match scalar_or_list(deserializer)? {
        (Some(s), _) => s.split_whitespace().map(str::to_string).collect(),
        (None, list) => list,
    })
}

/// Tags accept a list or a single string naming one tag
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match scalar_or_list(deserializer)? {
        (Some(s), _) if s.trim().is_empty() => Vec::new(),
        (Some(s), _) => vec![s],
        (None, list) => list,
    })
}

/// Typed view of the front-matter keys a post understands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(deserialize_with = "optional_scalar")]
    pub layout: Option<String>,
    #[serde(deserialize_with = "optional_scalar")]
    pub title: Option<String>,
    #[serde(deserialize_with = "optional_scalar")]
    pub date: Option<String>,
    #[serde(deserialize_with = "words_or_vec")]
    pub categories: Vec<String>,
    #[serde(deserialize_with = "string_or_vec")]
    pub tags: Vec<String>,
    pub published: bool,

    /// Keys not listed above
    #[serde(flatten)]
    pub extra: Metadata,
}

impl Default for FrontMatter {
    fn default() -> Self {
        Self {
            layout: None,
            title: None,
            date: None,
            categories: Vec::new(),
            tags: Vec::new(),
            published: true,
            extra: Metadata::new(),
        }
    }
}

impl FrontMatter {
    /// Parse the typed front matter of a document.
    /// Returns (front_matter, body)
    pub fn parse(content: &str) -> Result<(Self, &str), ParseError> {
        let (block, body) = split(content)?;
        if block.trim().is_empty() {
            return Ok((FrontMatter::default(), body));
        }

        let value: serde_yaml::Value = serde_yaml::from_str(block)?;
        match value {
            serde_yaml::Value::Mapping(_) => Ok((serde_yaml::from_value(value)?, body)),
            // A block holding only comments
            serde_yaml::Value::Null => Ok((FrontMatter::default(), body)),
            _ => Err(ParseError::NotAMapping),
        }
    }
}

/// Split a document into its front-matter block and the body after it.
///
/// The first line must be the marker; the block runs until the next line that
/// is exactly the marker. Blank lines directly after the closing marker are
/// not part of the body.
pub fn split(content: &str) -> Result<(&str, &str), ParseError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let (first, mut rest) = next_line(content);
    if !is_marker(first) {
        return Err(ParseError::MissingOpeningMarker);
    }

    let block_start = offset(content, rest);
    loop {
        if rest.is_empty() {
            return Err(ParseError::UnterminatedFrontMatter);
        }
        let line_start = offset(content, rest);
        let (line, after) = next_line(rest);
        if is_marker(line) {
            let block = &content[block_start..line_start];
            let body = after.trim_start_matches(['\n', '\r']);
            return Ok((block, body));
        }
        rest = after;
    }
}

/// Parse the front-matter block as an untyped mapping.
/// Returns (metadata, body)
pub fn parse_metadata(content: &str) -> Result<(Metadata, &str), ParseError> {
    let (block, body) = split(content)?;
    if block.trim().is_empty() {
        return Ok((Metadata::new(), body));
    }

    match serde_yaml::from_str::<serde_yaml::Value>(block)? {
        serde_yaml::Value::Mapping(_) => Ok((serde_yaml::from_str(block)?, body)),
        serde_yaml::Value::Null => Ok((Metadata::new(), body)),
        _ => Err(ParseError::NotAMapping),
    }
}

/// Returns (line without terminator, remainder after terminator)
fn next_line(s: &str) -> (&str, &str) {
    match s.find('\n') {
        Some(pos) => (&s[..pos], &s[pos + 1..]),
        None => (s, ""),
    }
}

fn is_marker(line: &str) -> bool {
    line.trim_end_matches(['\r', ' ', '\t']) == MARKER
}

fn offset(whole: &str, tail: &str) -> usize {
    whole.len() - tail.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple_document() {
        let (block, body) = split("---\ntitle: A\ndate: 2025-01-01\n---\nBody").unwrap();
        assert_eq!(block, "title: A\ndate: 2025-01-01\n");
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_parse_metadata_example() {
        let (meta, body) = parse_metadata("---\ntitle: A\ndate: 2025-01-01\n---\nBody").unwrap();
        assert_eq!(meta.len(), 2);
        assert_eq!(meta["title"].as_str(), Some("A"));
        assert_eq!(meta["date"].as_str(), Some("2025-01-01"));
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_metadata_survives_reserialization() {
        let content = r#"---
layout: post
title: "Fixing a scope lookup bug"
date: 2023-04-02 21:10:00 +0800
categories: [open-source, interpreters]
draft_note: 3
---

Text
"#;
        let (meta, _) = parse_metadata(content).unwrap();
        let yaml = serde_yaml::to_string(&meta).unwrap();
        let doc = format!("---\n{}---\n", yaml);
        let (again, body) = parse_metadata(&doc).unwrap();
        assert_eq!(meta, again);
        assert_eq!(
            again.keys().collect::<Vec<_>>(),
            vec!["layout", "title", "date", "categories", "draft_note"]
        );
        assert_eq!(body, "");
    }

    #[test]
    fn test_missing_closing_marker() {
        let err = split("---\ntitle: A\nBody without end").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedFrontMatter));

        let err = parse_metadata("---\n").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedFrontMatter));

        let err = FrontMatter::parse("---\ntitle: A\n--- not a marker\n").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedFrontMatter));
    }

    #[test]
    fn test_missing_opening_marker() {
        let err = split("title: A\n---\nBody").unwrap_err();
        assert!(matches!(err, ParseError::MissingOpeningMarker));

        let err = split("\n---\ntitle: A\n---\n").unwrap_err();
        assert!(matches!(err, ParseError::MissingOpeningMarker));
    }

    #[test]
    fn test_crlf_and_bom() {
        let (meta, body) = parse_metadata("\u{feff}---\r\ntitle: A\r\n---\r\n\r\nBody\r\n").unwrap();
        assert_eq!(meta["title"].as_str(), Some("A"));
        assert_eq!(body, "Body\r\n");
    }

    #[test]
    fn test_body_keeps_later_markers() {
        let (_, body) = split("---\ntitle: A\n---\nIntro\n\n---\n\nMore").unwrap();
        assert_eq!(body, "Intro\n\n---\n\nMore");
    }

    #[test]
    fn test_empty_block() {
        let (meta, body) = parse_metadata("---\n---\nBody").unwrap();
        assert!(meta.is_empty());
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_scalar_block_is_not_mapping() {
        let err = parse_metadata("---\njust some words\n---\n").unwrap_err();
        assert!(matches!(err, ParseError::NotAMapping));

        let err = FrontMatter::parse("---\n- a\n- b\n---\n").unwrap_err();
        assert!(matches!(err, ParseError::NotAMapping));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = parse_metadata("---\ntitle: [unclosed\n---\n").unwrap_err();
        assert!(matches!(err, ParseError::Yaml(_)));
    }

    #[test]
    fn test_typed_front_matter() {
        let content = r#"---
layout: post
title: Pull request to a security framework
date: 2023-05-10 09:00:00 +0000
categories: security open-source
tags: csrf
comments: true
---
Body text
"#;
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.layout.as_deref(), Some("post"));
        assert_eq!(fm.title.as_deref(), Some("Pull request to a security framework"));
        assert_eq!(fm.date.as_deref(), Some("2023-05-10 09:00:00 +0000"));
        assert_eq!(fm.categories, vec!["security", "open-source"]);
        assert_eq!(fm.tags, vec!["csrf"]);
        assert!(fm.published);
        assert_eq!(fm.extra["comments"].as_bool(), Some(true));
        assert_eq!(body, "Body text\n");
    }

    #[test]
    fn test_category_list_and_null() {
        let (fm, _) =
            FrontMatter::parse("---\ntitle: A\ncategories:\n  - rust\n  - blog post\ntags:\n---\n")
                .unwrap();
        assert_eq!(fm.categories, vec!["rust", "blog post"]);
        assert!(fm.tags.is_empty());
    }

    #[test]
    fn test_unpublished() {
        let (fm, _) = FrontMatter::parse("---\ntitle: A\npublished: false\n---\n").unwrap();
        assert!(!fm.published);
    }

    #[test]
    fn test_numeric_scalars_become_text() {
        let (fm, _) = FrontMatter::parse(
            "---\ntitle: 404\ndate: 2025\ncategories: [2023, notes]\ntags: true\n---\n",
        )
        .unwrap();
        assert_eq!(fm.title.as_deref(), Some("404"));
        assert_eq!(fm.date.as_deref(), Some("2025"));
        assert_eq!(fm.categories, vec!["2023", "notes"]);
        assert_eq!(fm.tags, vec!["true"]);

        let err = FrontMatter::parse("---\ntitle: {nested: map}\n---\n").unwrap_err();
        assert!(matches!(err, ParseError::Yaml(_)));
    }
}

//! Markdown rendering with syntax highlighting

use lazy_static::lazy_static;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

lazy_static! {
    static ref MORE_MARKER: Regex = Regex::new(r"<!--\s*more\s*-->").unwrap();
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    highlight: bool,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options("InspiredGitHub", true)
    }

    /// Create with custom settings
    pub fn with_options(theme: &str, highlight: bool) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: theme.to_string(),
            highlight,
        }
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> String {
        // Front matter is already stripped, so no metadata block options
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_HEADING_ATTRIBUTES;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        // Some(lang) while inside a code block; lang may be empty
        let mut code_lang: Option<String> = None;
        let mut code = String::new();

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    code_lang = Some(match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .unwrap_or_default()
                            .to_string(),
                        CodeBlockKind::Indented => String::new(),
                    });
                    code.clear();
                }
                Event::End(TagEnd::CodeBlock) => {
                    let lang = code_lang.take().unwrap_or_default();
                    events.push(Event::Html(CowStr::from(self.highlight_code(&code, &lang))));
                }
                Event::Text(text) if code_lang.is_some() => code.push_str(&text),
                _ => events.push(event),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: &str) -> String {
        let syntax = if lang.is_empty() {
            None
        } else {
            self.syntax_set
                .find_syntax_by_token(lang)
                .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
        };

        let theme = self.theme_set.themes.get(&self.theme_name);

        match (self.highlight, syntax, theme) {
            (true, Some(syntax), Some(theme)) => {
                match highlighted_html_for_string(code, &self.syntax_set, syntax, theme) {
                    Ok(highlighted) => {
                        format!(r#"<figure class="highlight {}">{}</figure>"#, lang, highlighted)
                    }
                    Err(e) => {
                        tracing::debug!("Highlighting {} failed: {}", lang, e);
                        plain_code_block(code, lang)
                    }
                }
            }
            _ => plain_code_block(code, lang),
        }
    }

    /// Split off the excerpt before `<!-- more -->`
    pub fn split_excerpt(content: &str) -> Option<&str> {
        MORE_MARKER
            .find(content)
            .map(|m| content[..m.start()].trim_end())
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn plain_code_block(code: &str, lang: &str) -> String {
    if lang.is_empty() {
        format!("<pre><code>{}</code></pre>", html_escape(code))
    } else {
        format!(
            r#"<pre><code class="language-{}">{}</code></pre>"#,
            html_escape(lang),
            html_escape(code)
        )
    }
}

/// Simple HTML escaping
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Filing a bug\n\nThis is a ~~test~~.");
        assert!(html.contains("<h1>Filing a bug</h1>"));
        assert!(html.contains("<del>test</del>"));
    }

    #[test]
    fn test_render_known_language() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```rust\nfn main() {}\n```");
        assert!(html.contains(r#"<figure class="highlight rust">"#));
        assert!(html.contains("main"));
        assert!(!html.contains("```"));
    }

    #[test]
    fn test_unknown_language_is_escaped() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```nosuchlang\nif a < b && c\n```");
        assert!(html.contains(r#"<code class="language-nosuchlang">"#));
        assert!(html.contains("if a &lt; b &amp;&amp; c"));
    }

    #[test]
    fn test_highlight_disabled() {
        let renderer = MarkdownRenderer::with_options("InspiredGitHub", false);
        let html = renderer.render("    indented <code>\n");
        assert!(html.contains("<pre><code>indented &lt;code&gt;"));
    }

    #[test]
    fn test_split_excerpt() {
        let content = "This is excerpt.\n<!--more-->\nThis is more content.";
        assert_eq!(MarkdownRenderer::split_excerpt(content), Some("This is excerpt."));
        assert_eq!(MarkdownRenderer::split_excerpt("no marker"), None);
    }

    #[test]
    fn test_rule_in_body_survives() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("first\n\n---\n\nsecond");
        assert!(html.contains("<hr />"));
        assert!(html.contains("second"));
    }
}

//! Fenced code block rendering strategies.
//!
//! Each fenced block is classified by its info string and rendered by one of
//! three strategies:
//!
//! - `cardlink`: YAML body rendered as a link preview card
//! - `ad-TYPE`: admonition body rendered as a callout
//! - anything else: plain code, or syntax highlighted when enabled
//!
//! A strategy that cannot handle its block falls back to the plain code
//! block pulldown-cmark would have written.

use super::admonitions::{admonition_type, capitalize, title_line};
use super::callouts::callout_html;
use super::MarkdownRenderer;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag, TagEnd};
use serde::Deserialize;
use serde_yaml::Value;
use std::sync::OnceLock;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

/// Rendering strategy selected from a fence info string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenceKind {
    CardLink,
    Admonition { kind: String },
    Generic { lang: Option<String> },
}

impl FenceKind {
    pub fn classify(info: &str) -> Self {
        let info = info.trim();
        if info == "cardlink" {
            return FenceKind::CardLink;
        }
        if let Some(kind) = admonition_type(info) {
            return FenceKind::Admonition { kind };
        }
        let lang = info
            .split_whitespace()
            .next()
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        FenceKind::Generic { lang }
    }
}

/// Link preview card described by a `cardlink` block
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CardLink {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub favicon: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl CardLink {
    /// Parse the block body as YAML; a list uses its first element
    pub fn parse(body: &str) -> Option<Self> {
        let value = match serde_yaml::from_str::<Value>(body) {
            Ok(Value::Sequence(items)) => items.into_iter().next()?,
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("cardlink body is not YAML: {}", e);
                return None;
            }
        };
        if !value.is_mapping() {
            tracing::debug!("cardlink body is not a mapping");
            return None;
        }
        serde_yaml::from_value(value)
            .map_err(|e| tracing::debug!("cardlink fields malformed: {}", e))
            .ok()
    }

    pub fn to_html(&self) -> String {
        let url = self.url.as_deref().unwrap_or("#");
        let field = |v: &Option<String>| html_escape(v.as_deref().unwrap_or(""));

        let mut html = format!(
            r#"<a href="{}" class="link-card" target="_blank" rel="noopener noreferrer">"#,
            html_escape(url)
        );
        html.push_str(r#"<div class="link-card-content">"#);
        html.push_str(&format!(
            r#"<div class="link-card-title">{}</div>"#,
            field(&self.title)
        ));
        html.push_str(&format!(
            r#"<div class="link-card-description">{}</div>"#,
            field(&self.description)
        ));
        html.push_str(r#"<div class="link-card-meta">"#);
        if let Some(favicon) = self.favicon.as_deref().filter(|f| !f.is_empty()) {
            html.push_str(&format!(
                r#"<img src="{}" class="link-card-favicon" alt="">"#,
                html_escape(favicon)
            ));
        }
        html.push_str(&format!(
            r#"<span class="link-card-host">{}</span>"#,
            field(&self.host)
        ));
        html.push_str("</div></div>");
        if let Some(image) = self.image.as_deref().filter(|i| !i.is_empty()) {
            html.push_str(&format!(
                r#"<div class="link-card-image" style="background-image: url('{}')"></div>"#,
                html_escape(&css_url_escape(image))
            ));
        }
        html.push_str("</a>\n");
        html
    }
}

/// Characters that would terminate a quoted CSS `url('...')`
fn css_url_escape(url: &str) -> String {
    url.replace('\'', "%27")
        .replace('(', "%28")
        .replace(')', "%29")
        .replace('\\', "%5C")
}

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME: OnceLock<Option<Theme>> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme() -> Option<&'static Theme> {
    THEME
        .get_or_init(|| {
            let mut theme_set = ThemeSet::load_defaults();
            theme_set
                .themes
                .remove("InspiredGitHub")
                .or_else(|| theme_set.themes.remove("base16-ocean.light"))
        })
        .as_ref()
}

/// Syntax highlight `code` as `lang`; `None` when no theme is available
pub fn highlight_code(code: &str, lang: &str) -> Option<String> {
    let ss = syntax_set();
    let syntax = ss
        .find_syntax_by_token(lang)
        .or_else(|| ss.find_syntax_by_extension(lang))
        .unwrap_or_else(|| ss.find_syntax_plain_text());

    highlighted_html_for_string(code, ss, syntax, theme()?)
        .map_err(|e| tracing::debug!("highlighting {} failed: {}", lang, e))
        .ok()
}

/// Event pass applying the fence strategies
pub struct FenceTransformer<'r> {
    renderer: &'r MarkdownRenderer,
}

impl<'r> FenceTransformer<'r> {
    pub fn new(renderer: &'r MarkdownRenderer) -> Self {
        Self { renderer }
    }

    pub fn transform(&self, events: Vec<Event<'static>>) -> Vec<Event<'static>> {
        let mut result = Vec::with_capacity(events.len());
        let mut fence: Option<(CowStr<'static>, String)> = None;

        for event in events {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) if fence.is_none() => {
                    fence = Some((info, String::new()));
                }
                Event::Text(text) if fence.is_some() => {
                    if let Some((_, body)) = fence.as_mut() {
                        body.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) if fence.is_some() => {
                    if let Some((info, body)) = fence.take() {
                        result.extend(self.render_fence(info, body));
                    }
                }
                other => result.push(other),
            }
        }

        // An unterminated block cannot come out of pulldown-cmark, but never
        // drop content if it somehow does.
        if let Some((info, body)) = fence.take() {
            result.extend(plain_code_block(info, body));
        }

        result
    }

    fn render_fence(&self, info: CowStr<'static>, body: String) -> Vec<Event<'static>> {
        match FenceKind::classify(&info) {
            FenceKind::CardLink => match CardLink::parse(&body) {
                Some(card) => vec![Event::Html(card.to_html().into())],
                None => plain_code_block(info, body),
            },
            FenceKind::Admonition { kind } => {
                vec![Event::Html(self.render_admonition(&kind, &body).into())]
            }
            FenceKind::Generic { lang: Some(lang) } if self.renderer.options().highlight_code => {
                match highlight_code(&body, &lang) {
                    Some(html) => vec![Event::Html(html.into())],
                    None => plain_code_block(info, body),
                }
            }
            FenceKind::Generic { .. } => plain_code_block(info, body),
        }
    }

    fn render_admonition(&self, kind: &str, body: &str) -> String {
        let (title, body) = match body.split_once('\n') {
            Some((first, rest)) => match title_line(first) {
                Some(title) => (Some(title), rest),
                None => (None, body),
            },
            None => match title_line(body) {
                Some(title) => (Some(title), ""),
                None => (None, body),
            },
        };
        let title = title
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| capitalize(kind));

        callout_html(
            kind,
            &self.renderer.render_inline(&title),
            &self.renderer.render(body),
        )
    }
}

fn plain_code_block(info: CowStr<'static>, body: String) -> Vec<Event<'static>> {
    vec![
        Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))),
        Event::Text(body.into()),
        Event::End(TagEnd::CodeBlock),
    ]
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarkdownConfig;

    #[test]
    fn test_classify() {
        assert_eq!(FenceKind::classify(" cardlink "), FenceKind::CardLink);
        assert_eq!(
            FenceKind::classify("ad-Note"),
            FenceKind::Admonition {
                kind: "note".into()
            }
        );
        assert_eq!(
            FenceKind::classify("rust title=x"),
            FenceKind::Generic {
                lang: Some("rust".into())
            }
        );
        assert_eq!(FenceKind::classify(""), FenceKind::Generic { lang: None });
        assert_eq!(
            FenceKind::classify("cardlink extra"),
            FenceKind::Generic {
                lang: Some("cardlink".into())
            }
        );
    }

    #[test]
    fn test_cardlink_parse_mapping_and_list() {
        let card = CardLink::parse("url: https://example.com\ntitle: Example\n").unwrap();
        assert_eq!(card.url.as_deref(), Some("https://example.com"));
        assert_eq!(card.title.as_deref(), Some("Example"));

        let listed = CardLink::parse("- url: https://a.test\n- url: https://b.test\n").unwrap();
        assert_eq!(listed.url.as_deref(), Some("https://a.test"));

        assert!(CardLink::parse("just words").is_none());
        assert!(CardLink::parse("url: [unclosed").is_none());
        assert!(CardLink::parse("").is_none());
    }

    #[test]
    fn test_cardlink_html_is_escaped() {
        let card = CardLink {
            url: Some("https://example.com/?a=1&b=2".into()),
            title: Some("<script>alert(1)</script>".into()),
            image: Some("https://img.test/a'b.png".into()),
            ..CardLink::default()
        };
        let html = card.to_html();
        assert!(html.contains(r#"href="https://example.com/?a=1&amp;b=2""#));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("url('https://img.test/a%27b.png')"));
    }

    #[test]
    fn test_cardlink_fence_renders_card() {
        let html = MarkdownRenderer::new().render(
            "```cardlink\nurl: https://example.com\ntitle: Example Site\ndescription: A page\nhost: example.com\n```\n",
        );
        assert!(html.contains(r#"<a href="https://example.com" class="link-card""#));
        assert!(html.contains(r#"<div class="link-card-title">Example Site</div>"#));
        assert!(html.contains(r#"<span class="link-card-host">example.com</span>"#));
        assert!(!html.contains("<pre>"));
    }

    #[test]
    fn test_malformed_cardlink_falls_back_to_code() {
        let html = MarkdownRenderer::new().render("```cardlink\nnot: [valid\n```\n");
        assert!(html.contains(r#"<pre><code class="language-cardlink">"#));
        assert!(html.contains("not: [valid"));
        assert!(!html.contains("link-card"));
    }

    #[test]
    fn test_admonition_fence_renders_callout() {
        let html = MarkdownRenderer::new().render("```ad-warning\ntitle: Be *careful*\nSome **body**\n```\n");
        assert!(html.contains("callout callout-warning"));
        assert!(html.contains(
            r#"<div class="callout-title-inner">Be <em>careful</em></div>"#
        ));
        assert!(html.contains("<p>Some <strong>body</strong></p>"));
    }

    #[test]
    fn test_admonition_fence_default_title() {
        let html = MarkdownRenderer::new().render("```ad-tip\nBody\n```\n");
        assert!(html.contains(r#"<div class="callout-title-inner">Tip</div>"#));
        assert!(html.contains("<p>Body</p>"));
    }

    #[test]
    fn test_plain_fence_by_default() {
        let html = MarkdownRenderer::new().render("```rust\nfn main() {}\n```\n");
        assert_eq!(
            html,
            "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>\n"
        );
    }

    #[test]
    fn test_highlighted_fence_when_enabled() {
        let html = MarkdownRenderer::with_options(MarkdownConfig {
            highlight_code: true,
            ..MarkdownConfig::default()
        })
        .render("```rust\nfn main() {}\n```\n");
        assert!(html.contains("<pre style="));
        assert!(!html.contains("language-rust"));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_fence_without_language_is_not_highlighted() {
        let html = MarkdownRenderer::new().render("```\nraw <text>\n```\n");
        assert!(html.contains("<pre><code>raw &lt;text&gt;\n</code></pre>"));
    }
}

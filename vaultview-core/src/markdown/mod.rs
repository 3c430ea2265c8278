//! Markdown processing pipeline with Obsidian extensions.
//!
//! Parse with pulldown-cmark, rewrite callout blockquotes on an arena tree,
//! flatten back to events, then run the inline and fence passes before
//! writing HTML.

pub mod admonitions;
pub mod callouts;
pub mod fences;
pub mod icons;
pub mod mark;
pub mod tree;

#[cfg(test)]
mod test_integration;

use crate::config::MarkdownConfig;
use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};

pub use admonitions::{normalize_admonitions, AdmonitionNormalizer};
pub use callouts::{Callout, CalloutTransformer};
pub use fences::{CardLink, FenceKind, FenceTransformer};
pub use mark::MarkTransformer;
pub use tree::EventTree;

/// Markdown renderer with the Obsidian-flavoured extensions
pub struct MarkdownRenderer {
    parser_options: Options,
    config: MarkdownConfig,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::with_options(MarkdownConfig::default())
    }

    pub fn with_options(config: MarkdownConfig) -> Self {
        let mut parser_options = Options::empty();
        parser_options.insert(Options::ENABLE_TABLES);
        parser_options.insert(Options::ENABLE_FOOTNOTES);
        parser_options.insert(Options::ENABLE_STRIKETHROUGH);
        parser_options.insert(Options::ENABLE_TASKLISTS);
        parser_options.insert(Options::ENABLE_MATH);
        // ENABLE_GFM stays off: it would consume `[!NOTE]` markers itself

        Self {
            parser_options,
            config,
        }
    }

    pub fn options(&self) -> &MarkdownConfig {
        &self.config
    }

    /// Convert markdown to HTML with all custom transforms
    pub fn render(&self, markdown: &str) -> String {
        let events = self.transform(markdown);
        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Render a single line of inline markdown (no surrounding `<p>`)
    pub fn render_inline(&self, text: &str) -> String {
        let events = MarkTransformer::new().transform(self.inline_events(text));
        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Full event pipeline, exposed for callers that post-process events
    pub fn transform(&self, markdown: &str) -> Vec<Event<'static>> {
        let parser = Parser::new_ext(markdown, self.parser_options).into_offset_iter();
        let mut tree = EventTree::from_events(parser);

        let callouts = CalloutTransformer::new(markdown).transform(&mut tree);
        if callouts > 0 {
            tracing::debug!("rewrote {} callout(s)", callouts);
        }

        let events = tree.into_events(|title| self.inline_events(title));
        let events = MarkTransformer::new().transform(events);
        let events = if self.config.hard_breaks {
            hard_line_breaks(events)
        } else {
            events
        };

        FenceTransformer::new(self).transform(events)
    }

    /// Inline events of `text`; anything that does not parse as a single
    /// paragraph is kept as literal text.
    fn inline_events(&self, text: &str) -> Vec<Event<'static>> {
        let mut events = Parser::new_ext(text, self.parser_options);
        match events.next() {
            Some(Event::Start(Tag::Paragraph)) => events
                .take_while(|e| !matches!(e, Event::End(TagEnd::Paragraph)))
                .map(Event::into_static)
                .collect(),
            _ => vec![Event::Text(text.to_string().into())],
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Obsidian renders every newline inside a paragraph as a line break
fn hard_line_breaks(events: Vec<Event<'static>>) -> Vec<Event<'static>> {
    events
        .into_iter()
        .map(|event| match event {
            Event::SoftBreak => Event::HardBreak,
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_markdown() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Hello World\n\nThis is a **test**.");
        assert!(html.contains("<h1>Hello World</h1>"));
        assert!(html.contains("<strong>test</strong>"));
    }

    #[test]
    fn test_tables() {
        let renderer = MarkdownRenderer::new();
        let md = r#"
| Header 1 | Header 2 |
|----------|----------|
| Cell 1   | Cell 2   |
"#;
        let html = renderer.render(md);
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>Header 1</th>"));
    }

    #[test]
    fn test_task_lists_and_strikethrough() {
        let html = MarkdownRenderer::new().render("- [x] done\n- [ ] ~~open~~\n");
        assert!(html.contains(r#"<input disabled="" type="checkbox" checked=""/>"#));
        assert!(html.contains("<del>open</del>"));
    }

    #[test]
    fn test_math_spans() {
        let html = MarkdownRenderer::new().render("Inline $x^2$ math");
        assert!(html.contains(r#"<span class="math math-inline">x^2</span>"#));
    }

    #[test]
    fn test_soft_breaks_become_hard_breaks() {
        let html = MarkdownRenderer::new().render("line one\nline two");
        assert_eq!(html, "<p>line one<br />\nline two</p>\n");

        let soft = MarkdownRenderer::with_options(MarkdownConfig {
            hard_breaks: false,
            ..MarkdownConfig::default()
        })
        .render("line one\nline two");
        assert_eq!(soft, "<p>line one\nline two</p>\n");
    }

    #[test]
    fn test_render_inline() {
        let renderer = MarkdownRenderer::new();
        assert_eq!(renderer.render_inline("a *b* ==c=="), "a <em>b</em> <mark>c</mark>");
        assert_eq!(renderer.render_inline("1. not a list"), "1. not a list");
        assert_eq!(renderer.render_inline(""), "");
    }

    #[test]
    fn test_raw_html_passes_through() {
        let html = MarkdownRenderer::new().render("<div class=\"x\">raw</div>\n");
        assert!(html.contains("<div class=\"x\">raw</div>"));
    }
}

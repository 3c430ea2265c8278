//! Integration tests for markdown processing

use super::*;
use crate::config::MarkdownConfig;

fn renderer() -> MarkdownRenderer {
    MarkdownRenderer::with_options(MarkdownConfig {
        highlight_code: false,
        ..MarkdownConfig::default()
    })
}

/// Normalize then render, the way the pipeline sequences the two
fn render_obsidian(markdown: &str) -> String {
    renderer().render(&normalize_admonitions(markdown))
}

/// Text between the first `open` marker and the next `close` after it
fn between<'a>(html: &'a str, open: &str, close: &str) -> &'a str {
    let start = html.find(open).expect("open marker present") + open.len();
    let end = html[start..].find(close).expect("close marker present") + start;
    &html[start..end]
}

#[test]
fn test_callout_default_title_and_exact_body() {
    let html = renderer().render("> [!NOTE]\n> This is content");
    assert_eq!(
        between(&html, r#"<div class="callout-title-inner">"#, "</div>"),
        "Note"
    );
    assert_eq!(
        between(&html, "<div class=\"callout-content\">\n", "</div>"),
        "<p>This is content</p>\n"
    );
}

#[test]
fn test_callout_custom_title_and_body() {
    let html = renderer().render("> [!NOTE] Custom Title\n> Body");
    assert_eq!(
        between(&html, r#"<div class="callout-title-inner">"#, "</div>"),
        "Custom Title"
    );
    assert_eq!(
        between(&html, "<div class=\"callout-content\">\n", "</div>"),
        "<p>Body</p>\n"
    );
}

#[test]
fn test_marker_on_its_own_line_does_not_take_next_line_as_title() {
    let html = renderer().render("> [!warning]\n> Content line\n> second line");
    assert_eq!(
        between(&html, r#"<div class="callout-title-inner">"#, "</div>"),
        "Warning"
    );
    assert!(html.contains("<p>Content line<br />\nsecond line</p>"));
}

#[test]
fn test_single_admonition_yields_one_callout() {
    let html = render_obsidian("```ad-tip\nSome body\n```\nAfter\n");
    assert_eq!(html.matches("<div class=\"callout ").count(), 1);
    assert!(html.contains("callout-tip"));
    assert!(html.contains(r#"<div class="callout-title-inner">Tip</div>"#));
    assert!(!html.contains("&gt;"));
    assert!(!html.contains("<blockquote>"));
    // An unseparated line after the closing fence is a lazy continuation
    assert_eq!(
        between(&html, "<div class=\"callout-content\">\n", "</div>"),
        "<p>Some body<br />\nAfter</p>\n"
    );
}

#[test]
fn test_blank_line_after_admonition_ends_callout() {
    let html = render_obsidian("```ad-tip\nSome body\n```\n\nAfter\n");
    assert_eq!(
        between(&html, "<div class=\"callout-content\">\n", "</div>"),
        "<p>Some body</p>\n"
    );
    assert!(html.trim_end().ends_with("<p>After</p>"));
}

#[test]
fn test_admonition_with_title_and_nested_code() {
    let html = render_obsidian(
        "```ad-note\ntitle: Read *me*\nIntro\n~~~python\nx = 1\n~~~\n```\n",
    );
    assert!(html.contains(r#"<div class="callout-title-inner">Read <em>me</em></div>"#));
    assert!(html.contains("<p>Intro</p>"));
    assert!(html.contains("<pre><code class=\"language-python\">x = 1\n</code></pre>"));
    assert!(!html.contains("&gt; x = 1"));
}

#[test]
fn test_nested_admonitions_render_nested_callouts() {
    let html = render_obsidian(
        "````ad-question\nOuter\n```ad-success\nInner\n```\n````\n\nAfter\n",
    );
    assert_eq!(html.matches("<div class=\"callout ").count(), 2);
    let outer = html.find("callout-question").unwrap();
    let inner = html.find("callout-success").unwrap();
    assert!(outer < inner);
    assert!(html.contains("<p>Inner</p>"));
    assert!(html.trim_end().ends_with("<p>After</p>"));
}

#[test]
fn test_aggressive_closing_leaves_trailing_line_unprefixed() {
    let normalized =
        normalize_admonitions("```ad-question\nOuter\n```ad-success\nInner\n```\nTrailing\n```\n");
    let trailing = normalized
        .lines()
        .find(|line| line.contains("Trailing"))
        .unwrap();
    assert_eq!(trailing, "Trailing");
}

#[test]
fn test_highlight_marks() {
    let html = renderer().render("Some ==highlight== here and ==unterminated");
    assert_eq!(
        html,
        "<p>Some <mark>highlight</mark> here and ==unterminated</p>\n"
    );
}

#[test]
fn test_highlight_in_callout_title_and_body() {
    let html = renderer().render("> [!tip] A ==hot== tip\n> Stay ==cool==");
    assert!(html.contains(r#"<div class="callout-title-inner">A <mark>hot</mark> tip</div>"#));
    assert!(html.contains("<p>Stay <mark>cool</mark></p>"));
}

#[test]
fn test_highlight_not_applied_in_code() {
    let html = renderer().render("`a ==b==`\n\n```text\n==c==\n```\n");
    assert!(!html.contains("<mark>"));
}

#[test]
fn test_cardlink_inside_callout() {
    let html = render_obsidian("```ad-info\n~~~cardlink\nurl: https://a.test\ntitle: A\n~~~\n```\n");
    assert!(html.contains("callout-info"));
    assert!(html.contains(r#"<a href="https://a.test" class="link-card""#));
}

#[test]
fn test_unknown_callout_type_falls_back_to_note_icon() {
    let html = renderer().render("> [!Recipe] Pancakes\n> Flour");
    assert!(html.contains(r#"data-callout="recipe""#));
    assert!(html.contains("lucide-pencil"));
    assert!(html.contains(r#"<div class="callout-title-inner">Pancakes</div>"#));
}

#[test]
fn test_unterminated_admonition_stays_open() {
    let normalized = normalize_admonitions("```ad-note\nbody\nmore");
    assert_eq!(normalized, "> [!NOTE] Note\n> body\n> more");
    let html = renderer().render(&normalized);
    assert!(html.contains("callout-note"));
    assert!(html.contains("<p>body<br />\nmore</p>"));
}

//! Highlight marks: `==text==` becomes `<mark>text</mark>`.

use pulldown_cmark::{CowStr, Event, Tag, TagEnd};

const MARKER: &str = "==";

/// Transformer for `==highlight==` spans
///
/// Markers pair within the inline content of one block, across emphasis,
/// inline code, links and line breaks. A marker only closes an opener in
/// the same inline container, so `<mark>` never straddles a tag boundary.
/// The first `==` after an opener closes the span; there is no nesting and
/// no escaping. An opener without a closer stays literal text.
#[derive(Debug, Default)]
pub struct MarkTransformer;

/// A run of inline events split at each `==`
enum Piece {
    Event(Event<'static>),
    Text(String),
    Marker,
}

impl MarkTransformer {
    pub fn new() -> Self {
        Self
    }

    pub fn transform(&self, events: Vec<Event<'static>>) -> Vec<Event<'static>> {
        let mut result = Vec::with_capacity(events.len());
        let mut inline = Vec::new();
        let mut in_code_block = false;

        for event in events {
            if in_code_block {
                if matches!(event, Event::End(TagEnd::CodeBlock)) {
                    in_code_block = false;
                }
                result.push(event);
                continue;
            }
            if is_inline(&event) {
                inline.push(event);
                continue;
            }

            flush(&mut inline, &mut result);
            if matches!(event, Event::Start(Tag::CodeBlock(_))) {
                in_code_block = true;
            }
            result.push(event);
        }
        flush(&mut inline, &mut result);

        result
    }
}

fn is_inline(event: &Event<'_>) -> bool {
    match event {
        Event::Start(tag) => matches!(
            tag,
            Tag::Emphasis
                | Tag::Strong
                | Tag::Strikethrough
                | Tag::Superscript
                | Tag::Subscript
                | Tag::Link { .. }
                | Tag::Image { .. }
        ),
        Event::End(tag) => matches!(
            tag,
            TagEnd::Emphasis
                | TagEnd::Strong
                | TagEnd::Strikethrough
                | TagEnd::Superscript
                | TagEnd::Subscript
                | TagEnd::Link
                | TagEnd::Image
        ),
        Event::Html(_) => false,
        _ => true,
    }
}

/// Rewrite the marks of one block's inline content
fn flush(inline: &mut Vec<Event<'static>>, out: &mut Vec<Event<'static>>) {
    if inline.is_empty() {
        return;
    }
    let events = std::mem::take(inline);
    let has_marker = events
        .iter()
        .any(|e| matches!(e, Event::Text(text) if text.contains(MARKER)));
    if !has_marker {
        out.extend(events);
        return;
    }

    let pieces = split_pieces(events);
    let paired = pair_markers(&pieces);
    for (index, piece) in pieces.into_iter().enumerate() {
        match piece {
            Piece::Event(event) => out.push(event),
            Piece::Text(text) => push_text(out, &text),
            Piece::Marker => match paired[index] {
                Some(true) => out.push(Event::InlineHtml(CowStr::Borrowed("<mark>"))),
                Some(false) => out.push(Event::InlineHtml(CowStr::Borrowed("</mark>"))),
                None => push_text(out, MARKER),
            },
        }
    }
}

/// Merge adjacent text and cut it at every `==`; image alt text is left whole
fn split_pieces(events: Vec<Event<'static>>) -> Vec<Piece> {
    let mut pieces = Vec::with_capacity(events.len());
    let mut pending = String::new();
    let mut image_depth = 0usize;

    for event in events {
        match event {
            Event::Text(text) if image_depth == 0 => {
                pending.push_str(&text);
                continue;
            }
            Event::Start(Tag::Image { .. }) => image_depth += 1,
            Event::End(TagEnd::Image) => image_depth = image_depth.saturating_sub(1),
            _ => {}
        }
        split_text(&mut pending, &mut pieces);
        pieces.push(Piece::Event(event));
    }
    split_text(&mut pending, &mut pieces);

    pieces
}

fn split_text(pending: &mut String, pieces: &mut Vec<Piece>) {
    let text = std::mem::take(pending);
    let mut rest = text.as_str();
    while let Some(at) = rest.find(MARKER) {
        if at > 0 {
            pieces.push(Piece::Text(rest[..at].to_string()));
        }
        pieces.push(Piece::Marker);
        rest = &rest[at + MARKER.len()..];
    }
    if !rest.is_empty() {
        pieces.push(Piece::Text(rest.to_string()));
    }
}

/// For each marker piece: `Some(true)` opens, `Some(false)` closes, `None`
/// stays literal
fn pair_markers(pieces: &[Piece]) -> Vec<Option<bool>> {
    let mut paired = vec![None; pieces.len()];
    // One pending opener per open inline container
    let mut open: Vec<Option<usize>> = vec![None];

    for (index, piece) in pieces.iter().enumerate() {
        match piece {
            Piece::Event(Event::Start(_)) => open.push(None),
            Piece::Event(Event::End(_)) => {
                if open.len() > 1 {
                    open.pop();
                }
            }
            Piece::Marker => {
                let Some(slot) = open.last_mut() else {
                    continue;
                };
                *slot = match slot.take() {
                    // `====` has nothing to highlight; this marker opens instead
                    Some(opener) if opener + 1 == index => Some(index),
                    Some(opener) => {
                        paired[opener] = Some(true);
                        paired[index] = Some(false);
                        None
                    }
                    None => Some(index),
                };
            }
            _ => {}
        }
    }

    paired
}

fn push_text(out: &mut Vec<Event<'static>>, text: &str) {
    if let Some(Event::Text(last)) = out.last_mut() {
        let mut merged = last.to_string();
        merged.push_str(text);
        *last = CowStr::Boxed(merged.into_boxed_str());
        return;
    }
    out.push(Event::Text(CowStr::Boxed(text.to_string().into_boxed_str())));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulldown_cmark::{html, Parser};

    fn render(markdown: &str) -> String {
        let events: Vec<Event<'static>> = Parser::new(markdown).map(|e| e.into_static()).collect();
        let events = MarkTransformer::new().transform(events);
        let mut out = String::new();
        html::push_html(&mut out, events.into_iter());
        out
    }

    #[test]
    fn test_simple_highlight() {
        assert_eq!(render("==highlight=="), "<p><mark>highlight</mark></p>\n");
    }

    #[test]
    fn test_highlight_inside_sentence() {
        assert_eq!(
            render("a ==b== c ==d== e"),
            "<p>a <mark>b</mark> c <mark>d</mark> e</p>\n"
        );
    }

    #[test]
    fn test_unterminated_marker_is_literal() {
        assert_eq!(render("==unterminated"), "<p>==unterminated</p>\n");
    }

    #[test]
    fn test_first_closer_wins() {
        assert_eq!(render("==a==b=="), "<p><mark>a</mark>b==</p>\n");
    }

    #[test]
    fn test_highlight_text_is_escaped() {
        assert_eq!(render("==a < b=="), "<p><mark>a &lt; b</mark></p>\n");
    }

    #[test]
    fn test_code_is_untouched() {
        let html = render("`==x==`\n\n```\n==y==\n```\n");
        assert!(html.contains("<code>==x==</code>"));
        assert!(html.contains("==y==\n</code></pre>"));
        assert!(!html.contains("<mark>"));
    }

    #[test]
    fn test_empty_span_stays_literal() {
        assert_eq!(render("a ==== b"), "<p>a ==== b</p>\n");
    }

    #[test]
    fn test_mark_wraps_strong() {
        assert_eq!(
            render("==**important**== note"),
            "<p><mark><strong>important</strong></mark> note</p>\n"
        );
    }

    #[test]
    fn test_mark_wraps_inline_code() {
        assert_eq!(
            render("==a `x` b=="),
            "<p><mark>a <code>x</code> b</mark></p>\n"
        );
    }

    #[test]
    fn test_mark_wraps_line_break() {
        assert_eq!(render("==a\nb=="), "<p><mark>a\nb</mark></p>\n");
    }

    #[test]
    fn test_closer_of_one_span_does_not_open_the_next() {
        assert_eq!(
            render("==**important**== and ==a `x` b=="),
            "<p><mark><strong>important</strong></mark> and <mark>a <code>x</code> b</mark></p>\n"
        );
    }

    #[test]
    fn test_marks_inside_emphasis() {
        assert_eq!(
            render("*a ==b== c*"),
            "<p><em>a <mark>b</mark> c</em></p>\n"
        );
    }

    #[test]
    fn test_mark_does_not_straddle_tags() {
        assert_eq!(
            render("==a *b== c*"),
            "<p>==a <em>b== c</em></p>\n"
        );
    }

    #[test]
    fn test_opener_not_carried_past_paragraph() {
        assert_eq!(
            render("==open\n\nclose=="),
            "<p>==open</p>\n<p>close==</p>\n"
        );
    }

    #[test]
    fn test_empty_span_then_real_span() {
        assert_eq!(render("====x=="), "<p>==<mark>x</mark></p>\n");
    }
}

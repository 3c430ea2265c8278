//! Obsidian callouts: `> [!TYPE] Title` blockquotes become titled containers.
//!
//! Runs on the [`EventTree`] after block parsing. A blockquote whose first
//! paragraph starts with the marker is re-tagged as a callout; its title and
//! icon go into a title container and the original children move into a
//! content container. Other blockquotes are left alone.

use super::admonitions::capitalize;
use super::icons::icon_for;
use super::tree::{EventTree, NodeId, NodeKind};
use pulldown_cmark::{Event, Tag};
use regex::Regex;
use std::sync::OnceLock;

/// Callout header parsed from the first line of a blockquote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callout {
    /// Lowercased type keyword (`note`, `warning`, ...)
    pub kind: String,
    /// Explicit title, or the capitalized type when omitted or blank
    pub title: String,
}

fn marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Only spaces/tabs may separate the marker from its title: a bare
    // `[!NOTE]` followed by a newline must not take the next line as title.
    RE.get_or_init(|| {
        Regex::new(r"^\[!(?P<kind>[\w-]+)\](?:[ \t]+(?P<title>.*))?").expect("valid regex")
    })
}

/// Parse a callout marker at the start of `line`.
///
/// Returns the callout and the byte length of the consumed marker (and title).
pub fn parse_marker(line: &str) -> Option<(Callout, usize)> {
    let caps = marker_regex().captures(line)?;
    let kind = caps.name("kind")?.as_str().to_lowercase();
    let title = caps
        .name("title")
        .map(|m| m.as_str().trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| capitalize(&kind));
    let consumed = caps.get(0).map(|m| m.end()).unwrap_or(0);
    Some((Callout { kind, title }, consumed))
}

/// Opening tag of the callout container
pub fn container_open(kind: &str) -> String {
    let kind = html_escape(kind);
    format!("<div class=\"callout callout-{kind}\" data-callout=\"{kind}\">\n")
}

pub fn icon_markup(svg: &str) -> String {
    format!(r#"<div class="callout-icon">{svg}</div>"#)
}

/// Complete callout markup from pre-rendered title and body HTML
pub fn callout_html(kind: &str, title_html: &str, body_html: &str) -> String {
    format!(
        "{}<div class=\"callout-title\">{}<div class=\"callout-title-inner\">{}</div></div>\n<div class=\"callout-content\">\n{}</div>\n</div>\n",
        container_open(kind),
        icon_markup(icon_for(kind)),
        title_html,
        body_html
    )
}

/// Tree rewrite turning marked blockquotes into callout containers
pub struct CalloutTransformer<'s> {
    source: &'s str,
}

impl<'s> CalloutTransformer<'s> {
    /// `source` must be the exact text the tree was parsed from.
    pub fn new(source: &'s str) -> Self {
        Self { source }
    }

    /// Rewrite every callout blockquote in the tree; returns how many matched
    pub fn transform(&self, tree: &mut EventTree) -> usize {
        let mut count = 0;
        for id in tree.preorder() {
            if matches!(tree.kind(id), NodeKind::Container(Tag::BlockQuote(_)))
                && self.rewrite_blockquote(tree, id)
            {
                count += 1;
            }
        }
        count
    }

    fn rewrite_blockquote(&self, tree: &mut EventTree, quote: NodeId) -> bool {
        let Some(&paragraph) = tree.children(quote).first() else {
            return false;
        };
        if !matches!(tree.kind(paragraph), NodeKind::Container(Tag::Paragraph)) {
            return false;
        }
        let Some(&first_inline) = tree.children(paragraph).first() else {
            return false;
        };

        let start = tree.node(first_inline).range.start;
        let Some(rest) = self.source.get(start..) else {
            return false;
        };
        if !rest.starts_with("[!") {
            return false;
        }
        let first_line = rest.split('\n').next().unwrap_or(rest);
        let first_line = first_line.strip_suffix('\r').unwrap_or(first_line);
        let Some((callout, consumed)) = parse_marker(first_line) else {
            return false;
        };

        tracing::debug!("callout [{}] {:?}", callout.kind, callout.title);
        self.strip_marker(tree, paragraph, start + consumed);
        if tree.children(paragraph).is_empty() {
            tree.node_mut(quote).children.retain(|&child| child != paragraph);
        }

        let body = std::mem::take(&mut tree.node_mut(quote).children);
        let icon = tree.add_synthetic(NodeKind::CalloutIcon(icon_for(&callout.kind)), Vec::new());
        let text = tree.add_synthetic(NodeKind::CalloutTitleText(callout.title), Vec::new());
        let title = tree.add_synthetic(NodeKind::CalloutTitle, vec![icon, text]);
        let content = tree.add_synthetic(NodeKind::CalloutContent, body);

        let node = tree.node_mut(quote);
        node.kind = NodeKind::Callout {
            kind: callout.kind,
        };
        node.children = vec![title, content];
        true
    }

    /// Drop every inline node that lies before `cut`, trimming a text node
    /// that straddles it, then drop one line break right after the marker.
    fn strip_marker(&self, tree: &mut EventTree, paragraph: NodeId, cut: usize) {
        let children = tree.children(paragraph).to_vec();
        let mut kept = Vec::with_capacity(children.len());
        let mut cutting = true;

        for child in children {
            if !cutting {
                kept.push(child);
                continue;
            }

            let range = tree.node(child).range.clone();
            if range.end <= cut {
                continue;
            }
            cutting = false;

            if range.start < cut {
                if let NodeKind::Leaf(Event::Text(text)) = tree.kind(child) {
                    let offset = cut - range.start;
                    let maps_to_source = self.source.get(range.clone()) == Some(&**text);
                    if maps_to_source && text.is_char_boundary(offset) {
                        let suffix = text[offset..].to_string();
                        if suffix.is_empty() {
                            continue;
                        }
                        let node = tree.node_mut(child);
                        node.kind = NodeKind::Leaf(Event::Text(suffix.into()));
                        node.range = cut..range.end;
                    }
                }
            }
            kept.push(child);
        }

        if let Some(&first) = kept.first() {
            if matches!(
                tree.kind(first),
                NodeKind::Leaf(Event::SoftBreak | Event::HardBreak)
            ) {
                kept.remove(0);
            }
        }

        tree.node_mut(paragraph).children = kept;
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

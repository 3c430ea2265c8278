//! Arena tree over the pulldown-cmark event stream.
//!
//! Block rewrites (callouts) need to wrap existing children in new
//! containers. Doing that on a flat `Vec<Event>` means splicing and index
//! bookkeeping; here it is a matter of re-parenting child ids.

use pulldown_cmark::{Event, Tag};
use std::ops::Range;

pub type NodeId = usize;

/// Synthetic containers introduced by rewrites, rendered as raw HTML
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    /// A pulldown-cmark container (paragraph, blockquote, list, ...)
    Container(Tag<'static>),
    /// Any non-container event
    Leaf(Event<'static>),
    /// `<div class="callout callout-TYPE">`
    Callout { kind: String },
    /// `<div class="callout-title">`
    CalloutTitle,
    /// Icon markup for a callout type
    CalloutIcon(&'static str),
    /// Title text, parsed as inline markdown when the tree is flattened
    CalloutTitleText(String),
    /// `<div class="callout-content">`
    CalloutContent,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Source byte range (empty for synthetic nodes)
    pub range: Range<usize>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct EventTree {
    nodes: Vec<Node>,
}

impl EventTree {
    pub const ROOT: NodeId = 0;

    /// Build the tree from an offset-annotated event stream
    pub fn from_events<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = (Event<'a>, Range<usize>)>,
    {
        let mut tree = Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                range: 0..0,
                children: Vec::new(),
            }],
        };
        let mut open = vec![Self::ROOT];

        for (event, range) in events {
            let parent = open.last().copied().unwrap_or(Self::ROOT);
            match event {
                Event::Start(tag) => {
                    let id = tree.add(NodeKind::Container(tag.into_static()), range);
                    tree.nodes[parent].children.push(id);
                    open.push(id);
                }
                Event::End(_) => {
                    if open.len() > 1 {
                        open.pop();
                    }
                }
                leaf => {
                    let id = tree.add(NodeKind::Leaf(leaf.into_static()), range);
                    tree.nodes[parent].children.push(id);
                }
            }
        }

        tree
    }

    /// Add a detached node and return its id
    pub fn add(&mut self, kind: NodeKind, range: Range<usize>) -> NodeId {
        self.nodes.push(Node {
            kind,
            range,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    /// Add a detached synthetic node with the given children
    pub fn add_synthetic(&mut self, kind: NodeKind, children: Vec<NodeId>) -> NodeId {
        let id = self.add(kind, 0..0);
        self.nodes[id].children = children;
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Node ids in document order (pre-order, root excluded)
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.nodes[Self::ROOT].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id].children.iter().rev().copied());
        }
        order
    }

    /// Flatten back into events for the HTML writer
    ///
    /// `inline` renders callout title text into inline events.
    pub fn into_events<F>(self, inline: F) -> Vec<Event<'static>>
    where
        F: Fn(&str) -> Vec<Event<'static>>,
    {
        let mut out = Vec::with_capacity(self.nodes.len() * 2);
        for &child in &self.nodes[Self::ROOT].children {
            self.flatten(child, &inline, &mut out);
        }
        out
    }

    fn flatten<F>(&self, id: NodeId, inline: &F, out: &mut Vec<Event<'static>>)
    where
        F: Fn(&str) -> Vec<Event<'static>>,
    {
        let node = &self.nodes[id];
        let (open, close) = match &node.kind {
            NodeKind::Root => (None, None),
            NodeKind::Container(tag) => (
                Some(Event::Start(tag.clone())),
                Some(Event::End(tag.to_end())),
            ),
            NodeKind::Leaf(event) => {
                out.push(event.clone());
                return;
            }
            NodeKind::Callout { kind } => (
                Some(html(super::callouts::container_open(kind))),
                Some(html("</div>\n".to_string())),
            ),
            NodeKind::CalloutTitle => (
                Some(html(r#"<div class="callout-title">"#.to_string())),
                Some(html("</div>\n".to_string())),
            ),
            NodeKind::CalloutIcon(svg) => {
                out.push(html(super::callouts::icon_markup(svg)));
                return;
            }
            NodeKind::CalloutTitleText(text) => {
                out.push(html(r#"<div class="callout-title-inner">"#.to_string()));
                out.extend(inline(text));
                out.push(html("</div>".to_string()));
                return;
            }
            NodeKind::CalloutContent => (
                Some(html("<div class=\"callout-content\">\n".to_string())),
                Some(html("</div>\n".to_string())),
            ),
        };

        if let Some(open) = open {
            out.push(open);
        }
        for &child in &node.children {
            self.flatten(child, inline, out);
        }
        if let Some(close) = close {
            out.push(close);
        }
    }
}

fn html(markup: String) -> Event<'static> {
    Event::Html(markup.into())
}

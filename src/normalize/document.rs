//! The tree that rewrite rules read and rebuild.
//!
//! Parsing produces a tree of [`Node::Element`]s and [`Node::Text`]s. Each rule in [`super::rules`] replaces the
//! elements it understands with [`Node::Span`]s (inline) or [`Node::Block`]s (block-level) and leaves everything else
//! alone, so after the last rule the tree holds no elements and can be rendered as Markdown.
use crate::normalize::HeaderLevel;
use std::fmt::{Display, Formatter};

/// One conversion's document: the ordered top-level nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl Document {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// Markup that no rule has rewritten yet.
    Element(Element),
    Text(String),
    Span(Span),
    Block(Block),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    /// Lowercased tag name.
    pub name: String,
    pub attrs: Vec<Attribute>,
    pub children: Vec<Node>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    /// Lowercased attribute name.
    pub name: String,
    pub value: String,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|a| a.name == name).map(|a| a.value.as_str())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Emphasis {
    None,
    Bold,
    Italic,
    BoldItalic,
}

impl Emphasis {
    /// The emphasis of a span nested directly inside another span.
    pub fn combine(self, inner: Emphasis) -> Emphasis {
        match (self, inner) {
            (Emphasis::None, other) | (other, Emphasis::None) => other,
            (Emphasis::Bold, Emphasis::Bold) => Emphasis::Bold,
            (Emphasis::Italic, Emphasis::Italic) => Emphasis::Italic,
            _ => Emphasis::BoldItalic,
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            Emphasis::None => "",
            Emphasis::Bold => "**",
            Emphasis::Italic => "*",
            Emphasis::BoldItalic => "***",
        }
    }
}

/// An inline run of content with an emphasis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub emphasis: Emphasis,
    pub content: SpanContent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpanContent {
    Nodes(Vec<Node>),
    /// Inline math, rendered `$tex$`.
    Math(String),
    /// Inline code. `body` is usually a placeholder token; `ticks` was sized against the original body.
    Literal { body: String, ticks: usize },
    Link { label: Vec<Node>, href: String },
}

impl Span {
    pub fn plain(content: SpanContent) -> Self {
        Self {
            emphasis: Emphasis::None,
            content,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Node>),
    Header { level: HeaderLevel, text: String },
    List(Vec<ListItem>),
    /// Rows of cells; the first row is the header row.
    Table(Vec<Vec<Vec<Node>>>),
    /// A fenced code block. `body` is usually a placeholder token.
    CodeBlock { body: String, fence: usize },
    MathBlock(String),
    HorizontalRule,
    RawHtml(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListItem {
    pub content: Vec<Node>,
    pub nested: Vec<ListItem>,
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    /// Rebuilds this node with `f` applied to each of its child lists.
    pub(crate) fn map_children(self, f: &mut dyn FnMut(Vec<Node>) -> Vec<Node>) -> Node {
        match self {
            Node::Element(mut el) => {
                el.children = f(std::mem::take(&mut el.children));
                Node::Element(el)
            }
            Node::Span(Span { emphasis, content }) => {
                let content = match content {
                    SpanContent::Nodes(nodes) => SpanContent::Nodes(f(nodes)),
                    SpanContent::Link { label, href } => SpanContent::Link { label: f(label), href },
                    leaf @ (SpanContent::Math(_) | SpanContent::Literal { .. }) => leaf,
                };
                Node::Span(Span { emphasis, content })
            }
            Node::Block(block) => Node::Block(match block {
                Block::Paragraph(nodes) => Block::Paragraph(f(nodes)),
                Block::List(items) => Block::List(map_items(items, f)),
                Block::Table(rows) => {
                    let mut new_rows = Vec::with_capacity(rows.len());
                    for row in rows {
                        let mut new_row = Vec::with_capacity(row.len());
                        for cell in row {
                            new_row.push(f(cell));
                        }
                        new_rows.push(new_row);
                    }
                    Block::Table(new_rows)
                }
                leaf => leaf,
            }),
            text @ Node::Text(_) => text,
        }
    }
}

fn map_items(items: Vec<ListItem>, f: &mut dyn FnMut(Vec<Node>) -> Vec<Node>) -> Vec<ListItem> {
    let mut result = Vec::with_capacity(items.len());
    for item in items {
        let content = f(item.content);
        let nested = map_items(item.nested, f);
        result.push(ListItem { content, nested });
    }
    result
}

/// Rebuilds `nodes` from the leaves up: each node's children are rewritten before `f` sees the node itself.
pub(crate) fn map_bottom_up(nodes: Vec<Node>, f: &mut dyn FnMut(Node) -> Vec<Node>) -> Vec<Node> {
    let mut result = Vec::with_capacity(nodes.len());
    for node in nodes {
        let node = node.map_children(&mut |children| map_bottom_up(children, f));
        result.extend(f(node));
    }
    result
}

/// Rebuilds `nodes` from the root down: elements for which `f` returns `Some` are replaced and not descended into;
/// everything else keeps its shape and is searched recursively.
pub(crate) fn map_top_down(nodes: Vec<Node>, f: &mut dyn FnMut(&Element) -> Option<Vec<Node>>) -> Vec<Node> {
    let mut result = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let Node::Element(el) = &node {
            if let Some(replacement) = f(el) {
                result.extend(replacement);
                continue;
            }
        }
        result.push(node.map_children(&mut |children| map_top_down(children, f)));
    }
    result
}

/// The text content of `nodes`, without any markup or emphasis markers.
pub fn plain_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    push_plain_text(nodes, &mut out);
    out
}

fn push_plain_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => push_plain_text(&el.children, out),
            Node::Span(span) => match &span.content {
                SpanContent::Nodes(nodes) => push_plain_text(nodes, out),
                SpanContent::Math(tex) => out.push_str(tex),
                SpanContent::Literal { body, .. } => out.push_str(body),
                SpanContent::Link { label, .. } => push_plain_text(label, out),
            },
            Node::Block(block) => match block {
                Block::Paragraph(nodes) => push_plain_text(nodes, out),
                Block::Header { text, .. } => out.push_str(text),
                Block::List(items) => push_items_text(items, out),
                Block::Table(rows) => {
                    for row in rows {
                        for cell in row {
                            push_plain_text(cell, out);
                            out.push(' ');
                        }
                        out.push('\n');
                    }
                }
                Block::CodeBlock { body, .. } => out.push_str(body),
                Block::MathBlock(tex) => out.push_str(tex),
                Block::HorizontalRule | Block::RawHtml(_) => {}
            },
        }
    }
}

fn push_items_text(items: &[ListItem], out: &mut String) {
    for item in items {
        push_plain_text(&item.content, out);
        out.push('\n');
        push_items_text(&item.nested, out);
    }
}

/// A single element that a rule couldn't rewrite. The rule keeps the element's text instead.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MalformedNode {
    pub element: String,
    pub reason: &'static str,
}

impl MalformedNode {
    pub fn new(element: &Element, reason: &'static str) -> Self {
        Self {
            element: element.name.clone(),
            reason,
        }
    }
}

impl std::error::Error for MalformedNode {}

impl Display for MalformedNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed <{}>: {}", self.element, self.reason)
    }
}

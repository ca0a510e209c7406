//! A forgiving markup reader, on top of html5ever.
//!
//! Clipboard HTML is rarely well-formed: unclosed `<p>`s, stray `</div>`s, attributes without quotes, tags cut off
//! mid-attribute. The input is parsed the way a browser parses the body of a page, so all of those resolve the same
//! way they did where the text was copied from. The DOM is then copied into owned [`Node`]s for the rewrite rules.
use crate::normalize::document::{Attribute, Element, Node};
use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use tracing::trace;

/// Parses `input` as the body of a document.
///
/// The returned DOM must stay alive while any handle into it is used: dropping a node empties its descendants.
fn parse_body(input: &str) -> RcDom {
    let wrapped = format!("<!DOCTYPE html><html><head></head><body>{input}</body></html>");
    parse_document(RcDom::default(), ParseOpts::default())
        .from_utf8()
        .one(wrapped.as_bytes())
}

fn find_element(handle: &Handle, name: &str) -> Option<Handle> {
    if let NodeData::Element { name: ref qname, .. } = handle.data {
        if &*qname.local == name {
            return Some(handle.clone());
        }
    }
    handle.children.borrow().iter().find_map(|child| find_element(child, name))
}

/// Parses `input` into a forest of elements and text. Entities in text and attribute values are decoded.
pub fn parse(input: &str) -> Vec<Node> {
    let dom = parse_body(input);
    let mut nodes = Vec::new();
    if let Some(body) = find_element(&dom.document, "body") {
        copy_children(&body, &mut nodes);
    }
    trace!(nodes = nodes.len(), "parsed markup");
    nodes
}

fn copy_children(parent: &Handle, out: &mut Vec<Node>) {
    for child in parent.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => {
                let contents = contents.borrow();
                match out.last_mut() {
                    Some(Node::Text(previous)) => previous.push_str(&contents),
                    _ => out.push(Node::text(&**contents)),
                }
            }
            NodeData::Element { name, attrs, .. } => {
                let mut element = Element::new(name.local.to_string());
                element.attrs = attrs
                    .borrow()
                    .iter()
                    .map(|attr| Attribute {
                        name: attr.name.local.to_string(),
                        value: attr.value.to_string(),
                    })
                    .collect();
                copy_children(child, &mut element.children);
                out.push(Node::Element(element));
            }
            // comments, doctypes, processing instructions
            _ => {}
        }
    }
}

/// The text of a markup fragment: tags are dropped, `<br>` and the ends of line-level elements become newlines, and
/// entities are decoded.
///
/// This is how the bodies of `<pre>` and `<code>` are read; syntax highlighters wrap every token in a `<span>`.
pub fn fragment_text(fragment: &str) -> String {
    let dom = parse_body(fragment);
    let mut out = String::with_capacity(fragment.len());
    if let Some(body) = find_element(&dom.document, "body") {
        collect_text(&body, &mut out);
    }
    out
}

fn collect_text(parent: &Handle, out: &mut String) {
    for child in parent.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => out.push_str(&contents.borrow()),
            NodeData::Element { name, .. } => {
                let name = &*name.local;
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                collect_text(child, out);
                if matches!(name, "div" | "p" | "li" | "tr") && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

//! The ordered structural rewrite rules.
//!
//! Each [`Rule`] takes the whole document and returns a new one. Order matters: headings are classified before code
//! and emphasis turn elements into spans (so "inline text before the heading" is still visible as elements), lists
//! and tables are built before paragraphs unwrap the containers around them, and the final rule unwraps whatever
//! inline markup is left.
use crate::normalize::document::{
    map_bottom_up, map_top_down, plain_text, Block, Document, Element, Emphasis, ListItem, MalformedNode, Node, Span,
    SpanContent,
};
use crate::normalize::protect::ProtectedRegions;
use crate::normalize::NormalizeOptions;
use crate::util::str_utils::{code_fence_len, escape_html, inline_code_ticks, join_lines};
use tracing::{debug, trace};

/// What every rule may consult besides the document itself.
pub struct RuleContext<'a> {
    pub options: &'a NormalizeOptions,
    pub regions: &'a ProtectedRegions,
}

type RuleFn = fn(Vec<Node>, &RuleContext) -> Vec<Node>;

/// A single named rewrite stage.
#[derive(Copy, Clone)]
pub struct Rule {
    name: &'static str,
    apply: RuleFn,
}

impl Rule {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply(&self, doc: Document, ctx: &RuleContext) -> Document {
        Document::new((self.apply)(doc.nodes, ctx))
    }
}

pub const RULES: [Rule; 11] = [
    Rule {
        name: "strip_presentation",
        apply: strip_presentation,
    },
    Rule {
        name: "headings",
        apply: headings,
    },
    Rule {
        name: "code",
        apply: code,
    },
    Rule {
        name: "emphasis",
        apply: emphasis,
    },
    Rule {
        name: "math",
        apply: math,
    },
    Rule {
        name: "lists",
        apply: lists,
    },
    Rule {
        name: "tables",
        apply: tables,
    },
    Rule {
        name: "paragraphs",
        apply: paragraphs,
    },
    Rule {
        name: "line_breaks",
        apply: line_breaks,
    },
    Rule {
        name: "links",
        apply: links,
    },
    Rule {
        name: "unwrap_inline",
        apply: unwrap_inline,
    },
];

/// Runs every rule in [`RULES`], in order.
pub fn apply_all(doc: Document, ctx: &RuleContext) -> Document {
    RULES.iter().fold(doc, |doc, rule| {
        trace!(rule = rule.name(), "applying rewrite rule");
        rule.apply(doc, ctx)
    })
}

/// Elements that start a new line when rendered.
const BLOCK_ELEMENTS: [&str; 28] = [
    "address",
    "article",
    "aside",
    "blockquote",
    "br",
    "details",
    "div",
    "dl",
    "figure",
    "footer",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tr",
    "ul",
];

/// Parents under which a heading is a genuine section header. The document root also counts.
const HEADING_PARENTS: [&str; 11] = [
    "article",
    "aside",
    "blockquote",
    "body",
    "details",
    "div",
    "footer",
    "header",
    "html",
    "main",
    "section",
];

/// Elements that become their content plus a paragraph break.
const CONTAINERS: [&str; 17] = [
    "address",
    "article",
    "aside",
    "blockquote",
    "body",
    "details",
    "div",
    "dl",
    "dd",
    "dt",
    "figcaption",
    "figure",
    "footer",
    "header",
    "html",
    "main",
    "section",
];

const DROPPED_ELEMENTS: [&str; 6] = ["head", "noscript", "script", "style", "template", "title"];
const PRESENTATIONAL_ATTRIBUTES: [&str; 2] = ["class", "style"];

fn keep_text_on_error(el: &Element, result: Result<Vec<Node>, MalformedNode>) -> Vec<Node> {
    match result {
        Ok(nodes) => nodes,
        Err(err) => {
            debug!(%err, "keeping the element's text");
            vec![Node::Text(plain_text(&el.children))]
        }
    }
}

fn is_blank(nodes: &[Node]) -> bool {
    nodes.iter().all(|node| matches!(node, Node::Text(text) if text.trim().is_empty()))
}

fn strip_presentation(nodes: Vec<Node>, _ctx: &RuleContext) -> Vec<Node> {
    map_bottom_up(nodes, &mut |node| match node {
        Node::Element(el) if DROPPED_ELEMENTS.contains(&el.name.as_str()) => Vec::new(),
        Node::Element(mut el) => {
            el.attrs.retain(|attr| !PRESENTATIONAL_ATTRIBUTES.contains(&attr.name.as_str()));
            vec![Node::Element(el)]
        }
        other => vec![other],
    })
}

fn headings(nodes: Vec<Node>, ctx: &RuleContext) -> Vec<Node> {
    headings_under(nodes, None, ctx)
}

fn headings_under(nodes: Vec<Node>, parent: Option<&str>, ctx: &RuleContext) -> Vec<Node> {
    let block_parent = parent.map_or(true, |name| HEADING_PARENTS.contains(&name));
    let mut result: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Element(el) if heading_level(&el.name).is_some() => {
                let genuine = block_parent && !preceded_by_inline_text(&result);
                let rewritten = rewrite_heading(&el, genuine, ctx);
                result.extend(keep_text_on_error(&el, rewritten));
            }
            Node::Element(mut el) => {
                let children = std::mem::take(&mut el.children);
                el.children = headings_under(children, Some(el.name.as_str()), ctx);
                result.push(Node::Element(el));
            }
            other => result.push(other),
        }
    }
    result
}

fn heading_level(name: &str) -> Option<u8> {
    match name.as_bytes() {
        [b'h', digit @ b'1'..=b'6'] => Some(digit - b'0'),
        _ => None,
    }
}

/// Whether the siblings before a node end with non-blank text on the node's line.
fn preceded_by_inline_text(siblings: &[Node]) -> bool {
    for node in siblings.iter().rev() {
        match node {
            Node::Text(text) => match text.rfind('\n') {
                Some(newline) => return !text[newline + 1..].trim().is_empty(),
                None if text.trim().is_empty() => continue,
                None => return true,
            },
            Node::Element(el) if BLOCK_ELEMENTS.contains(&el.name.as_str()) => return false,
            Node::Element(el) => {
                if !plain_text(&el.children).trim().is_empty() {
                    return true;
                }
            }
            Node::Block(_) => return false,
            Node::Span(_) => return true,
        }
    }
    false
}

fn rewrite_heading(el: &Element, genuine: bool, ctx: &RuleContext) -> Result<Vec<Node>, MalformedNode> {
    let text = join_lines(&heading_text(&el.children, ctx.regions));
    if genuine {
        if text.is_empty() {
            return Err(MalformedNode::new(el, "empty heading"));
        }
        return Ok(vec![Node::Block(Block::Header {
            level: ctx.options.header_level,
            text,
        })]);
    }
    trace!(tag = el.name, "demoting inline heading");
    let mut demoted = vec![Node::Span(Span::plain(SpanContent::Literal {
        body: format!("<{}>", el.name),
        ticks: 1,
    }))];
    if !text.is_empty() {
        demoted.push(Node::Text(format!(" {text}")));
    }
    Ok(demoted)
}

/// Heading text, keeping inline code as backtick spans.
fn heading_text(nodes: &[Node], regions: &ProtectedRegions) -> String {
    let mut text = String::new();
    for node in nodes {
        match node {
            Node::Element(el) if el.is("code") => {
                let body = plain_text(&el.children);
                let ticks = "`".repeat(inline_code_ticks(regions.original(&body).unwrap_or(&body)));
                text.push_str(&format!("{ticks}{body}{ticks}"));
            }
            Node::Element(el) => text.push_str(&heading_text(&el.children, regions)),
            other => text.push_str(&plain_text(std::slice::from_ref(other))),
        }
    }
    text
}

fn code(nodes: Vec<Node>, ctx: &RuleContext) -> Vec<Node> {
    map_bottom_up(nodes, &mut |node| match node {
        Node::Element(el) if el.is("pre") || el.is("code") => keep_text_on_error(&el, rewrite_code(&el, ctx)),
        other => vec![other],
    })
}

fn rewrite_code(el: &Element, ctx: &RuleContext) -> Result<Vec<Node>, MalformedNode> {
    let body = plain_text(&el.children);
    let original = ctx.regions.original(&body).unwrap_or(&body);
    if original.trim().is_empty() {
        return Err(MalformedNode::new(el, "empty code"));
    }
    let is_block = original.contains('\n') || original.chars().count() > ctx.options.code_block_threshold;
    let node = if is_block {
        let fence = code_fence_len(original);
        Node::Block(Block::CodeBlock { body, fence })
    } else {
        let ticks = inline_code_ticks(original);
        Node::Span(Span::plain(SpanContent::Literal { body, ticks }))
    };
    Ok(vec![node])
}

fn emphasis_of(name: &str) -> Option<Emphasis> {
    match name {
        "b" | "strong" => Some(Emphasis::Bold),
        "i" | "em" => Some(Emphasis::Italic),
        _ => None,
    }
}

fn emphasis(nodes: Vec<Node>, _ctx: &RuleContext) -> Vec<Node> {
    let wrapped = map_bottom_up(nodes, &mut |node| match node {
        Node::Element(el) => match emphasis_of(&el.name) {
            Some(emphasis) => wrap_emphasis(emphasis, el.children),
            None => vec![Node::Element(el)],
        },
        other => vec![other],
    });
    merge_adjacent_spans(wrapped)
}

/// Joins sibling spans of the same emphasis, so `<b>a</b><b>b</b>` reads `**ab**` and not `**a****b**`.
fn merge_adjacent_spans(nodes: Vec<Node>) -> Vec<Node> {
    let mut merged: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        let node = node.map_children(&mut merge_adjacent_spans);
        match (merged.last_mut(), node) {
            (Some(Node::Span(previous)), Node::Span(next))
                if previous.emphasis == next.emphasis && next.emphasis != Emphasis::None =>
            {
                let content = std::mem::replace(&mut previous.content, SpanContent::Nodes(Vec::new()));
                let mut joined = span_nodes(content);
                joined.extend(span_nodes(next.content));
                previous.content = SpanContent::Nodes(joined);
            }
            (_, node) => merged.push(node),
        }
    }
    merged
}

fn span_nodes(content: SpanContent) -> Vec<Node> {
    match content {
        SpanContent::Nodes(nodes) => nodes,
        leaf => vec![Node::Span(Span::plain(leaf))],
    }
}

fn wrap_emphasis(emphasis: Emphasis, children: Vec<Node>) -> Vec<Node> {
    if plain_text(&children).trim().is_empty() {
        return children;
    }
    let (leading, inner, trailing) = split_outer_whitespace(children);
    let span = match <[Node; 1]>::try_from(inner) {
        Ok([Node::Span(only)]) => Span {
            emphasis: emphasis.combine(only.emphasis),
            content: only.content,
        },
        Ok([other]) => Span {
            emphasis,
            content: SpanContent::Nodes(vec![other]),
        },
        Err(inner) => Span {
            emphasis,
            content: SpanContent::Nodes(inner),
        },
    };
    let mut result = Vec::with_capacity(3);
    if !leading.is_empty() {
        result.push(Node::Text(leading));
    }
    result.push(Node::Span(span));
    if !trailing.is_empty() {
        result.push(Node::Text(trailing));
    }
    result
}

/// Splits whitespace at the very start and end of `nodes` off into separate strings.
fn split_outer_whitespace(mut nodes: Vec<Node>) -> (String, Vec<Node>, String) {
    let mut leading = String::new();
    if let Some(Node::Text(first)) = nodes.first_mut() {
        let cut = first.len() - first.trim_start().len();
        leading = first.drain(..cut).collect();
    }
    let mut trailing = String::new();
    if let Some(Node::Text(last)) = nodes.last_mut() {
        let keep = last.trim_end().len();
        trailing = last.split_off(keep);
    }
    nodes.retain(|node| !matches!(node, Node::Text(text) if text.is_empty()));
    (leading, nodes, trailing)
}

fn math(nodes: Vec<Node>, _ctx: &RuleContext) -> Vec<Node> {
    map_top_down(nodes, &mut |el| {
        let is_math = el.is("math") || el.is("mjx-container");
        is_math.then(|| keep_text_on_error(el, rewrite_math(el)))
    })
}

fn rewrite_math(el: &Element) -> Result<Vec<Node>, MalformedNode> {
    let source = tex_source(el);
    let tex = source.trim();
    if tex.is_empty() {
        return Err(MalformedNode::new(el, "no math source"));
    }
    let node = if is_display_math(el) {
        Node::Block(Block::MathBlock(tex.to_string()))
    } else {
        Node::Span(Span::plain(SpanContent::Math(tex.to_string())))
    };
    Ok(vec![node])
}

fn tex_source(el: &Element) -> String {
    let tex_annotation = find_descendant(&el.children, &|e| {
        e.is("annotation") && e.attr("encoding").is_some_and(|enc| enc.eq_ignore_ascii_case("application/x-tex"))
    });
    if let Some(annotation) = tex_annotation {
        return plain_text(&annotation.children);
    }
    if let Some(alt) = el.attr("data-latex").or_else(|| el.attr("alttext")) {
        return alt.to_string();
    }
    let mut text = String::new();
    push_visible_math_text(&el.children, &mut text);
    text
}

/// Element text, minus MathJax's screen-reader copy of the same expression.
fn push_visible_math_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Element(el) if el.is("mjx-assistive-mml") => {}
            Node::Element(el) => push_visible_math_text(&el.children, out),
            other => out.push_str(&plain_text(std::slice::from_ref(other))),
        }
    }
}

fn is_display_math(el: &Element) -> bool {
    let display = el.attr("display").is_some_and(|d| d.eq_ignore_ascii_case("block") || d.eq_ignore_ascii_case("true"));
    display || el.attr("mode").is_some_and(|mode| mode.eq_ignore_ascii_case("display"))
}

fn find_descendant<'a>(nodes: &'a [Node], matches: &dyn Fn(&Element) -> bool) -> Option<&'a Element> {
    for node in nodes {
        if let Node::Element(el) = node {
            if matches(el) {
                return Some(el);
            }
            if let Some(found) = find_descendant(&el.children, matches) {
                return Some(found);
            }
        }
    }
    None
}

fn lists(nodes: Vec<Node>, _ctx: &RuleContext) -> Vec<Node> {
    let nodes = map_bottom_up(nodes, &mut |node| match node {
        Node::Element(el) if el.is("ul") || el.is("ol") => vec![Node::Block(Block::List(list_items(el.children)))],
        other => vec![other],
    });
    // An `li` that survived the first pass had no list around it.
    map_bottom_up(nodes, &mut |node| match node {
        Node::Element(el) if el.is("li") => vec![Node::Block(Block::List(vec![list_item(el.children)]))],
        other => vec![other],
    })
}

fn list_items(children: Vec<Node>) -> Vec<ListItem> {
    let mut items: Vec<ListItem> = Vec::new();
    for child in children {
        match child {
            Node::Element(li) if li.is("li") => items.push(list_item(li.children)),
            Node::Text(text) if text.trim().is_empty() => {}
            // A list directly inside a list belongs to the item before it.
            Node::Block(Block::List(nested)) => match items.last_mut() {
                Some(last) => last.nested.extend(nested),
                None => items.extend(nested),
            },
            other => match items.last_mut() {
                Some(last) => last.content.push(other),
                None => items.push(ListItem {
                    content: vec![other],
                    nested: Vec::new(),
                }),
            },
        }
    }
    items
}

fn list_item(children: Vec<Node>) -> ListItem {
    let mut item = ListItem::default();
    for child in children {
        match child {
            Node::Block(Block::List(nested)) => item.nested.extend(nested),
            other => item.content.push(other),
        }
    }
    item
}

fn tables(nodes: Vec<Node>, _ctx: &RuleContext) -> Vec<Node> {
    map_bottom_up(nodes, &mut |node| match node {
        Node::Element(el) if el.is("table") => keep_text_on_error(&el, rewrite_table(&el)),
        other => vec![other],
    })
}

fn rewrite_table(el: &Element) -> Result<Vec<Node>, MalformedNode> {
    let mut rows = Vec::new();
    collect_rows(&el.children, &mut rows);
    if rows.is_empty() {
        return Err(MalformedNode::new(el, "table has no rows"));
    }
    Ok(vec![Node::Block(Block::Table(rows))])
}

fn collect_rows(nodes: &[Node], rows: &mut Vec<Vec<Vec<Node>>>) {
    for node in nodes {
        let Node::Element(el) = node else {
            continue;
        };
        match el.name.as_str() {
            "tr" => {
                let cells: Vec<Vec<Node>> = el
                    .children
                    .iter()
                    .filter_map(|child| match child {
                        Node::Element(cell) if cell.is("td") || cell.is("th") => Some(cell.children.clone()),
                        _ => None,
                    })
                    .collect();
                if !cells.is_empty() {
                    rows.push(cells);
                }
            }
            "thead" | "tbody" | "tfoot" => collect_rows(&el.children, rows),
            _ => {}
        }
    }
}

fn paragraphs(nodes: Vec<Node>, _ctx: &RuleContext) -> Vec<Node> {
    map_bottom_up(nodes, &mut |node| match node {
        Node::Element(el) if el.is("p") => {
            if is_blank(&el.children) {
                Vec::new()
            } else {
                vec![Node::Block(Block::Paragraph(el.children))]
            }
        }
        Node::Element(el) if CONTAINERS.contains(&el.name.as_str()) => {
            let mut children = el.children;
            children.push(Node::text("\n\n"));
            children
        }
        other => vec![other],
    })
}

fn line_breaks(nodes: Vec<Node>, _ctx: &RuleContext) -> Vec<Node> {
    map_bottom_up(nodes, &mut |node| match node {
        Node::Element(el) if el.is("br") => vec![Node::text("\n")],
        Node::Element(el) if el.is("hr") => vec![Node::Block(Block::HorizontalRule)],
        other => vec![other],
    })
}

fn links(nodes: Vec<Node>, _ctx: &RuleContext) -> Vec<Node> {
    map_bottom_up(nodes, &mut |node| match node {
        Node::Element(el) if el.is("a") => rewrite_link(el),
        Node::Element(el) if el.is("img") => rewrite_image(&el),
        other => vec![other],
    })
}

fn rewrite_link(el: Element) -> Vec<Node> {
    let href = el.attr("href").map(str::trim).unwrap_or_default().to_string();
    let navigable = !(href.is_empty() || href.starts_with('#') || href.to_ascii_lowercase().starts_with("javascript:"));
    if !navigable {
        return el.children;
    }
    let href = href.replace(' ', "%20").replace('(', "%28").replace(')', "%29");
    if is_blank(&el.children) || plain_text(&el.children).trim() == href {
        return vec![Node::Text(href)];
    }
    vec![Node::Span(Span::plain(SpanContent::Link {
        label: el.children,
        href,
    }))]
}

fn rewrite_image(el: &Element) -> Vec<Node> {
    match el.attr("src").map(str::trim).filter(|src| !src.is_empty()) {
        Some(src) => {
            let alt = el.attr("alt").unwrap_or_default();
            let html = format!(r#"<img src="{}" alt="{}">"#, escape_html(src), escape_html(alt));
            vec![Node::Block(Block::RawHtml(html))]
        }
        None => Vec::new(),
    }
}

fn unwrap_inline(nodes: Vec<Node>, _ctx: &RuleContext) -> Vec<Node> {
    map_bottom_up(nodes, &mut |node| match node {
        Node::Element(el) => el.children,
        other => vec![other],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::html::parse;
    use crate::util::utils_for_test::*;

    fn run_rules(html: &str) -> Vec<Node> {
        let options = NormalizeOptions::default_for_tests();
        let regions = ProtectedRegions::for_input(html);
        let ctx = RuleContext {
            options: &options,
            regions: &regions,
        };
        apply_all(Document::new(parse(html)), &ctx).nodes
    }

    fn run_one(rule: &str, html: &str) -> Vec<Node> {
        let options = NormalizeOptions::default_for_tests();
        let regions = ProtectedRegions::for_input(html);
        let ctx = RuleContext {
            options: &options,
            regions: &regions,
        };
        let rule = RULES.iter().find(|r| r.name() == rule).unwrap_or_else(|| panic!("no rule {rule}"));
        rule.apply(Document::new(parse(html)), &ctx).nodes
    }

    fn has_element(nodes: &[Node]) -> bool {
        nodes.iter().any(|node| match node {
            Node::Element(_) => true,
            Node::Span(Span {
                content: SpanContent::Nodes(inner),
                ..
            }) => has_element(inner),
            Node::Block(Block::Paragraph(inner)) => has_element(inner),
            _ => false,
        })
    }

    #[test]
    fn rule_order() {
        let names: Vec<_> = RULES.iter().map(Rule::name).collect();
        assert_eq!(
            names,
            vec![
                "strip_presentation",
                "headings",
                "code",
                "emphasis",
                "math",
                "lists",
                "tables",
                "paragraphs",
                "line_breaks",
                "links",
                "unwrap_inline",
            ]
        );
    }

    #[test]
    fn no_elements_survive() {
        let nodes = run_rules("<div><span style='x'>a <u>b</u></span><custom-tag>c</custom-tag></div>");
        assert!(!has_element(&nodes));
        assert_eq!(plain_text(&nodes).trim(), "a bc");
    }

    mod presentation {
        use super::*;

        #[test]
        fn attributes_and_scripts_dropped() {
            let nodes = run_one(
                "strip_presentation",
                "<p style='color: red' class='x' id='keep'>hi<script>alert(1)</script></p>",
            );
            unwrap!(&nodes[0], Node::Element(p));
            assert_eq!(p.attrs.len(), 1);
            assert_eq!(p.attr("id"), Some("keep"));
            assert_eq!(plain_text(&nodes), "hi");
        }

        #[test]
        fn whole_page_keeps_only_body_text() {
            let nodes = run_one(
                "strip_presentation",
                "<html><head><title>Tab title</title><style>p {}</style></head><body><p>hi</p></body></html>",
            );
            assert_eq!(plain_text(&nodes), "hi");
        }
    }

    mod headings {
        use super::*;

        #[test]
        fn top_level_heading_is_genuine() {
            let nodes = run_one("headings", "<h1>Title</h1>");
            assert_eq!(
                nodes,
                vec![Node::Block(Block::Header {
                    level: level(3),
                    text: "Title".to_string()
                })]
            );
        }

        #[test]
        fn heading_in_div_is_genuine() {
            let nodes = run_one("headings", "<div>\n<h4>  Spaced\n out </h4></div>");
            unwrap!(&nodes[0], Node::Element(div));
            unwrap!(&div.children[1], Node::Block(Block::Header { text, .. }));
            assert_eq!(text, "Spaced out");
        }

        #[test]
        fn heading_in_paragraph_is_demoted() {
            let nodes = run_one("headings", "<p><h2>Inline</h2></p>");
            // the parser closes the <p> before the heading, so it lands at the root
            unwrap!(&nodes[1], Node::Block(Block::Header { .. }));

            let nodes = run_one("headings", "<span><h2>Inline</h2></span>");
            unwrap!(&nodes[0], Node::Element(span));
            unwrap!(&span.children[0], Node::Span(literal));
            assert_eq!(
                literal.content,
                SpanContent::Literal {
                    body: "<h2>".to_string(),
                    ticks: 1
                }
            );
            assert_eq!(span.children[1], Node::text(" Inline"));
        }

        #[test]
        fn heading_after_inline_text_is_demoted() {
            let nodes = run_one("headings", "<div>see <h3>Note</h3></div>");
            unwrap!(&nodes[0], Node::Element(div));
            assert!(matches!(div.children[1], Node::Span(_)));
        }

        #[test]
        fn heading_after_newline_is_genuine() {
            let nodes = run_one("headings", "<div>intro\n<h3>Note</h3></div>");
            unwrap!(&nodes[0], Node::Element(div));
            assert!(matches!(div.children[1], Node::Block(Block::Header { .. })));
        }

        #[test]
        fn heading_after_block_sibling_is_genuine() {
            let nodes = run_one("headings", "<div><p>para</p><h3>Note</h3></div>");
            unwrap!(&nodes[0], Node::Element(div));
            assert!(matches!(div.children[1], Node::Block(Block::Header { .. })));
        }

        #[test]
        fn empty_heading_keeps_its_text() {
            let nodes = run_one("headings", "<h2>  </h2>");
            assert_eq!(nodes, vec![Node::text("  ")]);
        }

        #[test]
        fn levels() {
            assert_eq!(heading_level("h1"), Some(1));
            assert_eq!(heading_level("h6"), Some(6));
            assert_eq!(heading_level("h7"), None);
            assert_eq!(heading_level("hr"), None);
        }
    }

    mod code {
        use super::*;

        #[test]
        fn short_code_is_literal() {
            let nodes = run_one("code", "<code>x = 1</code>");
            assert_eq!(
                nodes,
                vec![Node::Span(Span::plain(SpanContent::Literal {
                    body: "x = 1".to_string(),
                    ticks: 1
                }))]
            );
        }

        #[test]
        fn multi_line_is_block() {
            let nodes = run_one("code", "<pre>a\nb</pre>");
            unwrap!(&nodes[0], Node::Block(Block::CodeBlock { body, fence: 3 }));
            assert_eq!(body, "a\nb");
        }

        #[test]
        fn long_single_line_is_block() {
            let long = "x".repeat(51);
            let nodes = run_one("code", &format!("<code>{long}</code>"));
            assert!(matches!(nodes[0], Node::Block(Block::CodeBlock { .. })));

            let exact = "x".repeat(50);
            let nodes = run_one("code", &format!("<code>{exact}</code>"));
            assert!(matches!(nodes[0], Node::Span(_)));
        }

        #[test]
        fn backticks_in_body_widen_the_fence() {
            let nodes = run_one("code", "<code>a ` b</code>");
            unwrap!(&nodes[0], Node::Span(Span { content: SpanContent::Literal { ticks, .. }, .. }));
            assert_eq!(*ticks, 2);
        }

        #[test]
        fn placeholder_body_measured_by_original() {
            let options = NormalizeOptions::default_for_tests();
            let mut regions = ProtectedRegions::for_input("");
            let token = regions.insert("line one\nline two");
            let ctx = RuleContext {
                options: &options,
                regions: &regions,
            };
            let doc = Document::new(parse(&format!("<pre>{token}</pre>")));
            let nodes = RULES[2].apply(doc, &ctx).nodes;
            unwrap!(&nodes[0], Node::Block(Block::CodeBlock { body, .. }));
            assert_eq!(body, &token);
        }
    }

    mod emphasis {
        use super::*;

        fn span_of(nodes: &[Node]) -> &Span {
            nodes
                .iter()
                .find_map(|n| match n {
                    Node::Span(span) => Some(span),
                    _ => None,
                })
                .unwrap_or_else(|| panic!("no span in {nodes:?}"))
        }

        #[test]
        fn bold_and_italic() {
            assert_eq!(span_of(&run_one("emphasis", "<b>x</b>")).emphasis, Emphasis::Bold);
            assert_eq!(span_of(&run_one("emphasis", "<strong>x</strong>")).emphasis, Emphasis::Bold);
            assert_eq!(span_of(&run_one("emphasis", "<i>x</i>")).emphasis, Emphasis::Italic);
            assert_eq!(span_of(&run_one("emphasis", "<em>x</em>")).emphasis, Emphasis::Italic);
        }

        #[test]
        fn nested_combine() {
            let nodes = run_one("emphasis", "<b><i>both</i></b>");
            assert_eq!(nodes.len(), 1);
            assert_eq!(span_of(&nodes).emphasis, Emphasis::BoldItalic);
        }

        #[test]
        fn whitespace_moves_outside() {
            let nodes = run_one("emphasis", "<b> word </b>");
            assert_eq!(nodes.len(), 3);
            assert_eq!(nodes[0], Node::text(" "));
            assert_eq!(nodes[2], Node::text(" "));
            assert_eq!(span_of(&nodes).content, SpanContent::Nodes(vec![Node::text("word")]));
        }

        #[test]
        fn adjacent_same_emphasis_joined() {
            let nodes = run_one("emphasis", "<p><b>a</b><b>b</b> <i>c</i><b>d</b></p>");
            unwrap!(&nodes[0], Node::Element(p));
            assert_eq!(p.children.len(), 4);
            unwrap!(&p.children[0], Node::Span(joined));
            assert_eq!(joined.emphasis, Emphasis::Bold);
            assert_eq!(plain_text(&p.children[..1]), "ab");
        }

        #[test]
        fn empty_emphasis_disappears() {
            let nodes = run_one("emphasis", "a<b> </b>b");
            assert_eq!(plain_text(&nodes), "a b");
            assert!(!nodes.iter().any(|n| matches!(n, Node::Span(_))));
        }
    }

    mod math {
        use super::*;

        #[test]
        fn display_annotation() {
            let nodes = run_one(
                "math",
                r#"<math display="block"><semantics><mi>x</mi><annotation encoding="application/x-tex">x^2</annotation></semantics></math>"#,
            );
            assert_eq!(nodes, vec![Node::Block(Block::MathBlock("x^2".to_string()))]);
        }

        #[test]
        fn inline_mathjax_text() {
            let nodes = run_one(
                "math",
                "<mjx-container><mjx-math>a+b</mjx-math><mjx-assistive-mml><math>a+b</math></mjx-assistive-mml></mjx-container>",
            );
            assert_eq!(nodes, vec![Node::Span(Span::plain(SpanContent::Math("a+b".to_string())))]);
        }

        #[test]
        fn display_true_mathjax() {
            let nodes = run_one("math", r#"<mjx-container display="true" data-latex="\frac{1}{2}"></mjx-container>"#);
            assert_eq!(nodes, vec![Node::Block(Block::MathBlock(r"\frac{1}{2}".to_string()))]);
        }

        #[test]
        fn empty_math_kept_as_text() {
            let nodes = run_one("math", "<math> </math>");
            assert_eq!(nodes, vec![Node::text(" ")]);
        }
    }

    mod lists {
        use super::*;

        fn items_text(items: &[ListItem]) -> Vec<String> {
            items.iter().map(|i| plain_text(&i.content)).collect()
        }

        #[test]
        fn flat() {
            let nodes = run_one("lists", "<ul><li>a</li><li>b</li></ul>");
            unwrap!(&nodes[0], Node::Block(Block::List(items)));
            assert_eq!(items_text(items), vec!["a", "b"]);
        }

        #[test]
        fn nested_inside_item() {
            let nodes = run_one("lists", "<ol><li>a<ul><li>a1</li></ul></li><li>b</li></ol>");
            unwrap!(&nodes[0], Node::Block(Block::List(items)));
            assert_eq!(items_text(items), vec!["a", "b"]);
            assert_eq!(items_text(&items[0].nested), vec!["a1"]);
        }

        #[test]
        fn nested_list_as_sibling() {
            let nodes = run_one("lists", "<ul><li>a</li><ul><li>a1</li></ul></ul>");
            unwrap!(&nodes[0], Node::Block(Block::List(items)));
            assert_eq!(items.len(), 1);
            assert_eq!(items_text(&items[0].nested), vec!["a1"]);
        }

        #[test]
        fn stray_item() {
            let nodes = run_one("lists", "<li>alone</li>");
            unwrap!(&nodes[0], Node::Block(Block::List(items)));
            assert_eq!(items_text(items), vec!["alone"]);
        }
    }

    mod tables {
        use super::*;

        #[test]
        fn rows_and_cells() {
            let nodes = run_one(
                "tables",
                "<table><thead><tr><th>A</th><th>B</th></tr></thead><tbody><tr><td>1</td><td>2</td></tr></tbody></table>",
            );
            unwrap!(&nodes[0], Node::Block(Block::Table(rows)));
            assert_eq!(rows.len(), 2);
            assert_eq!(plain_text(&rows[1][1]), "2");
        }

        #[test]
        fn empty_table_is_malformed() {
            let nodes = run_one("tables", "<table> </table>");
            assert_eq!(nodes, vec![Node::text(" ")]);
        }
    }

    mod paragraphs {
        use super::*;

        #[test]
        fn paragraph_block() {
            let nodes = run_one("paragraphs", "<p>text</p><p> </p>");
            assert_eq!(nodes, vec![Node::Block(Block::Paragraph(vec![Node::text("text")]))]);
        }

        #[test]
        fn containers_unwrap() {
            let nodes = run_one("paragraphs", "<section>text</section>");
            assert_eq!(nodes, vec![Node::text("text"), Node::text("\n\n")]);
        }
    }

    mod links {
        use super::*;

        #[test]
        fn labelled_link() {
            let nodes = run_one("links", r#"<a href="https://x.test/a b">site</a>"#);
            unwrap!(&nodes[0], Node::Span(Span { content: SpanContent::Link { href, .. }, .. }));
            assert_eq!(href, "https://x.test/a%20b");
        }

        #[test]
        fn bare_url_link() {
            let nodes = run_one("links", r#"<a href="https://x.test">https://x.test</a>"#);
            assert_eq!(nodes, vec![Node::text("https://x.test")]);
        }

        #[test]
        fn anchors_unwrap() {
            let nodes = run_one("links", "<a href='#top'>top</a><a>none</a>");
            assert_eq!(plain_text(&nodes), "topnone");
            assert!(!nodes.iter().any(|n| matches!(n, Node::Span(_))));
        }

        #[test]
        fn image_keeps_src_and_alt() {
            let nodes = run_one("links", r#"<img src="a.png" alt="A &quot;q&quot;" width="3">"#);
            assert_eq!(
                nodes,
                vec![Node::Block(Block::RawHtml(r#"<img src="a.png" alt="A &quot;q&quot;">"#.to_string()))]
            );
        }
    }
}

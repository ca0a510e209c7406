use crate::normalize::document::{Block, Document, ListItem, Node, Span, SpanContent};
use crate::normalize::ProtectedRegions;
use crate::util::str_utils::{escape_tag_openers, join_lines};

/// Writes a fully rewritten document as Markdown.
///
/// Every block brings its own blank-line framing; runs of more than one blank line are collapsed later, during
/// post-processing. Code bodies are still tokens here; those that land in a table cell get their pipes escaped in
/// `regions`.
pub fn render(doc: &Document, regions: &mut ProtectedRegions) -> String {
    let mut out = String::new();
    Renderer { regions }.nodes(&doc.nodes, &mut out);
    out
}

struct Renderer<'r> {
    regions: &'r mut ProtectedRegions,
}

impl Renderer<'_> {
    fn render_to_string(&mut self, nodes: &[Node]) -> String {
        let mut out = String::new();
        self.nodes(nodes, &mut out);
        out
    }

    fn nodes(&mut self, nodes: &[Node], out: &mut String) {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(&escape_tag_openers(text)),
                // Only reachable if a rule is skipped; fall back to the content.
                Node::Element(el) => self.nodes(&el.children, out),
                Node::Span(span) => self.span(span, out),
                Node::Block(block) => self.block(block, out),
            }
        }
    }

    fn span(&mut self, span: &Span, out: &mut String) {
        let marker = span.emphasis.marker();
        out.push_str(marker);
        match &span.content {
            SpanContent::Nodes(nodes) => self.nodes(nodes, out),
            SpanContent::Math(tex) => {
                out.push('$');
                out.push_str(tex);
                out.push('$');
            }
            SpanContent::Literal { body, ticks } => {
                let fence = "`".repeat(*ticks);
                out.push_str(&fence);
                out.push_str(body);
                out.push_str(&fence);
            }
            SpanContent::Link { label, href } => {
                out.push('[');
                self.nodes(label, out);
                out.push_str("](");
                out.push_str(href);
                out.push(')');
            }
        }
        out.push_str(marker);
    }

    fn block(&mut self, block: &Block, out: &mut String) {
        match block {
            Block::Paragraph(nodes) => {
                let text = self.render_to_string(nodes);
                let text = text.trim();
                if text.is_empty() {
                    return;
                }
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push_str("\n\n");
                }
                out.push_str(text);
                out.push_str("\n\n");
            }
            Block::Header { level, text } => {
                out.push_str("\n\n");
                out.push_str(&level.marker());
                out.push(' ');
                out.push_str(&escape_tag_openers(text));
                out.push_str("\n\n");
            }
            Block::List(items) => {
                out.push_str("\n\n");
                self.items(items, 0, out);
                out.push('\n');
            }
            Block::Table(rows) => self.table(rows, out),
            Block::CodeBlock { body, fence } => {
                let fence = "`".repeat(*fence);
                out.push('\n');
                out.push_str(&fence);
                out.push('\n');
                out.push_str(body);
                out.push('\n');
                out.push_str(&fence);
                out.push('\n');
            }
            Block::MathBlock(tex) => {
                out.push_str("\n$$\n");
                out.push_str(tex);
                out.push_str("\n$$\n");
            }
            Block::HorizontalRule => out.push_str("\n\n---\n\n"),
            Block::RawHtml(html) => out.push_str(html),
        }
    }

    /// Nested lists are indented two spaces per level.
    fn items(&mut self, items: &[ListItem], depth: usize, out: &mut String) {
        for item in items {
            let text = join_lines(&self.render_to_string(&item.content));
            if !text.is_empty() {
                out.push_str(&"  ".repeat(depth));
                out.push_str("* ");
                out.push_str(&text);
                out.push('\n');
            }
            self.items(&item.nested, depth + 1, out);
        }
    }

    fn table(&mut self, rows: &[Vec<Vec<Node>>], out: &mut String) {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        out.push_str("\n\n");
        for (idx, row) in rows.iter().enumerate() {
            out.push('|');
            for col in 0..width {
                let cell = row.get(col).map(|cell| self.cell(cell)).unwrap_or_default();
                out.push(' ');
                out.push_str(&cell);
                out.push_str(" |");
            }
            out.push('\n');
            if idx == 0 {
                out.push('|');
                for _ in 0..width {
                    out.push_str(" --- |");
                }
                out.push('\n');
            }
        }
        out.push('\n');
    }

    /// A cell on one line. Pipes are escaped both in the text and in any code it holds: GFM splits cells on `|` even
    /// inside backticks.
    fn cell(&mut self, cell: &[Node]) -> String {
        let text = join_lines(&self.render_to_string(cell));
        self.regions.rewrite_originals(&text, escape_pipes);
        escape_pipes(&text)
    }
}

/// Escapes every `|` not already preceded by a backslash.
fn escape_pipes(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut previous = None;
    for ch in text.chars() {
        if ch == '|' && previous != Some('\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
        previous = Some(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::document::Emphasis;
    use crate::util::utils_for_test::*;
    use indoc::indoc;

    variants_checker!(BLOCKS_CHECKER = Block {
        Paragraph(_),
        Header { .. },
        List(_),
        Table(_),
        CodeBlock { .. },
        MathBlock(_),
        HorizontalRule,
        RawHtml(_),
    });

    fn render_block_alone(block: Block) -> String {
        BLOCKS_CHECKER.see(&block);
        render_alone(&Document::new(vec![Node::Block(block)]))
    }

    fn render_alone(doc: &Document) -> String {
        render(doc, &mut ProtectedRegions::for_input(""))
    }

    fn text(s: &str) -> Node {
        Node::text(s)
    }

    fn item(s: &str, nested: Vec<ListItem>) -> ListItem {
        ListItem {
            content: vec![text(s)],
            nested,
        }
    }

    #[test]
    fn paragraph() {
        assert_eq!(
            render_block_alone(Block::Paragraph(vec![text("  hello  ")])),
            "hello\n\n"
        );
        assert_eq!(render_block_alone(Block::Paragraph(vec![text(" ")])), "");
    }

    #[test]
    fn paragraph_after_inline_text() {
        let doc = Document::new(vec![text("loose"), Node::Block(Block::Paragraph(vec![text("para")]))]);
        assert_eq!(render_alone(&doc), "loose\n\npara\n\n");
    }

    #[test]
    fn header() {
        assert_eq!(
            render_block_alone(Block::Header {
                level: level(3),
                text: "Title".to_string()
            }),
            "\n\n### Title\n\n"
        );
    }

    #[test]
    fn list_with_nesting() {
        let items = vec![item("a", vec![item("a1", vec![item("a1x", vec![])])]), item("b", vec![])];
        assert_eq!(
            render_block_alone(Block::List(items)),
            indoc! {"


                * a
                  * a1
                    * a1x
                * b

            "}
        );
    }

    #[test]
    fn table_pads_and_escapes() {
        let rows = vec![
            vec![vec![text("A")], vec![text("B")]],
            vec![vec![text("x | y")], vec![text("multi\nline")]],
            vec![vec![text("short")]],
        ];
        assert_eq!(
            render_block_alone(Block::Table(rows)),
            indoc! {r"


                | A | B |
                | --- | --- |
                | x \| y | multi line |
                | short |  |

            "}
        );
    }

    #[test]
    fn table_code_pipes_escaped_in_the_original() {
        let mut regions = ProtectedRegions::for_input("");
        let token = regions.insert("a|b");
        let rows = vec![
            vec![vec![text("A")]],
            vec![vec![Node::Span(Span::plain(SpanContent::Literal {
                body: token.clone(),
                ticks: 1,
            }))]],
        ];
        let out = render(&Document::new(vec![Node::Block(Block::Table(rows))]), &mut regions);
        assert_eq!(regions.restore(&out), "\n\n| A |\n| --- |\n| `a\\|b` |\n\n");
    }

    #[test]
    fn code_outside_tables_untouched() {
        let mut regions = ProtectedRegions::for_input("");
        let token = regions.insert("a|b");
        let doc = Document::new(vec![Node::Span(Span::plain(SpanContent::Literal { body: token, ticks: 1 }))]);
        let out = render(&doc, &mut regions);
        assert_eq!(regions.restore(&out), "`a|b`");
    }

    #[test]
    fn code_block() {
        assert_eq!(
            render_block_alone(Block::CodeBlock {
                body: "x\ny".to_string(),
                fence: 4
            }),
            "\n````\nx\ny\n````\n"
        );
    }

    #[test]
    fn math_block() {
        assert_eq!(
            render_block_alone(Block::MathBlock("x^2".to_string())),
            "\n$$\nx^2\n$$\n"
        );
    }

    #[test]
    fn horizontal_rule() {
        assert_eq!(render_block_alone(Block::HorizontalRule), "\n\n---\n\n");
    }

    #[test]
    fn raw_html() {
        assert_eq!(
            render_block_alone(Block::RawHtml("<img src=\"a\" alt=\"\">".to_string())),
            "<img src=\"a\" alt=\"\">"
        );
    }

    #[test]
    fn spans() {
        let doc = Document::new(vec![
            Node::Span(Span {
                emphasis: Emphasis::BoldItalic,
                content: SpanContent::Nodes(vec![text("both")]),
            }),
            text(" "),
            Node::Span(Span::plain(SpanContent::Math("a+b".to_string()))),
            text(" "),
            Node::Span(Span::plain(SpanContent::Literal {
                body: "x`y".to_string(),
                ticks: 2,
            })),
            text(" "),
            Node::Span(Span::plain(SpanContent::Link {
                label: vec![text("site")],
                href: "https://x.test".to_string(),
            })),
        ]);
        assert_eq!(render_alone(&doc), "***both*** $a+b$ ``x`y`` [site](https://x.test)");
    }

    #[test]
    fn text_tags_escaped() {
        let doc = Document::new(vec![text("a <div> and 1 < 2 and </p>")]);
        assert_eq!(render_alone(&doc), "a &lt;div> and 1 < 2 and &lt;/p>");
    }
}

use crate::reverse::inline::convert_inline;
use crate::reverse::style::Styles;
use crate::util::regex_utils::{captures, is_match, static_regex};
use std::mem;

static_regex!(LIST_ITEM = r"^([*+\-•·●○▪■◆])\s+(.*)$");
static_regex!(RULE = r"^[-*_]{3,}$");

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Mode {
    Scanning,
    InList,
    InTable,
}

#[derive(Debug, PartialEq, Eq)]
enum LineKind<'a> {
    TableRow(&'a str),
    ListItem { depth: usize, content: String },
    Other,
}

/// Replaces runs of pipe-table rows and bulleted list items with `<table>` and `<ul>` markup.
///
/// Every other line is passed through. Each generated block comes back as a single line, so later per-line stages
/// see it as one unit.
pub(crate) fn convert_blocks(text: &str, styles: &Styles) -> Vec<String> {
    let mut converter = BlockConverter {
        styles,
        mode: Mode::Scanning,
        table_rows: Vec::new(),
        list_items: Vec::new(),
        out: Vec::new(),
    };
    for line in text.split('\n') {
        converter.push(line);
    }
    converter.finish()
}

struct BlockConverter<'s> {
    styles: &'s Styles,
    mode: Mode,
    table_rows: Vec<String>,
    list_items: Vec<(usize, String)>,
    out: Vec<String>,
}

impl BlockConverter<'_> {
    fn push(&mut self, line: &str) {
        match classify(line) {
            LineKind::TableRow(row) => {
                if self.mode != Mode::InTable {
                    self.flush();
                    self.mode = Mode::InTable;
                }
                self.table_rows.push(row.to_string());
            }
            LineKind::ListItem { depth, content } => {
                if self.mode != Mode::InList {
                    self.flush();
                    self.mode = Mode::InList;
                }
                self.list_items.push((depth, content));
            }
            LineKind::Other => {
                self.flush();
                self.out.push(line.to_string());
            }
        }
    }

    fn flush(&mut self) {
        match mem::replace(&mut self.mode, Mode::Scanning) {
            Mode::Scanning => {}
            Mode::InList => {
                let items = mem::take(&mut self.list_items);
                self.out.push(list_html(&items, self.styles));
            }
            Mode::InTable => {
                let rows = mem::take(&mut self.table_rows);
                match table_html(&rows, self.styles) {
                    Some(html) => self.out.push(html),
                    None => self.out.extend(rows),
                }
            }
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.out
    }
}

fn classify(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('|') && trimmed.ends_with('|') {
        return LineKind::TableRow(trimmed);
    }
    let item = trimmed.trim_start_matches('\u{200b}');
    if is_match(&RULE, item) {
        return LineKind::Other;
    }
    match captures(&LIST_ITEM, item) {
        Some(caps) => LineKind::ListItem {
            depth: indent_width(line) / 2,
            content: caps[2].replace('\u{200b}', "").replace('\u{a0}', " ").trim().to_string(),
        },
        None => LineKind::Other,
    }
}

fn indent_width(line: &str) -> usize {
    let mut width = 0;
    for ch in line.chars() {
        match ch {
            ' ' | '\u{a0}' => width += 1,
            '\t' => width += 4,
            '\u{200b}' => {}
            _ => break,
        }
    }
    width
}

/// Nested `<ul>`s, where each level lives inside the `<li>` it belongs to.
///
/// Depths are relative to the first item, and an item can be at most one level deeper than the one before it.
fn list_html(items: &[(usize, String)], styles: &Styles) -> String {
    let base = items.first().map(|(depth, _)| *depth).unwrap_or(0);
    let mut html = String::from(styles.list_open());
    let mut current = 0;
    for (idx, (depth, content)) in items.iter().enumerate() {
        let depth = depth.saturating_sub(base).min(current + 1);
        if idx > 0 {
            if depth > current {
                html.push_str(styles.list_open());
            } else {
                html.push_str("</li>");
                for _ in depth..current {
                    html.push_str("</ul></li>");
                }
            }
        }
        current = depth;
        html.push_str(&styles.list_item_open());
        html.push_str(&convert_inline(content));
    }
    html.push_str("</li>");
    for _ in 0..current {
        html.push_str("</ul></li>");
    }
    html.push_str("</ul>");
    html
}

fn is_separator(row: &str) -> bool {
    row.contains('-') && row.chars().all(|ch| matches!(ch, '|' | ':' | '-' | ' '))
}

/// Splits a `| a | b |` row on its unescaped pipes; `\|` becomes a literal `|` inside its cell.
fn split_cells(row: &str) -> Vec<String> {
    let inner = row.strip_prefix('|').unwrap_or(row);
    let inner = match inner.strip_suffix('|') {
        Some(stripped) if !stripped.ends_with('\\') => stripped,
        _ => inner,
    };
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&'|') => {
                chars.next();
                current.push('|');
            }
            '|' => cells.push(mem::take(&mut current).trim().to_string()),
            _ => current.push(ch),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

/// A `<table>` for the rows, or `None` when they aren't a pipe table: a header row, then a separator row.
///
/// Body rows are padded with empty cells up to the header's width.
fn table_html(rows: &[String], styles: &Styles) -> Option<String> {
    let [header, separator, body @ ..] = rows else {
        return None;
    };
    if !is_separator(separator) {
        return None;
    }
    let header = split_cells(header);
    let width = header.len();

    let mut html = styles.table_open();
    html.push_str("<thead><tr>");
    for cell in &header {
        html.push_str(styles.header_cell_open());
        html.push_str(&convert_inline(cell));
        html.push_str("</th>");
    }
    html.push_str("</tr></thead><tbody>");
    for row in body {
        let mut cells = split_cells(row);
        if cells.len() < width {
            cells.resize(width, String::new());
        }
        html.push_str("<tr>");
        for cell in &cells {
            html.push_str(styles.cell_open());
            html.push_str(&convert_inline(cell));
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    Some(html)
}

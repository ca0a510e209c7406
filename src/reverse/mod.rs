//! Normalized Markdown in, inline-styled HTML out, ready for a word processor's paste buffer.
//!
//! Every generated element carries its own `style` attribute. Word processors ignore stylesheets on paste, and the
//! point is for the pasted text to look the same everywhere.
mod blocks;
mod clipboard;
mod inline;
mod math;
mod style;

pub use clipboard::clipboard_payload;
pub use math::{AnnotatedMathml, MathRenderError, MathRenderer};
pub use style::{HeaderSizing, DEFAULT_FONT_FAMILY};

use crate::normalize::{check_input, ProtectedRegions, Refusal};
use crate::util::regex_utils::{captures, is_match, replace_all_or_keep, static_regex};
use crate::util::str_utils::escape_html_text;
use derive_builder::Builder;
use fancy_regex::Captures;
use inline::{convert_inline, is_block_line};
use style::Styles;
use tracing::{debug, trace};

static_regex!(FENCED_CODE = r"(?ms)^[ \t]*(`{3,})[^\n]*\n(.*?)^[ \t]*\1[ \t]*$");
static_regex!(INLINE_CODE = r"`([^`\n]+)`");
static_regex!(RULE_LINE = r"^\s*[-*_]{3,}\s*$");
static_regex!(HEADER_LINE = r"^(#{1,6})\s+(.*)$");

/// Configuration for one [`to_rich_markup`] call.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Builder)]
#[builder(default)]
pub struct RichOptions {
    /// Refuse input that looks like pasted source code. See [`check_input`].
    pub guard: bool,

    pub header_sizing: HeaderSizing,

    /// The CSS `font-family` for body text, headers, list items and tables.
    #[builder(setter(into))]
    pub font_family: String,
}

impl Default for RichOptions {
    fn default() -> Self {
        Self {
            guard: true,
            header_sizing: HeaderSizing::default(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
        }
    }
}

/// Converts normalized Markdown into a styled HTML document.
///
/// Passes run in this order: code protection, math rendering, tables and lists, inline bold/italic, horizontal
/// rules, headers, and finally paragraph grouping. Consecutive text lines share one `<p>`, joined by `<br>`; blank
/// lines and block elements end it.
///
/// Math goes through `math`. An expression it can't render is kept as written, and the rest of the document still
/// converts.
///
/// ```
/// use marknorm::{to_rich_markup, reverse::AnnotatedMathml, RichOptions};
///
/// let html = to_rich_markup("### Title\n\nSome **bold** text.", &RichOptions::default(), &AnnotatedMathml).unwrap();
/// assert!(html.contains(">Title</div>"));
/// assert!(html.contains("Some <strong>bold</strong> text.</p>"));
/// ```
pub fn to_rich_markup(input: &str, options: &RichOptions, math: &dyn MathRenderer) -> Result<String, Refusal> {
    check_input(input, options.guard)?;
    debug!(bytes = input.len(), "converting to rich markup");
    let styles = Styles::new(&options.font_family, options.header_sizing);
    let mut regions = ProtectedRegions::for_input(input);

    let escaped = escape_html_text(input);
    let text = protect_code(&escaped, &styles, &mut regions);
    let text = math::render_math(&text, math, &mut regions);
    trace!(regions = regions.len(), "protected code and math");

    let lines: Vec<String> = blocks::convert_blocks(&text, &styles)
        .into_iter()
        .map(|line| convert_line(line, &styles))
        .collect();
    let body = group_paragraphs(&lines, &styles);
    Ok(regions.restore(&body))
}

/// Swaps code bodies for placeholders, wrapped in their `<pre>`/`<code>` tags. `text` is already HTML-escaped.
fn protect_code(text: &str, styles: &Styles, regions: &mut ProtectedRegions) -> String {
    let fenced = replace_all_or_keep(&FENCED_CODE, text, |caps: &Captures| {
        let body = &caps[2];
        let body = body.strip_suffix('\n').unwrap_or(body);
        format!("{}{}</pre>", styles.pre_open(), regions.insert(body))
    });
    replace_all_or_keep(&INLINE_CODE, &fenced, |caps: &Captures| {
        format!("{}{}</code>", styles.code_open(), regions.insert(&caps[1]))
    })
    .into_owned()
}

fn convert_line(line: String, styles: &Styles) -> String {
    if is_block_line(&line) {
        return line;
    }
    let line = convert_inline(&line);
    if is_match(&RULE_LINE, &line) {
        return styles.rule().to_string();
    }
    match captures(&HEADER_LINE, &line) {
        Some(caps) => {
            let level = caps[1].len() as u8;
            styles.header(level, caps[2].trim())
        }
        None => line,
    }
}

fn group_paragraphs(lines: &[String], styles: &Styles) -> String {
    fn flush(body: &mut String, group: &mut Vec<&str>, styles: &Styles) {
        if group.is_empty() {
            return;
        }
        body.push_str(&styles.paragraph_open());
        body.push_str(&group.join("<br>"));
        body.push_str("</p>");
        group.clear();
    }

    let mut body = styles.body_open();
    let mut group = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            flush(&mut body, &mut group, styles);
        } else if is_block_line(line) {
            flush(&mut body, &mut group, styles);
            body.push_str(line);
        } else {
            group.push(line);
        }
    }
    flush(&mut body, &mut group, styles);
    body.push_str("</body></html>");
    body
}

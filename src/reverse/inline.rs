use crate::util::regex_utils::{is_match, replace_all_or_keep, static_regex};

static_regex!(BOLD_ITALIC = r"\*\*\*(?!\s)(.+?)(?<!\s)\*\*\*");
static_regex!(STRONG = r"\*\*(?!\s)(.+?)(?<!\s)\*\*");
static_regex!(EM_STAR = r"(?<!\*)\*(?![\s*])([^*]+?)(?<!\s)\*(?!\*)");
static_regex!(EM_UNDERSCORE = r"(?<!\w)_(?![\s_])([^_]+?)(?<!\s)_(?!\w)");
static_regex!(BLOCK_LINE = r"(?i)^\s*<(?:ul|ol|table|div|hr|pre)\b");

/// Whether `line` already holds generated block markup, which inline conversion must leave alone.
pub(crate) fn is_block_line(line: &str) -> bool {
    is_match(&BLOCK_LINE, line)
}

/// Converts `***x***`, `**x**`, `*x*` and `_x_` to `<strong>`/`<em>` tags, strongest first.
///
/// Delimiters must hug their content, so arithmetic like `2 * 3 * 4` and identifiers like `snake_case_name` stay as
/// they are.
pub(crate) fn convert_inline(text: &str) -> String {
    let text = replace_all_or_keep(&BOLD_ITALIC, text, "<strong><em>$1</em></strong>");
    let text = replace_all_or_keep(&STRONG, &text, "<strong>$1</strong>").into_owned();
    let text = replace_all_or_keep(&EM_STAR, &text, "<em>$1</em>").into_owned();
    replace_all_or_keep(&EM_UNDERSCORE, &text, "<em>$1</em>").into_owned()
}

//! Text-level cleanup that runs on the rendered buffer, whatever the input format was.
//!
//! Protected regions are still tokens at this point, so none of these patterns can reach into code.
use crate::normalize::NormalizeOptions;
use crate::util::regex_utils::{replace_all_or_keep, static_regex};
use fancy_regex::Captures;
use std::borrow::Cow;
use tracing::trace;

static_regex!(BACKGROUND_CSS = r#"background(?:-[a-z]+)?\s*:[^;"\n]*;?"#);
static_regex!(MATH_FENCE_AFTER = r"\$\$\s*\n*");
static_regex!(MATH_FENCE_BEFORE = r"\n*[ \t]*\$\$");
static_regex!(HEADER_MARKER = r"(?m)^#{1,6}[ \t]+");
static_regex!(HEADER_LINE = r"(?m)^(#{1,6}[ \t]+)(.*)$");
static_regex!(UNESCAPED_HASH = r"(?<!\\)#");
static_regex!(BARE_RULE = r"(?m)^-{3,}[ \t]*(?:\n|$)");
static_regex!(BLANK_RUN = r"\n{3,}");

/// Runs every enabled stage in order. Blank-line collapse is always last.
pub fn post_process(text: &str, options: &NormalizeOptions) -> String {
    let mut text = remove_background_css(text).into_owned();
    text = canonicalize_math_fences(&text);
    if options.force_header_level {
        text = force_header_level(&text, options).into_owned();
    }
    if options.escape_header_hashes {
        text = escape_header_hashes(&text).into_owned();
    }
    if options.strip_horizontal_rules {
        text = replace_all_or_keep(&BARE_RULE, &text, "").into_owned();
    }
    let collapsed = collapse_blank_lines(&text).into_owned();
    trace!(len = collapsed.len(), "post-processing done");
    collapsed
}

/// Drops `background: …;` and `background-color: …;` fragments.
fn remove_background_css(text: &str) -> Cow<str> {
    replace_all_or_keep(&BACKGROUND_CSS, text, "")
}

/// Puts exactly one newline between each `$$` fence and the math it encloses.
fn canonicalize_math_fences(text: &str) -> String {
    if !text.contains("$$") {
        return text.to_string();
    }
    let after = replace_all_or_keep(&MATH_FENCE_AFTER, text, "$$$$\n");
    replace_all_or_keep(&MATH_FENCE_BEFORE, &after, "\n$$$$").into_owned()
}

fn force_header_level<'a>(text: &'a str, options: &NormalizeOptions) -> Cow<'a, str> {
    let marker = format!("{} ", options.header_level.marker());
    replace_all_or_keep(&HEADER_MARKER, text, |_: &Captures| marker.clone())
}

/// Escapes `#` inside header text. The leading marker and already-escaped `\#` are left alone.
fn escape_header_hashes(text: &str) -> Cow<str> {
    replace_all_or_keep(&HEADER_LINE, text, |caps: &Captures| {
        let escaped = replace_all_or_keep(&UNESCAPED_HASH, &caps[2], r"\#");
        format!("{}{escaped}", &caps[1])
    })
}

fn collapse_blank_lines(text: &str) -> Cow<str> {
    replace_all_or_keep(&BLANK_RUN, text, "\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::utils_for_test::*;
    use indoc::indoc;

    fn post(text: &str) -> String {
        post_process(text, &NormalizeOptions::default_for_tests())
    }

    #[test]
    fn collapse() {
        assert_eq!(post("a\n\n\n\n\nb\n\n\n"), "a\n\nb\n\n");
        assert_eq!(post("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn collapse_runs_after_other_stages() {
        let options = NormalizeOptions::new_with(|o| o.strip_horizontal_rules = true);
        assert_eq!(post_process("a\n\n---\n\nb", &options), "a\n\nb");
    }

    #[test]
    fn background_fragments() {
        assert_eq!(post("x background-color: #fff; y"), "x  y");
        assert_eq!(post("background:red"), "");
        assert_eq!(post("the background of the story"), "the background of the story");
    }

    #[test]
    fn math_fences() {
        assert_eq!(post("$$\n\n\nx^2\n\n$$"), "\n$$\nx^2\n$$\n");
        assert_eq!(post("\n$$\nx^2\n$$\n"), "\n$$\nx^2\n$$\n");
        assert_eq!(post("$$  x  $$"), "\n$$\nx\n$$\n");
    }

    #[test]
    fn header_levels_unified() {
        let options = NormalizeOptions::new_with(|o| o.header_level = level(2));
        let text = indoc! {"
            # One
            ###### Six
            #hashtag
            ####### seven
            text # not a header"};
        assert_eq!(
            post_process(text, &options),
            indoc! {"
                ## One
                ## Six
                #hashtag
                ####### seven
                text # not a header"}
        );
    }

    #[test]
    fn header_levels_left_alone_when_disabled() {
        let options = NormalizeOptions::new_with(|o| o.force_header_level = false);
        assert_eq!(post_process("# One", &options), "# One");
    }

    #[test]
    fn header_hashes() {
        let options = NormalizeOptions::new_with(|o| o.escape_header_hashes = true);
        assert_eq!(post_process("### C# and F\\# tips\nC# body", &options), "### C\\# and F\\# tips\nC# body");
        let once = post_process("## a#b", &options);
        assert_eq!(post_process(&once, &options), once);
    }

    #[test]
    fn bare_rules() {
        let options = NormalizeOptions::new_with(|o| o.strip_horizontal_rules = true);
        assert_eq!(post_process("a\n---\nb\n-----  \nc\n- - -", &options), "a\nb\nc\n- - -");
        assert_eq!(post("a\n---\nb"), "a\n---\nb");
    }
}

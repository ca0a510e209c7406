use crate::util::regex_utils::{replace_all_or_keep, static_regex};
use fancy_regex::Captures;
use std::borrow::Cow;

static_regex!(ENTITY = r"&(?:#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});");

/// Decodes HTML character references (`&amp;`, `&nbsp;`, `&#x27;`, …).
///
/// Each reference is decoded on its own, so a bare `&` or an unknown name (`AT&T`, `&bogus;`) stays as literal text
/// instead of spoiling the whole string.
pub(crate) fn decode_entities(text: &str) -> Cow<str> {
    if memchr::memchr(b'&', text.as_bytes()).is_none() {
        return Cow::Borrowed(text);
    }
    replace_all_or_keep(&ENTITY, text, |caps: &Captures| {
        let reference = &caps[0];
        match quick_xml::escape::unescape_with(reference, quick_xml::escape::resolve_html5_entity) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => reference.to_string(),
        }
    })
}

/// Escapes text for use inside an HTML element or a double-quoted attribute.
pub(crate) fn escape_html(text: &str) -> Cow<str> {
    quick_xml::escape::escape(text)
}

/// Escapes `<`, `>` and `&` only; quotes are left readable. For element content.
pub(crate) fn escape_html_text(text: &str) -> Cow<str> {
    quick_xml::escape::partial_escape(text)
}

/// Escapes any `<` that would otherwise read as the start of a tag.
///
/// Normalized output must not contain tag-like text that came from decoded entities (`&lt;div&gt;`), or the next
/// normalization pass would treat it as markup.
pub(crate) fn escape_tag_openers(text: &str) -> Cow<str> {
    let bytes = text.as_bytes();
    let needs_escape = memchr::memchr_iter(b'<', bytes).any(|idx| starts_tag(bytes, idx));
    if !needs_escape {
        return Cow::Borrowed(text);
    }
    let mut result = String::with_capacity(text.len() + 8);
    let mut last = 0;
    for idx in memchr::memchr_iter(b'<', bytes) {
        if starts_tag(bytes, idx) {
            result.push_str(&text[last..idx]);
            result.push_str("&lt;");
            last = idx + 1;
        }
    }
    result.push_str(&text[last..]);
    Cow::Owned(result)
}

fn starts_tag(bytes: &[u8], lt_idx: usize) -> bool {
    match bytes.get(lt_idx + 1) {
        Some(next) => next.is_ascii_alphabetic() || *next == b'/' || *next == b'!',
        None => false,
    }
}

/// Length of the longest run of `ch` in `text`.
pub(crate) fn longest_run(text: &str, ch: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == ch {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// The number of backticks needed to fence a code block whose body is `body`: at least three, and longer than any
/// run of backticks inside it.
pub(crate) fn code_fence_len(body: &str) -> usize {
    (longest_run(body, '`') + 1).max(3)
}

/// The number of backticks needed to wrap `body` as inline code.
pub(crate) fn inline_code_ticks(body: &str) -> usize {
    let longest = longest_run(body, '`');
    if longest == 0 {
        1
    } else {
        longest + 1
    }
}

/// Trims each line, drops the blank ones, and joins the rest with single spaces.
pub(crate) fn join_lines(text: &str) -> String {
    text.split('\n').map(str::trim).filter(|line| !line.is_empty()).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod test {
    use super::*;

    mod entities {
        use super::*;

        #[test]
        fn named_and_numeric() {
            assert_eq!(decode_entities("a &amp; b &lt;c&gt; &#65;&#x42;"), "a & b <c> AB");
        }

        #[test]
        fn html5_names() {
            assert_eq!(decode_entities("x&nbsp;y &mdash; z"), "x\u{a0}y \u{2014} z");
        }

        #[test]
        fn bare_ampersand_survives() {
            assert_eq!(decode_entities("AT&T & friends &bogus; &amp;"), "AT&T & friends &bogus; &");
        }

        #[test]
        fn no_ampersand_borrows() {
            assert!(matches!(decode_entities("plain"), Cow::Borrowed("plain")));
        }
    }

    mod html_escapes {
        use super::*;

        #[test]
        fn full_escape_covers_quotes() {
            assert_eq!(escape_html(r#"a<b & "c""#), "a&lt;b &amp; &quot;c&quot;");
        }

        #[test]
        fn text_escape_keeps_quotes() {
            assert_eq!(escape_html_text(r#"don't "x" < y & z > w"#), r#"don't "x" &lt; y &amp; z &gt; w"#);
        }
    }

    mod tag_openers {
        use super::*;

        #[test]
        fn escapes_only_tag_like() {
            assert_eq!(escape_tag_openers("a < b and <div> </p> <!x"), "a < b and &lt;div> &lt;/p> &lt;!x");
        }

        #[test]
        fn trailing_lt() {
            assert_eq!(escape_tag_openers("x <"), "x <");
        }
    }

    mod fences {
        use super::*;

        #[test]
        fn plain_body() {
            assert_eq!(code_fence_len("let x = 1;"), 3);
            assert_eq!(inline_code_ticks("x"), 1);
        }

        #[test]
        fn body_with_backticks() {
            assert_eq!(code_fence_len("```\nnested\n```"), 4);
            assert_eq!(code_fence_len("a ```` b"), 5);
            assert_eq!(inline_code_ticks("a `b` c"), 2);
        }
    }

    #[test]
    fn join_lines_collapses_newlines() {
        assert_eq!(join_lines("  one\n  two  \n\nthree"), "one two three");
        assert_eq!(join_lines("single"), "single");
    }
}

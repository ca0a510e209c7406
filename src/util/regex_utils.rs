use fancy_regex::{Captures, Regex, Replacer};
use std::borrow::Cow;

/// Replaces every match of `pattern` in `text`, or returns `text` untouched if the regex engine gives up.
///
/// [`fancy_regex`] can fail at match time (for example, when a lookaround pattern hits its backtrack limit). A single
/// rewrite stage failing must not abort a whole conversion, so we log it and keep the buffer as it was.
pub(crate) fn replace_all_or_keep<'t, R: Replacer>(pattern: &Regex, text: &'t str, replacement: R) -> Cow<'t, str> {
    match pattern.try_replacen(text, 0, replacement) {
        Ok(replaced) => replaced,
        Err(err) => {
            tracing::warn!(pattern = pattern.as_str(), error = %err, "regex replacement failed; keeping text as-is");
            Cow::Borrowed(text)
        }
    }
}

/// Whether `pattern` matches anywhere in `text`. Matching errors count as "no match".
pub(crate) fn is_match(pattern: &Regex, text: &str) -> bool {
    pattern.is_match(text).unwrap_or_else(|err| {
        tracing::warn!(pattern = pattern.as_str(), error = %err, "regex match failed");
        false
    })
}

/// The first match of `pattern` in `text`, with its groups. Matching errors count as "no match".
pub(crate) fn captures<'t>(pattern: &Regex, text: &'t str) -> Option<Captures<'t>> {
    pattern.captures(text).unwrap_or_else(|err| {
        tracing::warn!(pattern = pattern.as_str(), error = %err, "regex match failed");
        None
    })
}

/// Compiles a pattern that is a constant in this crate.
///
/// All call sites pass string literals that are covered by tests, so a failure here is a programming error.
macro_rules! static_regex {
    ($name:ident = $pattern:expr) => {
        lazy_static::lazy_static! {
            static ref $name: fancy_regex::Regex = fancy_regex::Regex::new($pattern)
                .unwrap_or_else(|e| panic!("invalid built-in pattern {}: {e}", stringify!($name)));
        }
    };
}
pub(crate) use static_regex;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_with_closure() {
        let pattern = Regex::new(r"(\w+)@").unwrap();
        let result = replace_all_or_keep(&pattern, "a@ b@", |caps: &fancy_regex::Captures| {
            format!("<{}>", &caps[1])
        });
        assert_eq!(result, "<a> <b>");
    }

    #[test]
    fn no_match_borrows() {
        let pattern = Regex::new(r"zzz").unwrap();
        let result = replace_all_or_keep(&pattern, "hello", "x");
        assert!(matches!(result, Cow::Borrowed("hello")));
    }

    #[test]
    fn lookbehind_match() {
        let pattern = Regex::new(r"(?<!\\)#").unwrap();
        assert!(is_match(&pattern, "a # b"));
        assert!(!is_match(&pattern, r"a \# b"));
    }
}

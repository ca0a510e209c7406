//! Placeholder protection for content that rewriting must not touch.
//!
//! Before any rule or post-processing stage runs, code regions are cut out of the buffer and replaced with opaque
//! tokens. Nothing between extraction and [`ProtectedRegions::restore`] can match inside a token, so the regions come
//! back byte-for-byte, however aggressive the rewriting in between.
use crate::normalize::html::fragment_text;
use crate::normalize::InputFormat;
use crate::util::regex_utils::{replace_all_or_keep, static_regex};
use crate::util::str_utils::decode_entities;
use fancy_regex::Captures;
use tracing::{debug, trace};

/// Opens every token. A private-use character, so no rewrite pattern mentions it.
const TOKEN_OPEN: char = '\u{E000}';
/// Closes every token.
const TOKEN_CLOSE: char = '\u{E001}';

static_regex!(
    RICH_PROTECTED = r"(?is)(<pre\b[^>]*>)(.*?)(</pre\s*>)|(<code\b[^>]*>)(.*?)(</code\s*>)|(?m:^```[^\n]*\n.*?^```[ \t]*$)|`[^`\n]+`"
);
static_regex!(NORMALIZED_PROTECTED = r"(?s)(?m:^```[^\n]*\n.*?^```[ \t]*$)|`[^`\n]+`");

/// The originals behind each placeholder token issued during one conversion.
///
/// Tokens look like `OPEN n CLOSE`, where `OPEN` is one or more `U+E000` characters. If the input itself already
/// contains `U+E000`, the prefix is lengthened until it can't collide with anything in the input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtectedRegions {
    prefix: String,
    originals: Vec<String>,
}

impl ProtectedRegions {
    pub fn for_input(input: &str) -> Self {
        let longest = input.chars().fold((0usize, 0usize), |(longest, current), ch| {
            if ch == TOKEN_OPEN {
                (longest.max(current + 1), current + 1)
            } else {
                (longest, 0)
            }
        });
        Self {
            prefix: TOKEN_OPEN.to_string().repeat(longest.0 + 1),
            originals: Vec::new(),
        }
    }

    /// Stores `original` and returns the token that stands in for it.
    pub fn insert(&mut self, original: impl Into<String>) -> String {
        let token = format!("{}{}{}", self.prefix, self.originals.len(), TOKEN_CLOSE);
        self.originals.push(original.into());
        token
    }

    pub fn len(&self) -> usize {
        self.originals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }

    /// The original behind `token`, if `token` is exactly one of this store's tokens.
    pub fn original(&self, token: &str) -> Option<&str> {
        match self.parse_token_at(token) {
            Some((idx, len)) if len == token.len() => Some(&self.originals[idx]),
            _ => None,
        }
    }

    /// Rewrites the original behind every token that occurs in `text`.
    pub fn rewrite_originals(&mut self, text: &str, rewrite: impl Fn(&str) -> String) {
        let mut rest = text;
        while let Some(pos) = rest.find(self.prefix.as_str()) {
            let candidate = &rest[pos..];
            match self.parse_token_at(candidate) {
                Some((idx, len)) => {
                    let rewritten = rewrite(&self.originals[idx]);
                    self.originals[idx] = rewritten;
                    rest = &candidate[len..];
                }
                None => rest = &candidate[self.prefix.len()..],
            }
        }
    }

    /// Replaces every token in `text` with its original.
    ///
    /// An original may itself contain tokens issued before it (a code span inside a rendered table cell, say); those
    /// are restored too. Text that merely resembles a token is left alone.
    pub fn restore(&self, text: &str) -> String {
        let mut uses = vec![0usize; self.originals.len()];
        let restored = self.restore_below(text, self.originals.len(), &mut uses);
        for (idx, count) in uses.iter().enumerate() {
            if *count != 1 {
                debug!(token = idx, count, "protected region was not restored exactly once");
            }
        }
        trace!(regions = self.originals.len(), "restored protected regions");
        restored
    }

    fn restore_below(&self, text: &str, bound: usize, uses: &mut [usize]) -> String {
        if self.originals.is_empty() {
            return text.to_string();
        }
        let mut result = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(pos) = rest.find(self.prefix.as_str()) {
            result.push_str(&rest[..pos]);
            let candidate = &rest[pos..];
            match self.parse_token_at(candidate) {
                Some((idx, len)) if idx < bound => {
                    uses[idx] += 1;
                    result.push_str(&self.restore_below(&self.originals[idx], idx, uses));
                    rest = &candidate[len..];
                }
                _ => {
                    let skip = candidate.chars().next().map_or(1, char::len_utf8);
                    result.push_str(&candidate[..skip]);
                    rest = &candidate[skip..];
                }
            }
        }
        result.push_str(rest);
        result
    }

    /// If `text` starts with a token of this store, returns its index and byte length.
    fn parse_token_at(&self, text: &str) -> Option<(usize, usize)> {
        let after_prefix = text.strip_prefix(self.prefix.as_str())?;
        let digits = after_prefix.bytes().take_while(|b| b.is_ascii_digit()).count();
        if digits == 0 || !after_prefix[digits..].starts_with(TOKEN_CLOSE) {
            return None;
        }
        let idx: usize = after_prefix[..digits].parse().ok()?;
        if idx >= self.originals.len() {
            return None;
        }
        Some((idx, self.prefix.len() + digits + TOKEN_CLOSE.len_utf8()))
    }
}

/// Cuts the protected regions out of `input`, storing them in `regions`, and returns the buffer with tokens in their
/// place.
///
/// - In rich input, only the *body* of a `<pre>` or `<code>` element is replaced; the tags stay so that the tree
///   builder still sees the element. The stored body is its text: highlighter markup dropped, `<br>` turned into a
///   newline, entities decoded. Fenced blocks and backtick spans are stored with their entities decoded.
/// - In normalized input, fenced blocks and backtick spans are stored verbatim, fences included.
pub fn extract(input: &str, format: InputFormat, regions: &mut ProtectedRegions) -> String {
    let extracted = match format {
        InputFormat::Rich => replace_all_or_keep(&RICH_PROTECTED, input, |caps: &Captures| {
            let element = [(1, 2, 3), (4, 5, 6)]
                .into_iter()
                .find_map(|(open, body, close)| Some((caps.get(open)?, caps.get(body)?, caps.get(close)?)));
            match element {
                Some((open, body, close)) => {
                    let token = regions.insert(code_body(body.as_str()));
                    format!("{}{token}{}", open.as_str(), close.as_str())
                }
                None => regions.insert(decode_entities(&caps[0]).into_owned()),
            }
        }),
        InputFormat::Normalized => {
            replace_all_or_keep(&NORMALIZED_PROTECTED, input, |caps: &Captures| regions.insert(&caps[0]))
        }
    };
    extracted.into_owned()
}

fn code_body(fragment: &str) -> String {
    let text = fragment_text(fragment);
    let text = text.strip_prefix('\n').unwrap_or(&text);
    text.trim_end_matches('\n').to_string()
}

/// The two shapes of input the normalizer accepts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InputFormat {
    /// Tag-based markup that needs the full structural rewrite.
    Rich,
    /// Text already in the target form; only post-processing applies.
    Normalized,
}

impl InputFormat {
    /// Treats any `<` immediately followed by an ASCII letter as a tag.
    ///
    /// Prose such as `a <b` is therefore classified as [`InputFormat::Rich`]. That false positive is accepted: the
    /// rich path keeps text it doesn't recognize as markup.
    pub fn detect(input: &str) -> Self {
        let bytes = input.as_bytes();
        let has_tag = memchr::memchr_iter(b'<', bytes)
            .any(|idx| bytes.get(idx + 1).is_some_and(|next| next.is_ascii_alphabetic()));
        if has_tag {
            Self::Rich
        } else {
            Self::Normalized
        }
    }
}

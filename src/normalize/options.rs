use derive_builder::Builder;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The single header depth every header is rewritten to.
///
/// This is always between 1 and 6, inclusive. Use [`HeaderLevel::new`] (or [`FromStr`]) to create one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct HeaderLevel(u8);

impl HeaderLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    pub fn new(level: u8) -> Result<Self, InvalidHeaderLevel> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(Self(level))
        } else {
            Err(InvalidHeaderLevel {
                given: level.to_string(),
            })
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// The run of `#` characters for this level, e.g. `"###"` for level 3.
    pub fn marker(self) -> String {
        "#".repeat(usize::from(self.0))
    }
}

impl Default for HeaderLevel {
    fn default() -> Self {
        Self(3)
    }
}

impl Display for HeaderLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HeaderLevel {
    type Err = InvalidHeaderLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u8>() {
            Ok(level) => Self::new(level),
            Err(_) => Err(InvalidHeaderLevel { given: s.to_string() }),
        }
    }
}

impl TryFrom<u8> for HeaderLevel {
    type Error = InvalidHeaderLevel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Returned when a header level is outside `1..=6`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InvalidHeaderLevel {
    given: String,
}

impl std::error::Error for InvalidHeaderLevel {}

impl Display for InvalidHeaderLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "header level must be a number from {} to {}, got {:?}",
            HeaderLevel::MIN,
            HeaderLevel::MAX,
            self.given
        )
    }
}

/// Configuration for one [`normalize`](crate::normalize()) call.
///
/// This is an immutable value: nothing about a conversion depends on state outside of it and the input.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Builder)]
#[builder(default)]
pub struct NormalizeOptions {
    /// Every header, regardless of its original level, is rewritten to this level.
    pub header_level: HeaderLevel,

    /// Refuse input that looks like pasted source code. See [`crate::normalize::check_input`].
    pub guard: bool,

    /// Rewrite line-initial `#` runs to [`Self::header_level`] even when the input was already Markdown.
    pub force_header_level: bool,

    /// Escape literal `#` characters inside header text (`### C\# tips`).
    pub escape_header_hashes: bool,

    /// Remove lines that consist only of three or more dashes.
    pub strip_horizontal_rules: bool,

    /// Single-line code longer than this many characters becomes a fenced block instead of inline code.
    pub code_block_threshold: usize,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            header_level: HeaderLevel::default(),
            guard: true,
            force_header_level: true,
            escape_header_hashes: false,
            strip_horizontal_rules: false,
            code_block_threshold: 50,
        }
    }
}

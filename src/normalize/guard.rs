use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Input prefixes that mark pasted source code. Converting these would mangle them (`#include` reads as a header).
pub const FORBIDDEN_PREFIXES: [&str; 4] = ["import ", "from ", "#include", "#define"];

/// Why a conversion was refused before it started.
///
/// A refusal never comes with partial output.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Refusal {
    /// The input was empty or only whitespace.
    Empty,
    /// The trimmed input starts with one of [`FORBIDDEN_PREFIXES`].
    Forbidden { prefix: &'static str },
}

impl std::error::Error for Refusal {}

impl Display for Refusal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Refusal::Empty => f.write_str("input is empty"),
            Refusal::Forbidden { prefix } => write!(f, "input starts with {prefix:?}; it looks like source code"),
        }
    }
}

/// Checks the whole input before any conversion.
///
/// Only the start of the trimmed input is considered: `"uses #define mid-sentence"` is fine, `"  #define X 1"` is
/// not. With `guard_enabled` off, only empty input is refused.
pub fn check_input(input: &str, guard_enabled: bool) -> Result<(), Refusal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Refusal::Empty);
    }
    if guard_enabled {
        if let Some(prefix) = FORBIDDEN_PREFIXES.iter().find(|prefix| trimmed.starts_with(*prefix)) {
            return Err(Refusal::Forbidden { prefix });
        }
    }
    Ok(())
}

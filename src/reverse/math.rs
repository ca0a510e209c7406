use crate::normalize::ProtectedRegions;
use crate::util::regex_utils::{replace_all_or_keep, static_regex};
use crate::util::str_utils::{decode_entities, escape_html};
use fancy_regex::{Captures, Regex};
use std::fmt::{Display, Formatter};
use tracing::warn;

/// Turns a TeX expression into markup a word processor can display.
///
/// Conversion calls this once per expression. A failure only affects that expression: its original text, delimiters
/// included, is kept.
pub trait MathRenderer {
    fn render(&self, tex: &str, display: bool) -> Result<String, MathRenderError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MathRenderError {
    pub expression: String,
    pub reason: String,
}

impl MathRenderError {
    pub fn new(expression: &str, reason: impl Into<String>) -> Self {
        Self {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}

impl std::error::Error for MathRenderError {}

impl Display for MathRenderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "couldn't render {:?}: {}", self.expression, self.reason)
    }
}

/// The built-in renderer: a MathML `<math>` element that shows the TeX source as text and carries it as an
/// `application/x-tex` annotation.
///
/// It doesn't typeset anything, but it round-trips: normalizing its output recovers the TeX exactly. Expressions with
/// unbalanced braces are rejected.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AnnotatedMathml;

impl MathRenderer for AnnotatedMathml {
    fn render(&self, tex: &str, display: bool) -> Result<String, MathRenderError> {
        let tex = tex.trim();
        if tex.is_empty() {
            return Err(MathRenderError::new(tex, "empty expression"));
        }
        check_braces(tex)?;
        let display = if display { "block" } else { "inline" };
        let escaped = escape_html(tex);
        Ok(format!(
            r#"<math xmlns="http://www.w3.org/1998/Math/MathML" display="{display}"><semantics><mrow><mtext>{escaped}</mtext></mrow><annotation encoding="application/x-tex">{escaped}</annotation></semantics></math>"#
        ))
    }
}

fn check_braces(tex: &str) -> Result<(), MathRenderError> {
    let mut depth = 0usize;
    let mut chars = tex.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '{' => depth += 1,
            '}' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| MathRenderError::new(tex, "unexpected closing brace"))?;
            }
            _ => {}
        }
    }
    if depth == 0 {
        Ok(())
    } else {
        Err(MathRenderError::new(tex, "unclosed brace"))
    }
}

static_regex!(DISPLAY_DOLLARS = r"(?s)\$\$(.+?)\$\$");
static_regex!(DISPLAY_BRACKETS = r"(?s)\\\[(.+?)\\\]");
static_regex!(INLINE_DOLLAR = r"(?<![\\$])\$([^$\n]+?)\$");
static_regex!(INLINE_PARENS = r"\\\((.+?)\\\)");

/// Replaces every math expression in `text` with a placeholder for its rendered markup.
///
/// Display forms are handled before inline ones, so `$$x$$` is never read as two inline delimiters. The input has
/// already been HTML-escaped; expressions are decoded before they reach `renderer`. When rendering fails, the
/// original text is protected instead, so later emphasis handling can't reach into it either.
pub(crate) fn render_math(text: &str, renderer: &dyn MathRenderer, regions: &mut ProtectedRegions) -> String {
    let passes: [(&Regex, bool); 4] = [
        (&*DISPLAY_DOLLARS, true),
        (&*DISPLAY_BRACKETS, true),
        (&*INLINE_DOLLAR, false),
        (&*INLINE_PARENS, false),
    ];
    let mut text = text.to_string();
    for (pattern, display) in passes {
        text = replace_all_or_keep(pattern, &text, |caps: &Captures| {
            let tex = decode_entities(&caps[1]);
            match renderer.render(&tex, display) {
                Ok(markup) => regions.insert(markup),
                Err(err) => {
                    warn!(%err, "math rendering failed; keeping the original expression");
                    regions.insert(&caps[0])
                }
            }
        })
        .into_owned();
    }
    text
}

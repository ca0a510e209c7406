//! Rich markup (or already-normalized Markdown) in, normalized Markdown out.
//!
//! The pipeline is: [guard](check_input) → [format detection](InputFormat::detect) → placeholder protection → (rich
//! input only) parse, [rewrite rules](rules::RULES), render → post-processing → placeholder restoration.
mod detect;
mod document;
mod guard;
mod html;
mod options;
mod post;
mod protect;
mod render;
mod rules;

pub use detect::*;
pub use guard::*;
pub use options::*;
pub use protect::ProtectedRegions;

use document::Document;
use rules::RuleContext;
use tracing::{debug, trace};

/// Converts `input` into normalized Markdown.
///
/// The call is pure: the same input and options always produce the same output. It either returns the whole
/// converted buffer or a [`Refusal`]; it never returns partial output. Running it again on its own output gives back
/// the same text.
///
/// ```
/// use marknorm::{normalize, NormalizeOptions};
///
/// let html = "<h2>Title</h2><p>Some <b>bold</b> and <i>italic</i> text.</p>";
/// let markdown = normalize(html, &NormalizeOptions::default()).unwrap();
/// assert_eq!(markdown, "\n\n### Title\n\nSome **bold** and *italic* text.\n\n");
/// ```
pub fn normalize(input: &str, options: &NormalizeOptions) -> Result<String, Refusal> {
    check_input(input, options.guard)?;
    let format = InputFormat::detect(input);
    debug!(?format, bytes = input.len(), "normalizing");

    let mut regions = ProtectedRegions::for_input(input);
    let protected = protect::extract(input, format, &mut regions);
    trace!(regions = regions.len(), "protected code regions");

    let rendered = match format {
        InputFormat::Rich => {
            let doc = Document::new(html::parse(&protected));
            let ctx = RuleContext {
                options,
                regions: &regions,
            };
            let rewritten = rules::apply_all(doc, &ctx);
            render::render(&rewritten, &mut regions)
        }
        InputFormat::Normalized => protected,
    };
    let processed = post::post_process(&rendered, options);
    Ok(regions.restore(&processed))
}

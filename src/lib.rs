//! Normalize pasted rich markup into Markdown, and Markdown back into word-processor HTML.
//!
//! The crate has two directions:
//!
//! - [`normalize()`] takes either rich markup (HTML copied from a rendered page) or text that is already Markdown,
//!   and produces one canonical Markdown form: every header at the same configured depth, `**bold**` / `*italic*`
//!   emphasis, `$…$` / `$$…$$` math, `* ` bullets and pipe tables.
//! - [`to_rich_markup()`] goes the other way, producing inline-styled HTML suitable for pasting into a word
//!   processor.
//!
//! Both directions are pure: the same input and options always produce the same output, and neither touches the
//! filesystem. The [`run`] module wraps them into the CLI workflow, including debug dumps and a change-detecting
//! [`watch`] loop.
//!
//! ## Example
//!
//! ```
//! use marknorm::{normalize, HeaderLevel, NormalizeOptionsBuilder};
//!
//! let options = NormalizeOptionsBuilder::default()
//!     .header_level(HeaderLevel::new(3).unwrap())
//!     .build()
//!     .unwrap();
//! let markdown = normalize("<h1>Title</h1><p>Some <b>bold</b> text.</p>", &options).unwrap();
//! assert_eq!(markdown, "\n\n### Title\n\nSome **bold** text.\n\n");
//! ```
//!
//! Input that looks like source code is refused instead of being mangled:
//!
//! ```
//! use marknorm::{normalize, NormalizeOptions, Refusal};
//!
//! let refused = normalize("import os\nprint(1)", &NormalizeOptions::default());
//! assert!(matches!(refused, Err(Refusal::Forbidden { .. })));
//! ```
pub mod normalize;
pub mod reverse;
pub mod run;
mod util;
pub mod watch;

pub use normalize::{normalize, HeaderLevel, InvalidHeaderLevel, NormalizeOptions, NormalizeOptionsBuilder, Refusal};
pub use reverse::{to_rich_markup, MathRenderer, RichOptions, RichOptionsBuilder};

use crate::normalize::{HeaderLevel, NormalizeOptions};
use crate::reverse::{HeaderSizing, RichOptions, DEFAULT_FONT_FAMILY};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use derive_builder::Builder;
use std::fmt::{Display, Formatter};

macro_rules! create_options_structs {
    (
        $(
            $(#[$meta:meta])*
            clap $clap:tt
            pub $name:ident : $ty:ty
        ),* $(,)?
    ) => {
        #[derive(Clone, Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Parser)]
        #[command(version, about, long_about = None)]
        #[doc(hidden)]
        pub struct CliOptions {
            $(
            $(#[$meta])*
            #[arg$clap]
            pub(crate) $name: $ty,
            )*

            // clap-only stuff:

            /// Convert input even if it looks like pasted source code.
            ///
            /// By default, input whose first non-blank text starts with `import `, `from `, `#include` or `#define` is
            /// refused, since converting it would mangle it.
            #[arg(long)]
            pub(crate) no_guard: bool,

            /// Leave `#` header markers alone when the input is already Markdown.
            ///
            /// Headers that come from rich markup are always written at --header-level.
            #[arg(long)]
            pub(crate) no_force_header_level: bool,

            /// Files to convert, by path. If none are given, standard input is used.
            ///
            /// Files are converted as if they were concatenated, each followed by a newline. A path of "-" represents
            /// standard input; all but the first "-" are ignored.
            #[arg()]
            pub(crate) input_paths: Vec<String>,
        }

        /// Options analogous to the marknorm CLI's switches.
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Builder)]
        pub struct RunOptions {
            $(
            $(#[$meta])*
            pub $name: $ty,
            )*

            /// Refuse input that looks like source code. This is the inverse of `--no-guard` in the CLI.
            pub guard: bool,

            /// Rewrite `#` runs in Markdown input too. This is the inverse of `--no-force-header-level` in the CLI.
            pub force_header_level: bool,

            pub input_paths: Vec<String>,
        }

        impl From<CliOptions> for RunOptions {
            fn from(value: CliOptions) -> Self {
                Self {
                    $($name: value.$name,)*
                    guard: !value.no_guard,
                    force_header_level: !value.no_force_header_level,
                    input_paths: value.input_paths,
                }
            }
        }
    };
}

create_options_structs! {
    /// Which direction to convert in.
    clap(long, short, value_enum, default_value_t = Target::Markdown)
    pub to: Target,

    /// The depth every header is rewritten to, from 1 to 6.
    clap(long, default_value_t = HeaderLevel::default())
    pub header_level: HeaderLevel,

    /// Escape literal `#` characters inside header text, so `C# tips` becomes `C\# tips`.
    clap(long)
    pub escape_header_hashes: bool,

    /// Remove lines that consist only of `---`.
    clap(long)
    pub strip_rules: bool,

    /// Single-line code longer than this becomes a fenced block instead of inline code.
    clap(long, default_value_t = 50)
    pub code_block_threshold: usize,

    /// The font family for rich output.
    clap(long, default_value = DEFAULT_FONT_FAMILY)
    pub font_family: String,

    /// The largest header size, in points, for rich output. Headers are otherwise sized 16pt, 14pt and then 12pt.
    clap(long)
    pub header_max_pt: Option<u32>,

    /// Wrap rich output in the Windows CF_HTML clipboard format, with its offset header.
    clap(long)
    pub clipboard_format: bool,

    /// Write the input and the converted text to marknorm.before.txt and marknorm.after.txt.
    clap(long)
    pub debug_dump: bool,

    /// Specifies the output format.
    clap(long, short, value_enum, default_value_t = OutputFormat::Text)
    pub output: OutputFormat,

    /// Quiet: do not print anything to stdout. The exit code will still be 0 if the input was converted, and non-0 if
    /// it was refused.
    clap(long, short)
    pub quiet: bool,

    /// Keep re-reading the (single) input file, and print a new conversion each time its content changes.
    clap(long)
    pub watch: bool,

    /// How often --watch re-reads its file, in milliseconds.
    clap(long, default_value_t = 500)
    pub interval_ms: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        let normalize = NormalizeOptions::default();
        Self {
            to: Target::Markdown,
            header_level: normalize.header_level,
            escape_header_hashes: normalize.escape_header_hashes,
            strip_rules: normalize.strip_horizontal_rules,
            code_block_threshold: normalize.code_block_threshold,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            header_max_pt: None,
            clipboard_format: false,
            debug_dump: false,
            output: OutputFormat::Text,
            quiet: false,
            watch: false,
            interval_ms: 500,
            guard: normalize.guard,
            force_header_level: normalize.force_header_level,
            input_paths: Vec::new(),
        }
    }
}

impl From<&RunOptions> for NormalizeOptions {
    fn from(run: &RunOptions) -> Self {
        NormalizeOptions {
            header_level: run.header_level,
            guard: run.guard,
            force_header_level: run.force_header_level,
            escape_header_hashes: run.escape_header_hashes,
            strip_horizontal_rules: run.strip_rules,
            code_block_threshold: run.code_block_threshold,
        }
    }
}

impl From<&RunOptions> for RichOptions {
    fn from(run: &RunOptions) -> Self {
        RichOptions {
            guard: run.guard,
            header_sizing: HeaderSizing {
                max: run.header_max_pt,
                ..HeaderSizing::default()
            },
            font_family: run.font_family.clone(),
        }
    }
}

impl CliOptions {
    pub fn extra_validation(&self) -> bool {
        if self.clipboard_format && self.to != Target::Rich {
            let _ = CliOptions::command()
                .error(ErrorKind::ArgumentConflict, "--clipboard-format requires --to rich")
                .print();
            return false;
        }
        if self.watch {
            match self.input_paths.as_slice() {
                [path] if path != "-" => {}
                _ => {
                    let _ = CliOptions::command()
                        .error(ErrorKind::ArgumentConflict, "--watch requires exactly one input file (not stdin)")
                        .print();
                    return false;
                }
            }
        }
        true
    }
}

/// The conversion direction, analogous to `--to` in the CLI.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
pub enum Target {
    /// Normalize rich markup (or Markdown) into Markdown.
    #[default]
    #[value(alias = "md")]
    Markdown,

    /// Convert Markdown into inline-styled HTML for pasting into a word processor.
    #[value(alias = "html")]
    Rich,
}

impl Display for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let self_str = match self {
            Target::Markdown => "markdown",
            Target::Rich => "rich",
        };
        f.write_str(self_str)
    }
}

/// Output formats, analogous to `--output` in the CLI.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
pub enum OutputFormat {
    /// Print the converted text as-is.
    #[default]
    Text,

    /// Print a JSON object with the converted text (`{"status": "converted", "output": ...}`), or the reason the input
    /// was refused (`{"status": "refused", "reason": "forbidden", "prefix": "import "}`).
    Json,
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let self_str = match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        };
        f.write_str(self_str)
    }
}

use crate::normalize::{normalize, Refusal};
use crate::reverse::{clipboard_payload, to_rich_markup, AnnotatedMathml};
use crate::run::cli::{OutputFormat, Target};
use crate::run::RunOptions;
use crate::watch;
use serde::Serialize;
use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::ops::ControlFlow;
use std::time::Duration;
use std::{env, io};
use tracing::{debug, info};

/// Where `--debug-dump` writes the input buffer.
pub const DEBUG_BEFORE_PATH: &str = "marknorm.before.txt";
/// Where `--debug-dump` writes the converted buffer.
pub const DEBUG_AFTER_PATH: &str = "marknorm.after.txt";

/// The run's overall possible error.
#[derive(Debug)]
pub enum Error {
    /// The input was empty, or looked like source code.
    ///
    /// This comes from [`crate::normalize::check_input`].
    Refused(Refusal),

    /// Couldn't read an input file.
    FileReadError(Input, io::Error),

    /// Couldn't write one of the `--debug-dump` files.
    DebugDump(String, io::Error),

    /// Couldn't write the converted output.
    Output(io::Error),

    /// Watch mode needs exactly one input file, and it can't be stdin.
    NothingToWatch,
}

impl std::error::Error for Error {}

/// Stdin or an input file by path.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Input {
    Stdin,
    FilePath(String),
}

impl Error {
    pub(crate) fn from_io_error(error: io::Error, file: Input) -> Self {
        Error::FileReadError(file, error)
    }
}

impl Display for Input {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Input::Stdin => f.write_str("stdin"),
            Input::FilePath(file) => write!(f, "file {file:?}"),
        }
    }
}

fn io_error_text(err: &io::Error) -> String {
    if env::var("MARKNORM_PORTABLE_ERRORS").unwrap_or_default().is_empty() {
        err.to_string()
    } else {
        format!("{}", err.kind())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Refused(refusal) => writeln!(f, "Refusing to convert: {refusal}"),
            Error::FileReadError(file, err) => writeln!(f, "{} while reading {file}", io_error_text(err)),
            Error::DebugDump(path, err) => writeln!(f, "{} while writing debug dump {path:?}", io_error_text(err)),
            Error::Output(err) => writeln!(f, "{} while writing output", io_error_text(err)),
            Error::NothingToWatch => writeln!(f, "watch mode needs exactly one input file (not stdin)"),
        }
    }
}

/// A simple facade for handling I/O.
///
/// This trait lets you do "I/O-y stuff" like mocking out stdin or reading files. The [`run`] method uses it.
pub trait OsFacade {
    /// Read stdin (or your mock of it) to a `String`.
    fn read_stdin(&self) -> io::Result<String>;

    /// Read a file path (or your mock of one) to a `String`.
    fn read_file(&self, path: &str) -> io::Result<String>;

    /// Write a whole file. Only `--debug-dump` uses this.
    fn write_file(&mut self, path: &str, contents: &str) -> io::Result<()>;

    /// Get a writer for stdout (or your mock of it).
    fn stdout(&mut self) -> impl Write;

    /// Handle an error.
    fn write_error(&mut self, err: Error);

    /// Read a slice of file paths into a single, concatenated `String`, each input followed by one newline.
    ///
    /// The default implementation (which you should feel free to use) treats the file path `"-"` as stdin. The first
    /// `"-"` reads all of stdin (via [`Self::read_stdin`]), and subsequent `"-"`s get silently ignored.
    fn read_all(&self, input_paths: &[String]) -> Result<String, Error> {
        if input_paths.is_empty() {
            return self.read_stdin().map_err(|err| Error::from_io_error(err, Input::Stdin));
        }
        let mut contents = String::new();
        let mut have_read_stdin = false;
        for path in input_paths {
            if path == "-" {
                if !have_read_stdin {
                    contents.push_str(
                        &self
                            .read_stdin()
                            .map_err(|err| Error::from_io_error(err, Input::Stdin))?,
                    );
                    have_read_stdin = true
                }
            } else {
                let path_contents = self
                    .read_file(path)
                    .map_err(|err| Error::from_io_error(err, Input::FilePath(path.to_string())))?;
                contents.push_str(&path_contents);
            }
            contents.push('\n');
        }
        Ok(contents)
    }
}

/// Runs marknorm end to end.
///
/// This reads the inputs named by [`RunOptions::input_paths`] through the [`OsFacade`], converts them in the
/// [`RunOptions::to`] direction, and writes the result to the facade's stdout in the [`RunOptions::output`] format.
/// Returns whether the input was converted; a refusal or I/O failure is passed to [`OsFacade::write_error`].
///
/// With [`RunOptions::watch`], this doesn't return until writing to stdout fails.
pub fn run(cli: &RunOptions, os: &mut impl OsFacade) -> bool {
    match run_or_error(cli, os) {
        Ok(ok) => ok,
        Err(err) => {
            os.write_error(err);
            false
        }
    }
}

fn run_or_error(cli: &RunOptions, os: &mut impl OsFacade) -> Result<bool, Error> {
    if cli.watch {
        return watch_file(cli, os).map(|()| true);
    }
    let contents = os.read_all(&cli.input_paths)?;
    convert_and_write(cli, &contents, os)?;
    Ok(true)
}

fn watch_file<O: OsFacade>(cli: &RunOptions, os: &mut O) -> Result<(), Error> {
    let [path] = cli.input_paths.as_slice() else {
        return Err(Error::NothingToWatch);
    };
    if path == "-" {
        return Err(Error::NothingToWatch);
    }
    info!(%path, interval_ms = cli.interval_ms, "watching for changes");

    // The source and the callback never run at the same time, so the two borrows never overlap.
    let os = RefCell::new(os);
    let mut source = || os.borrow().read_file(path);
    watch::poll(&mut source, Duration::from_millis(cli.interval_ms), |text| {
        let mut os = os.borrow_mut();
        match convert_and_write(cli, text, &mut **os) {
            Ok(()) => ControlFlow::Continue(()),
            Err(err @ Error::Output(_)) => ControlFlow::Break(Err(err)),
            Err(err) => {
                os.write_error(err);
                ControlFlow::Continue(())
            }
        }
    })
}

fn convert_and_write(cli: &RunOptions, input: &str, os: &mut impl OsFacade) -> Result<(), Error> {
    let outcome = convert(cli, input);
    if cli.debug_dump {
        write_debug_dump(os, input, outcome.as_deref().ok())?;
    }
    if !cli.quiet {
        let mut stdout = os.stdout();
        write_outcome(cli.output, &outcome, &mut stdout).map_err(Error::Output)?;
    }
    outcome.map(|_| ()).map_err(Error::Refused)
}

fn convert(cli: &RunOptions, input: &str) -> Result<String, Refusal> {
    debug!(to = %cli.to, bytes = input.len(), "converting");
    match cli.to {
        Target::Markdown => normalize(input, &cli.into()),
        Target::Rich => {
            let html = to_rich_markup(input, &cli.into(), &AnnotatedMathml)?;
            Ok(if cli.clipboard_format {
                clipboard_payload(&html)
            } else {
                html
            })
        }
    }
}

/// The "before" file is always written. The "after" file is only written when the input was converted.
fn write_debug_dump(os: &mut impl OsFacade, before: &str, after: Option<&str>) -> Result<(), Error> {
    let dumps = [(DEBUG_BEFORE_PATH, Some(before)), (DEBUG_AFTER_PATH, after)];
    for (path, contents) in dumps {
        if let Some(contents) = contents {
            os.write_file(path, contents)
                .map_err(|err| Error::DebugDump(path.to_string(), err))?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum JsonOutcome<'a> {
    Converted {
        output: &'a str,
    },
    Refused {
        #[serde(flatten)]
        refusal: &'a Refusal,
    },
}

fn write_outcome(format: OutputFormat, outcome: &Result<String, Refusal>, out: &mut impl Write) -> io::Result<()> {
    match format {
        OutputFormat::Text => match outcome {
            Ok(text) => out.write_all(text.as_bytes())?,
            Err(_) => {}
        },
        OutputFormat::Json => {
            let json = match outcome {
                Ok(output) => JsonOutcome::Converted { output },
                Err(refusal) => JsonOutcome::Refused { refusal },
            };
            serde_json::to_writer(&mut *out, &json)?;
            out.write_all(b"\n")?;
        }
    }
    out.flush()
}

//! End-to-end runs.
//!
//! This module combines the [`crate::normalize`], [`crate::reverse`], and [`crate::watch`] mods into a single
//! workflow. It's useful for building functionality like the CLI's, but running it within-process.
//!
//! ## Example
//!
//! ```
//! # use marknorm::run;
//!
//! // First, let's define a mocked I/O. Replace this with whatever you need.
//! #[derive(Default)]
//! struct MockIo {
//!     stdout: Vec<u8>,
//! }
//!
//! impl run::OsFacade for MockIo {
//!     fn read_stdin(&self) -> std::io::Result<String> {
//!         Ok("<h1>Hello</h1><p>Some <b>bold</b> text.</p>".to_string())
//!     }
//!
//!     fn read_file(&self, path: &str) -> std::io::Result<String> {
//!         Err(std::io::Error::new(std::io::ErrorKind::NotFound, path))
//!     }
//!
//!     fn write_file(&mut self, path: &str, _contents: &str) -> std::io::Result<()> {
//!         Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, path))
//!     }
//!
//!     fn stdout(&mut self) -> impl std::io::Write {
//!         &mut self.stdout
//!     }
//!
//!     fn write_error(&mut self, err: run::Error) {
//!         eprintln!("{err}")
//!     }
//! }
//!
//! // Now, use it:
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! // Use the CLI's defaults, but put headers at level 2.
//! let mut cli_options = run::RunOptions::default();
//! cli_options.header_level = marknorm::HeaderLevel::new(2)?;
//!
//! let mut os_facade = MockIo::default();
//! let converted = run::run(&cli_options, &mut os_facade);
//! let stdout_text = String::from_utf8(os_facade.stdout)?;
//!
//! assert_eq!(converted, true);
//! assert_eq!(stdout_text, "\n\n## Hello\n\nSome **bold** text.\n\n");
//! #
//! #     Ok(())
//! # }
//! ```
mod cli;
mod run_main;

pub use cli::*;
pub use run_main::*;

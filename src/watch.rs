//! Change detection for content that's re-read on an interval, like a clipboard or a file being edited.
//!
//! [`poll`] is a plain synchronous loop: read, compare [fingerprints](Fingerprint), maybe call back, sleep. Only one
//! round is ever in flight, and the only state it keeps between rounds is the last fingerprint it saw.
use std::fmt::{Display, Formatter};
use std::io;
use std::ops::ControlFlow;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// A short hash of some content, used to tell whether it changed since the last look.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(text: &str) -> Self {
        Self(sha1_smol::Sha1::from(text).digest().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remembers the last fingerprint and decides whether new content is worth converting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeDetector {
    last: Option<Fingerprint>,
    min_len: usize,
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN_LEN)
    }
}

impl ChangeDetector {
    pub const DEFAULT_MIN_LEN: usize = 5;

    pub fn new(min_len: usize) -> Self {
        Self { last: None, min_len }
    }

    /// Returns `true` if `text` differs from the previously observed content and its trimmed form has at least
    /// `min_len` characters.
    ///
    /// Short content still becomes the new "last seen", so it won't be reconsidered until something else shows up in
    /// between.
    pub fn observe(&mut self, text: &str) -> bool {
        let fingerprint = Fingerprint::of(text);
        if self.last.as_ref() == Some(&fingerprint) {
            return false;
        }
        let long_enough = text.trim().chars().count() >= self.min_len;
        if !long_enough {
            debug!(%fingerprint, "content changed, but it's too short to convert");
        }
        self.last = Some(fingerprint);
        long_enough
    }
}

/// Something [`poll`] can re-read.
pub trait ContentSource {
    fn read(&mut self) -> io::Result<String>;
}

impl<F> ContentSource for F
where
    F: FnMut() -> io::Result<String>,
{
    fn read(&mut self) -> io::Result<String> {
        self()
    }
}

/// Reads `source` every `interval`, calling `on_change` with each new piece of content.
///
/// The loop ends when `on_change` returns [`ControlFlow::Break`], and `poll` returns the break value. Read errors are
/// logged and the next round tries again.
pub fn poll<S, B, F>(source: &mut S, interval: Duration, mut on_change: F) -> B
where
    S: ContentSource + ?Sized,
    F: FnMut(&str) -> ControlFlow<B>,
{
    let mut detector = ChangeDetector::default();
    loop {
        match source.read() {
            Ok(text) => {
                if detector.observe(&text) {
                    if let ControlFlow::Break(value) = on_change(&text) {
                        return value;
                    }
                }
            }
            Err(err) => warn!(%err, "couldn't read watched content; will retry"),
        }
        thread::sleep(interval);
    }
}

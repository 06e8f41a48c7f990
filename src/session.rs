//! Bounded tail session: the view a renderer polls.
//!
//! A session seeds from at most `max_bytes` at the end of the file, then
//! keeps appending newly completed lines to an in-memory buffer that never
//! exceeds `max_chars` characters (oldest text is dropped first). Every
//! failure is returned as a [`TailEvent::Error`] rather than an `Err`, so a
//! caller can't forget the failure path.

use crate::error::TailError;
use crate::event::TailEvent;
use crate::fs::{FileAccess, OsFileAccess};
use crate::tailer::OffsetTailer;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_MAX_BYTES: u64 = 200_000;
pub const DEFAULT_MAX_CHARS: usize = 200_000;

const SEED_ATTEMPTS: u32 = 3;

/// Construction-time budgets. Zero means "show nothing".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailLimits {
    /// Most bytes the seed read in `start` may touch.
    pub max_bytes: u64,
    /// Most characters retained in the display buffer.
    pub max_chars: usize,
}

impl Default for TailLimits {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

/// Single-owner tail of one file. Not meant to be polled from two places.
#[derive(Debug)]
pub struct BoundedTailSession<F = OsFileAccess> {
    fs: F,
    limits: TailLimits,
    tailer: OffsetTailer,
    path: Option<PathBuf>,
    text: String,
    seeded_from_offset: u64,
    /// `start` got as far as the seed read. Until then `poll` retries the seed.
    seeded: bool,
}

impl BoundedTailSession<OsFileAccess> {
    pub fn with_limits(limits: TailLimits) -> Self {
        Self::new(OsFileAccess, limits)
    }
}

impl<F: FileAccess> BoundedTailSession<F> {
    pub fn new(fs: F, limits: TailLimits) -> Self {
        Self {
            fs,
            limits,
            tailer: OffsetTailer::new(),
            path: None,
            text: String::new(),
            seeded_from_offset: 0,
            seeded: false,
        }
    }

    /// Begin tailing `path`, discarding everything from a previous start.
    pub fn start(&mut self, path: impl Into<PathBuf>) -> TailEvent {
        let path = path.into();
        self.path = Some(path.clone());
        self.seed(&path)
    }

    /// Pick up whatever changed since the last call.
    ///
    /// `None` means nothing to render: either `start` was never called, or
    /// the file neither grew by a complete line nor shrank.
    pub fn poll(&mut self) -> Option<TailEvent> {
        let path = self.path.clone()?;
        if !self.seeded {
            // A failed start left nothing to append to; seed under the byte budget.
            return Some(self.seed(&path));
        }

        let chunk = match self.tailer.tail(&self.fs, &path) {
            Ok(chunk) => chunk,
            Err(e) => return Some(fail(&path, e)),
        };
        if chunk.is_unchanged() {
            return None;
        }

        if chunk.truncated {
            // Pre-truncation text may belong to a different file generation.
            self.text.clear();
            self.seeded_from_offset = 0;
        }
        push_lines(&mut self.text, &chunk.lines);
        trim_to_chars(&mut self.text, self.limits.max_chars);

        let truncated = self.seeded_from_offset > 0 || chunk.truncated;
        Some(self.set_event(&path, truncated, chunk.size))
    }

    fn seed(&mut self, path: &Path) -> TailEvent {
        self.text.clear();
        self.seeded_from_offset = 0;
        self.seeded = false;

        let mut attempt = 1;
        let (start, chunk) = loop {
            self.tailer.reset();
            let size = match self.fs.stat(path) {
                Ok(size) => size,
                Err(e) => return fail(path, e),
            };

            let start = size.saturating_sub(self.limits.max_bytes);
            if start > 0 {
                debug!(path = %path.display(), size, start, "seeding tail from end of large file");
                self.tailer.seek(start);
            }

            // Growth after the stat above is left for the next poll.
            let chunk = match self.tailer.tail_bounded(&self.fs, path, self.limits.max_bytes) {
                Ok(chunk) => chunk,
                Err(e) => return fail(path, e),
            };
            if !chunk.truncated || attempt == SEED_ATTEMPTS {
                break (start, chunk);
            }
            // Shrank between the stat and the read; the seed offset no longer applies.
            debug!(path = %path.display(), attempt, "file shrank while seeding; retrying");
            attempt += 1;
        };

        self.seeded = true;
        self.seeded_from_offset = if chunk.truncated { 0 } else { start };

        push_lines(&mut self.text, &chunk.lines);
        trim_to_chars(&mut self.text, self.limits.max_chars);

        self.set_event(path, start > 0 || chunk.truncated, chunk.size)
    }

    fn set_event(&self, path: &Path, truncated: bool, size: u64) -> TailEvent {
        TailEvent::Set {
            path: path.display().to_string(),
            content: self.text.clone(),
            truncated,
            empty: self.text.is_empty(),
            size,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte offset the current view was seeded from (0 = whole file).
    pub fn seeded_from_offset(&self) -> u64 {
        self.seeded_from_offset
    }

    pub fn limits(&self) -> TailLimits {
        self.limits
    }

    pub fn is_started(&self) -> bool {
        self.path.is_some()
    }
}

fn fail(path: &Path, err: io::Error) -> TailEvent {
    let err = TailError::from_io(path, err);
    debug!(path = %path.display(), error = %err, "tail failed");
    err.into_event()
}

fn push_lines(text: &mut String, lines: &[String]) {
    for line in lines {
        text.push_str(line);
        text.push('\n');
    }
}

/// Keep only the last `max` characters of `text`.
pub fn trim_to_chars(text: &mut String, max: usize) {
    let count = text.chars().count();
    if count <= max {
        return;
    }
    match text.char_indices().nth(count - max) {
        Some((idx, _)) => {
            text.drain(..idx);
        }
        None => text.clear(),
    }
}

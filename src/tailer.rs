//! Offset-tracking incremental line reader.
//!
//! [`OffsetTailer`] remembers how far into a file it has consumed and keeps
//! any unterminated trailing bytes aside until a later read completes them.
//! A file that is now smaller than the consumed offset has been truncated or
//! replaced; the tailer then starts over from byte 0.

use crate::fs::FileAccess;
use std::io;
use std::path::Path;
use tracing::{debug, trace};

/// Result of one [`OffsetTailer::tail`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TailChunk {
    /// Complete lines appended since the previous call, in file order,
    /// without their terminators.
    pub lines: Vec<String>,
    /// The file shrank below the tracked offset and was re-read from 0.
    pub truncated: bool,
    /// File size observed by the stat backing this call.
    pub size: u64,
}

impl TailChunk {
    pub fn is_unchanged(&self) -> bool {
        self.lines.is_empty() && !self.truncated
    }
}

#[derive(Debug, Default)]
pub struct OffsetTailer {
    offset: u64,
    pending: Vec<u8>,
}

impl OffsetTailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.offset = 0;
        self.pending.clear();
    }

    /// Skip everything before `offset`.
    ///
    /// Not validated against the file: an offset past the end just yields
    /// nothing until the file grows past it (or shrinks, which counts as a
    /// truncation).
    pub fn seek(&mut self, offset: u64) {
        self.offset = offset;
        self.pending.clear();
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Bytes held back because they are not yet terminated by a newline.
    ///
    /// Grows without bound if the producer never writes a newline.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Read whatever was appended to `path` since the last call.
    ///
    /// Errors from the stat or the read are returned as-is; the tailer state
    /// is left untouched when the read fails.
    pub fn tail<F: FileAccess + ?Sized>(&mut self, fs: &F, path: &Path) -> io::Result<TailChunk> {
        self.tail_bounded(fs, path, u64::MAX)
    }

    /// Like [`tail`](Self::tail), but reads at most `max_len` bytes. Anything
    /// past that is left for the next call.
    pub fn tail_bounded<F: FileAccess + ?Sized>(
        &mut self,
        fs: &F,
        path: &Path,
        max_len: u64,
    ) -> io::Result<TailChunk> {
        let size = fs.stat(path)?;

        let truncated = size < self.offset;
        let start = if truncated {
            debug!(
                path = %path.display(),
                offset = self.offset,
                size,
                "file shrank below tail offset; re-reading from start"
            );
            0
        } else {
            self.offset
        };
        let end = size.min(start.saturating_add(max_len));

        if !truncated && end == self.offset {
            return Ok(TailChunk {
                size,
                ..TailChunk::default()
            });
        }

        let buf = fs.read_range(path, start, end)?;
        trace!(path = %path.display(), start, read = buf.len(), "tail read");

        if truncated {
            self.pending.clear();
        }
        // Short reads (file shrank after the stat) advance only by what was read.
        self.offset = start + buf.len() as u64;
        self.pending.extend_from_slice(&buf);

        Ok(TailChunk {
            lines: drain_lines(&mut self.pending),
            truncated,
            size,
        })
    }
}

/// Split off every newline-terminated line in `buffer`, leaving the
/// unterminated remainder in place. A trailing `\r` is dropped so CRLF files
/// read the same as LF files.
fn drain_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    let mut start = 0usize;

    for (idx, b) in buffer.iter().enumerate() {
        if *b != b'\n' {
            continue;
        }
        let mut line = &buffer[start..idx];
        if let [rest @ .., b'\r'] = line {
            line = rest;
        }
        lines.push(String::from_utf8_lossy(line).into_owned());
        start = idx + 1;
    }

    if start > 0 {
        buffer.drain(..start);
    }
    lines
}

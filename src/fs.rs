//! File access capability used by the tailer.
//!
//! The tailing engine only needs two primitives: the current size of a file
//! and the bytes in a half-open range. Both are behind [`FileAccess`] so the
//! engine can run against the real filesystem ([`OsFileAccess`]) or an
//! in-memory fake ([`MemoryFileAccess`]).

use std::collections::HashMap;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Stat + ranged read over some file store.
pub trait FileAccess {
    /// Current size of the file in bytes.
    fn stat(&self, path: &Path) -> io::Result<u64>;

    /// Bytes in `start..end`. May return fewer bytes if the file shrank
    /// since the last `stat`, never more.
    fn read_range(&self, path: &Path, start: u64, end: u64) -> io::Result<Vec<u8>>;
}

impl<T: FileAccess + ?Sized> FileAccess for &T {
    fn stat(&self, path: &Path) -> io::Result<u64> {
        (**self).stat(path)
    }

    fn read_range(&self, path: &Path, start: u64, end: u64) -> io::Result<Vec<u8>> {
        (**self).read_range(path, start, end)
    }
}

impl<T: FileAccess + ?Sized> FileAccess for Arc<T> {
    fn stat(&self, path: &Path) -> io::Result<u64> {
        (**self).stat(path)
    }

    fn read_range(&self, path: &Path, start: u64, end: u64) -> io::Result<Vec<u8>> {
        (**self).read_range(path, start, end)
    }
}

// ---------------------------------------------------------------------------
// Real filesystem
// ---------------------------------------------------------------------------

/// [`FileAccess`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileAccess;

impl FileAccess for OsFileAccess {
    fn stat(&self, path: &Path) -> io::Result<u64> {
        let meta = std::fs::metadata(path)?;
        if meta.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "is a directory",
            ));
        }
        Ok(meta.len())
    }

    fn read_range(&self, path: &Path, start: u64, end: u64) -> io::Result<Vec<u8>> {
        if end <= start {
            return Ok(Vec::new());
        }
        let mut file = std::fs::File::open(path)?;
        file.seek(SeekFrom::Start(start))?;

        // The file may have grown since the stat; never read past `end`.
        let mut buf = Vec::with_capacity((end - start) as usize);
        file.take(end - start).read_to_end(&mut buf)?;
        Ok(buf)
    }
}

// ---------------------------------------------------------------------------
// In-memory fake
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Entry {
    File(Vec<u8>),
    Broken(io::ErrorKind),
}

/// In-memory [`FileAccess`] for tests and embedding.
///
/// Share it with a session through an `Arc` and mutate it from the outside
/// to simulate a producer appending, truncating or deleting files.
#[derive(Debug, Default)]
pub struct MemoryFileAccess {
    entries: Mutex<HashMap<PathBuf, Entry>>,
    read_failures: Mutex<HashMap<PathBuf, io::ErrorKind>>,
}

impl MemoryFileAccess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the file's contents (creating it if needed).
    pub fn write(&self, path: impl Into<PathBuf>, contents: impl AsRef<[u8]>) {
        self.with_entries(|entries| {
            entries.insert(path.into(), Entry::File(contents.as_ref().to_vec()));
        });
    }

    /// Append to the file (creating it if needed).
    pub fn append(&self, path: impl Into<PathBuf>, contents: impl AsRef<[u8]>) {
        self.with_entries(|entries| {
            let entry = entries
                .entry(path.into())
                .or_insert_with(|| Entry::File(Vec::new()));
            match entry {
                Entry::File(bytes) => bytes.extend_from_slice(contents.as_ref()),
                Entry::Broken(_) => *entry = Entry::File(contents.as_ref().to_vec()),
            }
        });
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        self.with_entries(|entries| {
            entries.remove(path.as_ref());
        });
    }

    /// Make every access to `path` fail with `kind`.
    pub fn fail_with(&self, path: impl Into<PathBuf>, kind: io::ErrorKind) {
        self.with_entries(|entries| {
            entries.insert(path.into(), Entry::Broken(kind));
        });
    }

    /// Let `stat` succeed but make reads of `path` fail with `kind`.
    pub fn fail_reads_with(&self, path: impl Into<PathBuf>, kind: io::ErrorKind) {
        locked(&self.read_failures).insert(path.into(), kind);
    }

    pub fn clear_read_failure(&self, path: impl AsRef<Path>) {
        locked(&self.read_failures).remove(path.as_ref());
    }

    fn with_entries<R>(&self, f: impl FnOnce(&mut HashMap<PathBuf, Entry>) -> R) -> R {
        f(&mut locked(&self.entries))
    }

    fn lookup(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.with_entries(|entries| match entries.get(path) {
            Some(Entry::File(bytes)) => Ok(bytes.clone()),
            Some(Entry::Broken(kind)) => Err(io::Error::from(*kind)),
            None => Err(io::Error::from(io::ErrorKind::NotFound)),
        })
    }
}

impl FileAccess for MemoryFileAccess {
    fn stat(&self, path: &Path) -> io::Result<u64> {
        self.lookup(path).map(|bytes| bytes.len() as u64)
    }

    fn read_range(&self, path: &Path, start: u64, end: u64) -> io::Result<Vec<u8>> {
        if let Some(kind) = locked(&self.read_failures).get(path) {
            return Err(io::Error::from(*kind));
        }
        let bytes = self.lookup(path)?;
        let len = bytes.len() as u64;
        let start = start.min(len) as usize;
        let end = end.min(len) as usize;
        if end <= start {
            return Ok(Vec::new());
        }
        Ok(bytes[start..end].to_vec())
    }
}

// A panic while holding the lock leaves plain data behind; keep going.
fn locked<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

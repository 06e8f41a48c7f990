//! Failure taxonomy for tailing.

use crate::event::TailEvent;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const NOT_FOUND_MESSAGE: &str = "File not found.";

#[derive(Error, Debug)]
pub enum TailError {
    /// The file does not exist (anymore).
    #[error("{}", NOT_FOUND_MESSAGE)]
    NotFound { path: PathBuf },
    /// Anything else the filesystem reported; shown as the OS message.
    #[error("{source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TailError {
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source: err,
            }
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound { path } | Self::Io { path, .. } => path,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn into_event(self) -> TailEvent {
        TailEvent::Error {
            path: self.path().display().to_string(),
            message: self.to_string(),
        }
    }
}

//! Events handed to whoever renders a tailed file.

use crate::error::NOT_FOUND_MESSAGE;
use serde::{Deserialize, Serialize};

/// Outcome of a session `start` or a `poll` that saw a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TailEvent {
    /// Replace the displayed view with `content`.
    Set {
        path: String,
        content: String,
        /// `content` does not start at the beginning of the file's history.
        truncated: bool,
        empty: bool,
        size: u64,
    },
    /// The file could not be stat'd or read.
    Error { path: String, message: String },
}

impl TailEvent {
    pub fn path(&self) -> &str {
        match self {
            Self::Set { path, .. } | Self::Error { path, .. } => path,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// An error event produced by [`TailError::NotFound`](crate::TailError::NotFound).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Error { message, .. } if message == NOT_FOUND_MESSAGE)
    }
}

//! Tailpane — bounded incremental tail of growing text files
//!
//! - [`OffsetTailer`]: reads only bytes appended since the last call
//! - [`BoundedTailSession`]: seeded, size-capped view for rendering
//! - [`follow`]: tokio driver that polls a session on an interval

mod error;
mod event;
pub mod fs;
mod session;
mod tailer;

pub use error::*;
pub use event::*;
pub use session::*;
pub use tailer::*;

pub mod config;
pub mod follow;
pub mod render;

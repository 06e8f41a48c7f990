//! Terminal output for tail events.

use crate::event::TailEvent;
use std::io::{self, Write};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    /// One JSON object per line instead of a redrawn view.
    pub json: bool,
    /// Clear the terminal before each redraw.
    pub redraw: bool,
}

impl Renderer {
    /// Write `event`. In text mode errors go to `err`; in JSON mode
    /// everything goes to `out` so the stream stays complete.
    pub fn render(
        &self,
        out: &mut impl Write,
        err: &mut impl Write,
        event: &TailEvent,
    ) -> io::Result<()> {
        if self.json {
            serde_json::to_writer(&mut *out, event).map_err(io::Error::other)?;
            out.write_all(b"\n")?;
            return out.flush();
        }

        match event {
            TailEvent::Set {
                path,
                content,
                truncated,
                empty,
                size,
            } => {
                if self.redraw {
                    out.write_all(CLEAR_SCREEN.as_bytes())?;
                }
                let now = chrono::Local::now().format("%H:%M:%S").to_string();
                writeln!(out, "{}", status_line(path, *size, *truncated, &now))?;
                if *empty {
                    writeln!(out, "(empty)")?;
                } else {
                    out.write_all(content.as_bytes())?;
                }
                out.flush()
            }
            TailEvent::Error { path, message } => {
                writeln!(err, "tailpane: {path}: {message}")?;
                err.flush()
            }
        }
    }
}

pub fn status_line(path: &str, size: u64, truncated: bool, at: &str) -> String {
    let mut line = format!("==> {path} ({size} bytes, updated {at})");
    if truncated {
        line.push_str(" [earlier output omitted]");
    }
    line.push_str(" <==");
    line
}

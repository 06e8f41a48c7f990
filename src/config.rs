//! User configuration (`config.json` in the platform config directory).
//!
//! On Linux this is `~/.config/tailpane/config.json`, on macOS
//! `~/Library/Application Support/tailpane/config.json`.

use crate::session::{DEFAULT_MAX_BYTES, DEFAULT_MAX_CHARS, TailLimits};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Tail settings persisted to config.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Most bytes read from the end of a file when a tail starts.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    /// Most characters kept on screen.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Stop following once a previously seen file disappears.
    #[serde(default)]
    pub exit_on_missing: bool,
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_BYTES
}

fn default_max_chars() -> usize {
    DEFAULT_MAX_CHARS
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            max_chars: default_max_chars(),
            poll_interval_ms: default_poll_interval_ms(),
            exit_on_missing: false,
        }
    }
}

impl Config {
    pub fn limits(&self) -> TailLimits {
        TailLimits {
            max_bytes: self.max_bytes,
            max_chars: self.max_chars,
        }
    }

    /// Poll interval, clamped so a zero in the config doesn't spin.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }
}

fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tailpane"))
}

/// Load config from disk, returning defaults if the file is missing or invalid.
pub fn load_config() -> Config {
    let Some(path) = config_dir().map(|d| d.join("config.json")) else {
        return Config::default();
    };
    load_config_from(&path)
}

/// Save config to disk.
pub fn save_config(config: &Config) -> Result<(), std::io::Error> {
    let dir = config_dir().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "config dir not found")
    })?;
    save_config_to(config, &dir.join("config.json"))
}

pub fn load_config_from(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "invalid config; using defaults");
                Config::default()
            }
        },
        Err(_) => Config::default(),
    }
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;
    atomic_write(path, json.as_bytes())
}

/// Write to a temp file in the same directory, then rename over the target.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), std::io::Error> {
    use std::io::Write;

    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent")
    })?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

//! Tailpane — follow a growing text file with bounded memory
//!
//! Shows the most recent window of a file and keeps it current by polling,
//! coping with files that are rotated or truncated underneath it.

use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tailpane::config::{self, Config};
use tailpane::follow::{self, FollowOptions};
use tailpane::render::Renderer;
use tailpane::{BoundedTailSession, TailEvent};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "tailpane", about = "Follow a growing text file with bounded memory")]
struct Cli {
    /// File to follow
    path: PathBuf,

    /// Most bytes read from the end of the file at start
    #[arg(long)]
    max_bytes: Option<u64>,

    /// Most characters kept on screen
    #[arg(long)]
    max_chars: Option<usize>,

    /// Poll interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Print events as newline-delimited JSON
    #[arg(long)]
    json: bool,

    /// Print the current tail once and exit
    #[arg(long)]
    once: bool,

    /// Stop once the file disappears after having been read
    #[arg(long)]
    exit_on_missing: bool,

    /// Append updates instead of redrawing the screen
    #[arg(long)]
    no_clear: bool,

    /// Persist the effective settings to the config file
    #[arg(long)]
    save_config: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(max_bytes) = self.max_bytes {
            config.max_bytes = max_bytes;
        }
        if let Some(max_chars) = self.max_chars {
            config.max_chars = max_chars;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.poll_interval_ms = interval_ms;
        }
        if self.exit_on_missing {
            config.exit_on_missing = true;
        }
        config
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_env("TAILPANE_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.apply(config::load_config());
    if cli.save_config {
        match config::save_config(&config) {
            Ok(()) => info!("saved config"),
            Err(e) => warn!(error = %e, "failed to save config"),
        }
    }

    let renderer = Renderer {
        json: cli.json,
        redraw: !cli.no_clear && !cli.once && std::io::stdout().is_terminal(),
    };

    if cli.once {
        let mut session = BoundedTailSession::with_limits(config.limits());
        let event = session.start(&cli.path);
        emit(&renderer, &event);
        return if event.is_error() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    let options = FollowOptions {
        limits: config.limits(),
        interval: config.poll_interval(),
        exit_on_missing: config.exit_on_missing,
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("tailpane: failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };
    rt.block_on(async move {
        let mut handle = follow::spawn(cli.path, options);
        while let Some(event) = handle.recv().await {
            emit(&renderer, &event);
        }
    });
    ExitCode::SUCCESS
}

fn emit(renderer: &Renderer, event: &TailEvent) {
    let mut out = std::io::stdout().lock();
    let mut err = std::io::stderr().lock();
    if let Err(e) = renderer.render(&mut out, &mut err, event) {
        warn!(error = %e, "failed to write output");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_path_only() {
        let cli = Cli::try_parse_from(["tailpane", "/tmp/build.log"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("/tmp/build.log"));
        assert!(!cli.json);
        assert!(!cli.once);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn cli_requires_path() {
        assert!(Cli::try_parse_from(["tailpane"]).is_err());
    }

    #[test]
    fn cli_verbose_three() {
        let cli = Cli::try_parse_from(["tailpane", "-vvv", "x.log"]).unwrap();
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn cli_flags_override_config() {
        let cli = Cli::try_parse_from([
            "tailpane",
            "--max-bytes",
            "10",
            "--max-chars",
            "20",
            "--interval-ms",
            "30",
            "--exit-on-missing",
            "x.log",
        ])
        .unwrap();
        let config = cli.apply(Config::default());
        assert_eq!(config.max_bytes, 10);
        assert_eq!(config.max_chars, 20);
        assert_eq!(config.poll_interval_ms, 30);
        assert!(config.exit_on_missing);
    }

    #[test]
    fn cli_unset_flags_keep_config() {
        let cli = Cli::try_parse_from(["tailpane", "--json", "--once", "x.log"]).unwrap();
        assert!(cli.json);
        assert!(cli.once);
        let config = cli.apply(Config {
            max_bytes: 7,
            ..Config::default()
        });
        assert_eq!(config.max_bytes, 7);
        assert_eq!(config.max_chars, 200_000);
    }
}

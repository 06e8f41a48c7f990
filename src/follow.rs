//! Interval-driven follower.
//!
//! Owns a [`BoundedTailSession`], starts it once and then polls it on a fixed
//! interval from a tokio task, pushing every event into a channel. The
//! session's blocking stat/read calls run on the blocking pool. Dropping the
//! [`FollowHandle`] stops the task.

use crate::event::TailEvent;
use crate::fs::{FileAccess, OsFileAccess};
use crate::session::{BoundedTailSession, TailLimits};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy)]
pub struct FollowOptions {
    pub limits: TailLimits,
    pub interval: Duration,
    /// Stop after delivering "File not found." for a file that was seen before.
    pub exit_on_missing: bool,
}

impl Default for FollowOptions {
    fn default() -> Self {
        Self {
            limits: TailLimits::default(),
            interval: Duration::from_millis(500),
            exit_on_missing: false,
        }
    }
}

#[derive(Debug)]
pub struct FollowHandle {
    rx: mpsc::Receiver<TailEvent>,
    task: JoinHandle<()>,
}

impl FollowHandle {
    /// Next event, or `None` once the follower has stopped.
    pub async fn recv(&mut self) -> Option<TailEvent> {
        self.rx.recv().await
    }
}

impl Drop for FollowHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Follow `path` on the real filesystem.
pub fn spawn(path: impl Into<PathBuf>, options: FollowOptions) -> FollowHandle {
    spawn_with(OsFileAccess, path, options)
}

/// Follow `path` through any [`FileAccess`].
pub fn spawn_with<F>(fs: F, path: impl Into<PathBuf>, options: FollowOptions) -> FollowHandle
where
    F: FileAccess + Send + 'static,
{
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let session = BoundedTailSession::new(fs, options.limits);
    let task = tokio::spawn(run(session, path.into(), options, tx));
    FollowHandle { rx, task }
}

async fn run<F>(
    session: BoundedTailSession<F>,
    path: PathBuf,
    options: FollowOptions,
    tx: mpsc::Sender<TailEvent>,
) where
    F: FileAccess + Send + 'static,
{
    let mut ticker = tokio::time::interval(options.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    info!(path = %path.display(), interval_ms = options.interval.as_millis() as u64, "following file");

    let Some((mut session, first)) = on_blocking(session, move |s| s.start(path)).await else {
        return;
    };

    let mut seen = false;
    let mut next = Some(first);
    loop {
        if let Some(event) = next.take() {
            let stop = options.exit_on_missing && seen && event.is_not_found();
            if matches!(event, TailEvent::Set { .. }) {
                seen = true;
            }
            if tx.send(event).await.is_err() {
                debug!("follow receiver dropped; stopping");
                return;
            }
            if stop {
                info!("followed file disappeared; stopping");
                return;
            }
        }

        ticker.tick().await;
        let Some((s, event)) = on_blocking(session, |s| s.poll()).await else {
            return;
        };
        session = s;
        if event.is_none() {
            trace!("no change");
        }
        next = event;
    }
}

/// Run `f` against the session on the blocking pool and hand the session back.
async fn on_blocking<F, R>(
    mut session: BoundedTailSession<F>,
    f: impl FnOnce(&mut BoundedTailSession<F>) -> R + Send + 'static,
) -> Option<(BoundedTailSession<F>, R)>
where
    F: FileAccess + Send + 'static,
    R: Send + 'static,
{
    let joined = tokio::task::spawn_blocking(move || {
        let out = f(&mut session);
        (session, out)
    })
    .await;
    match joined {
        Ok(pair) => Some(pair),
        Err(e) => {
            warn!(error = %e, "tail task failed");
            None
        }
    }
}

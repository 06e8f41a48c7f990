use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tailpane::follow::{self, FollowOptions};
use tailpane::{BoundedTailSession, NOT_FOUND_MESSAGE, TailEvent, TailLimits};
use tempfile::TempDir;
use tokio::time::timeout;

fn append(path: &Path, text: &str) {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    file.write_all(text.as_bytes()).unwrap();
}

fn limits(max_bytes: u64, max_chars: usize) -> TailLimits {
    TailLimits {
        max_bytes,
        max_chars,
    }
}

fn set_content(event: Option<TailEvent>) -> (String, bool) {
    match event {
        Some(TailEvent::Set {
            content, truncated, ..
        }) => (content, truncated),
        other => panic!("expected set event, got {other:?}"),
    }
}

#[test]
fn appended_lines_arrive_once_in_order() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("progress.log");
    append(&path, "");

    let mut session = BoundedTailSession::with_limits(limits(1 << 20, 1 << 20));
    let (content, truncated) = set_content(Some(session.start(&path)));
    assert_eq!(content, "");
    assert!(!truncated);

    let mut expected = String::new();
    for i in 0..20 {
        let line = format!("step {i}\n");
        append(&path, &line);
        expected.push_str(&line);
        let (content, _) = set_content(session.poll());
        assert_eq!(content, expected);
    }
    assert!(session.poll().is_none());
}

#[test]
fn rotated_file_replaces_view() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("progress.log");
    append(&path, "generation one, line a\ngeneration one, line b\n");

    let mut session = BoundedTailSession::with_limits(limits(1 << 20, 1 << 20));
    session.start(&path);

    std::fs::write(&path, "gen2\n").unwrap();
    let (content, truncated) = set_content(session.poll());
    assert_eq!(content, "gen2\n");
    assert!(truncated);
    assert!(!content.contains("generation one"));
}

#[test]
fn large_file_is_seeded_from_tail() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("big.log");
    let mut body = String::new();
    for i in 0..10_000 {
        body.push_str(&format!("{i:08}\n"));
    }
    std::fs::write(&path, &body).unwrap();

    let mut session = BoundedTailSession::with_limits(limits(90, 1000));
    let (content, truncated) = set_content(Some(session.start(&path)));
    assert!(truncated);
    assert_eq!(session.seeded_from_offset(), body.len() as u64 - 90);
    assert_eq!(content, &body[body.len() - 90..]);
    assert!(content.ends_with("00009999\n"));
}

#[test]
fn missing_and_unreadable_paths_are_distinguished() {
    let tmp = TempDir::new().unwrap();
    let mut session = BoundedTailSession::with_limits(TailLimits::default());

    match session.start(tmp.path().join("absent.log")) {
        TailEvent::Error { message, .. } => assert_eq!(message, NOT_FOUND_MESSAGE),
        other => panic!("expected error, got {other:?}"),
    }

    // A directory exists but is not a readable text file.
    match session.start(tmp.path()) {
        TailEvent::Error { message, .. } => assert_ne!(message, NOT_FOUND_MESSAGE),
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn follower_tracks_real_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("job.log");
    append(&path, "queued\n");

    let options = FollowOptions {
        limits: limits(1024, 1024),
        interval: Duration::from_millis(10),
        exit_on_missing: true,
    };
    let mut handle = follow::spawn(&path, options);
    let deadline = Duration::from_secs(5);

    let (content, _) = set_content(timeout(deadline, handle.recv()).await.unwrap());
    assert_eq!(content, "queued\n");

    append(&path, "running\n");
    let (content, _) = set_content(timeout(deadline, handle.recv()).await.unwrap());
    assert_eq!(content, "queued\nrunning\n");

    std::fs::remove_file(&path).unwrap();
    match timeout(deadline, handle.recv()).await.unwrap() {
        Some(TailEvent::Error { message, .. }) => assert_eq!(message, NOT_FOUND_MESSAGE),
        other => panic!("expected not-found, got {other:?}"),
    }
    assert!(timeout(deadline, handle.recv()).await.unwrap().is_none());
}

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossbeam::channel::{self, Receiver};
use tempfile::TempDir;

use super::debouncer::Debouncer;
use super::types::{ChangeKind, Target};
use super::{ChangeWatcher, SourceFilter, WatchError};
use crate::utils::path::normalize_path;

const DEBOUNCE: Duration = Duration::from_millis(50);
/// Generous bound for a real filesystem event to arrive.
const EVENT_WAIT: Duration = Duration::from_secs(3);
/// How long "nothing happens" is observed.
const QUIET_WAIT: Duration = Duration::from_millis(400);

fn make_event(paths: Vec<&str>, kind: notify::EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.into_iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

fn metadata_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
        notify::event::MetadataKind::WriteTime,
    ))
}

fn create_kind() -> notify::EventKind {
    notify::EventKind::Create(notify::event::CreateKind::File)
}

fn remove_kind() -> notify::EventKind {
    notify::EventKind::Remove(notify::event::RemoveKind::File)
}

fn source_target() -> Target {
    Target::Source(SourceFilter::default())
}

// ============================================================================
// Debouncer
// ============================================================================

#[test]
fn test_debouncer_empty() {
    let debouncer = Debouncer::new(DEBOUNCE);
    assert!(!debouncer.is_ready());
    assert!(debouncer.sleep_duration() > Duration::from_secs(60));
}

#[test]
fn test_debouncer_waits_for_quiet_period() {
    let mut debouncer = Debouncer::new(Duration::from_secs(60));
    debouncer.add_event(&make_event(vec!["/mdlive-none/a.ts"], modify_kind()), &source_target());

    assert!(!debouncer.is_ready());
    assert!(debouncer.take_if_ready().is_none());
    assert!(debouncer.sleep_duration() <= Duration::from_secs(60));
}

#[test]
fn test_debouncer_dedups_burst() {
    let mut debouncer = Debouncer::new(Duration::ZERO);
    for _ in 0..5 {
        debouncer.add_event(&make_event(vec!["/mdlive-none/a.ts"], modify_kind()), &source_target());
    }

    let changes = debouncer.take_if_ready().unwrap();
    assert_eq!(
        changes,
        vec![(PathBuf::from("/mdlive-none/a.ts"), ChangeKind::Modified)]
    );
    assert!(debouncer.take_if_ready().is_none());
}

#[test]
fn test_debouncer_filters_by_target() {
    let mut debouncer = Debouncer::new(Duration::ZERO);
    debouncer.add_event(
        &make_event(
            vec!["/mdlive-none/a.ts", "/mdlive-none/a.md", "/mdlive-none/.b.js"],
            create_kind(),
        ),
        &source_target(),
    );

    let changes = debouncer.take_if_ready().unwrap();
    assert_eq!(
        changes,
        vec![(PathBuf::from("/mdlive-none/a.ts"), ChangeKind::Created)]
    );
}

#[test]
fn test_debouncer_file_target() {
    let target = Target::File(PathBuf::from("/mdlive-none/notes.md"));
    let mut debouncer = Debouncer::new(Duration::ZERO);
    debouncer.add_event(
        &make_event(vec!["/mdlive-none/other.md", "/mdlive-none/notes.md"], modify_kind()),
        &target,
    );

    let changes = debouncer.take_if_ready().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].0, PathBuf::from("/mdlive-none/notes.md"));
}

#[test]
fn test_debouncer_ignores_metadata() {
    let mut debouncer = Debouncer::new(Duration::ZERO);
    debouncer.add_event(&make_event(vec!["/mdlive-none/a.ts"], metadata_kind()), &source_target());
    assert!(debouncer.changes.is_empty());
    assert!(debouncer.last_event.is_none());
}

#[test]
fn test_debouncer_state_transitions() {
    let target = source_target();
    let mut debouncer = Debouncer::new(Duration::ZERO);

    // restored after removal
    debouncer.add_event(&make_event(vec!["/mdlive-none/a.ts"], remove_kind()), &target);
    debouncer.add_event(&make_event(vec!["/mdlive-none/a.ts"], create_kind()), &target);
    // deleted after modification
    debouncer.add_event(&make_event(vec!["/mdlive-none/b.ts"], modify_kind()), &target);
    debouncer.add_event(&make_event(vec!["/mdlive-none/b.ts"], remove_kind()), &target);
    // first event wins
    debouncer.add_event(&make_event(vec!["/mdlive-none/c.ts"], create_kind()), &target);
    debouncer.add_event(&make_event(vec!["/mdlive-none/c.ts"], modify_kind()), &target);

    let changes = debouncer.take_if_ready().unwrap();
    assert_eq!(
        changes,
        vec![
            (PathBuf::from("/mdlive-none/a.ts"), ChangeKind::Created),
            (PathBuf::from("/mdlive-none/b.ts"), ChangeKind::Removed),
            (PathBuf::from("/mdlive-none/c.ts"), ChangeKind::Created),
        ]
    );
}

// ============================================================================
// ChangeWatcher
// ============================================================================

fn collector() -> (impl FnMut(&Path) + Send + 'static, Receiver<PathBuf>) {
    let (tx, rx) = channel::unbounded();
    (move |path: &Path| {
        let _ = tx.send(path.to_path_buf());
    }, rx)
}

fn drain(rx: &Receiver<PathBuf>, wait: Duration) -> Vec<PathBuf> {
    let mut seen = Vec::new();
    while let Ok(path) = rx.recv_timeout(wait) {
        seen.push(path);
    }
    seen
}

#[test]
fn test_content_watch_no_initial_event() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("notes.md");
    fs::write(&file, "# Hello").unwrap();

    let mut watcher = ChangeWatcher::new(DEBOUNCE);
    let (on_change, rx) = collector();
    watcher.watch_content(&file, on_change).unwrap();

    assert!(drain(&rx, QUIET_WAIT).is_empty());
    watcher.stop();
}

#[test]
fn test_content_watch_fires_once_per_write() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("notes.md");
    fs::write(&file, "# Hello").unwrap();

    let mut watcher = ChangeWatcher::new(DEBOUNCE);
    let (on_change, rx) = collector();
    watcher.watch_content(&file, on_change).unwrap();
    std::thread::sleep(Duration::from_millis(100));

    fs::write(&file, "# Goodbye").unwrap();
    let first = rx.recv_timeout(EVENT_WAIT).expect("change event");
    assert_eq!(first, normalize_path(&file));
    assert!(drain(&rx, QUIET_WAIT).is_empty());

    fs::write(&file, "# Again").unwrap();
    assert!(rx.recv_timeout(EVENT_WAIT).is_ok());
    assert!(drain(&rx, QUIET_WAIT).is_empty());

    watcher.stop();
}

#[cfg(unix)]
#[test]
fn test_content_watch_follows_symlink() {
    let dir = TempDir::new().unwrap();
    let real_dir = dir.path().join("drafts");
    fs::create_dir(&real_dir).unwrap();
    let real = real_dir.join("notes.md");
    fs::write(&real, "# Hello").unwrap();
    let link = dir.path().join("notes.md");
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let mut watcher = ChangeWatcher::new(DEBOUNCE);
    let (on_change, rx) = collector();
    watcher.watch_content(&link, on_change).unwrap();
    std::thread::sleep(Duration::from_millis(100));

    fs::write(&link, "# Through the link").unwrap();
    let changed = rx.recv_timeout(EVENT_WAIT).expect("change through symlink");
    assert_eq!(changed, normalize_path(&real));
    assert!(drain(&rx, QUIET_WAIT).is_empty());

    fs::write(&real, "# Direct").unwrap();
    assert!(rx.recv_timeout(EVENT_WAIT).is_ok());

    watcher.stop();
}

#[test]
fn test_content_watch_ignores_siblings() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("notes.md");
    fs::write(&file, "# Hello").unwrap();

    let mut watcher = ChangeWatcher::new(DEBOUNCE);
    let (on_change, rx) = collector();
    watcher.watch_content(&file, on_change).unwrap();
    std::thread::sleep(Duration::from_millis(100));

    fs::write(dir.path().join("other.md"), "# Other").unwrap();
    assert!(drain(&rx, QUIET_WAIT).is_empty());
}

#[test]
fn test_source_watch_filters_extensions() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();

    let mut watcher = ChangeWatcher::new(DEBOUNCE);
    let (on_change, rx) = collector();
    watcher
        .watch_source(&src, SourceFilter::default(), on_change)
        .unwrap();
    std::thread::sleep(Duration::from_millis(100));

    for name in ["a.ts", "a.js", "a.md", "a.json", ".a.ts"] {
        fs::write(src.join(name), "x").unwrap();
    }

    let names: BTreeSet<_> = drain(&rx, Duration::from_millis(800))
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    assert_eq!(names, BTreeSet::from(["a.js".to_string(), "a.ts".to_string()]));

    watcher.stop();
}

#[test]
fn test_watch_source_missing_dir_is_error() {
    let dir = TempDir::new().unwrap();
    let mut watcher = ChangeWatcher::new(DEBOUNCE);
    let (on_change, _rx) = collector();

    let err = watcher
        .watch_source(&dir.path().join("absent"), SourceFilter::default(), on_change)
        .unwrap_err();
    assert!(matches!(err, WatchError::Resolve(..)));
    assert!(watcher.subscriptions.is_empty());
}

#[test]
fn test_watch_source_on_file_is_error() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("a.ts");
    fs::write(&file, "x").unwrap();

    let mut watcher = ChangeWatcher::new(DEBOUNCE);
    let (on_change, _rx) = collector();
    let err = watcher
        .watch_source(&file, SourceFilter::default(), on_change)
        .unwrap_err();
    assert!(matches!(err, WatchError::NotADirectory(_)));
}

#[test]
fn test_failed_target_does_not_affect_other() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("notes.md");
    fs::write(&file, "# Hello").unwrap();

    let mut watcher = ChangeWatcher::new(DEBOUNCE);
    let (on_source, _source_rx) = collector();
    assert!(
        watcher
            .watch_source(&dir.path().join("absent"), SourceFilter::default(), on_source)
            .is_err()
    );

    let (on_content, rx) = collector();
    watcher.watch_content(&file, on_content).unwrap();
    assert_eq!(watcher.subscriptions.len(), 1);
    std::thread::sleep(Duration::from_millis(100));

    fs::write(&file, "# Goodbye").unwrap();
    assert!(rx.recv_timeout(EVENT_WAIT).is_ok());
}

#[test]
fn test_stop_is_idempotent() {
    let mut idle = ChangeWatcher::new(DEBOUNCE);
    idle.stop();
    idle.stop();

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("notes.md");
    fs::write(&file, "# Hello").unwrap();

    let mut watcher = ChangeWatcher::new(DEBOUNCE);
    let (on_change, rx) = collector();
    watcher.watch_content(&file, on_change).unwrap();
    watcher.stop();
    watcher.stop();
    assert!(watcher.subscriptions.is_empty());

    fs::write(&file, "# Goodbye").unwrap();
    assert!(drain(&rx, QUIET_WAIT).is_empty());
}

use std::path::PathBuf;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::types::{ChangeKind, Target};
use crate::utils::path::normalize_path;

/// Idle wait when nothing is pending.
const IDLE_WAIT: Duration = Duration::from_secs(86400);

/// Coalesces a burst of notify events into one change per path.
///
/// A batch is released only after `quiet` has passed without a new accepted
/// event, so an editor save (truncate + write, or write-temp + rename) shows
/// up as a single change of the content file or of each touched source file.
pub(super) struct Debouncer {
    quiet: Duration,
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Option<Instant>,
}

/// Kind recorded for a path that already has a pending change.
///
/// Deletion wins over edits, an edit after a deletion means the file is back,
/// and repeated kinds keep the earlier one.
fn merge(pending: ChangeKind, incoming: ChangeKind) -> ChangeKind {
    match (pending, incoming) {
        (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified) => incoming,
        (_, ChangeKind::Removed) => ChangeKind::Removed,
        _ => pending,
    }
}

/// Kind of an event, or `None` for events that never count as a change.
fn classify(kind: &notify::EventKind) -> Option<ChangeKind> {
    use notify::EventKind;
    use notify::event::ModifyKind;

    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        // Touching mtime or permissions leaves the rendered page unchanged.
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        _ => None,
    }
}

impl Debouncer {
    pub(super) fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            changes: FxHashMap::default(),
            last_event: None,
        }
    }

    /// Record the paths of `event` that `target` accepts.
    ///
    /// Only accepted paths restart the quiet period; siblings of the content
    /// file and non-source files under the source tree are dropped here.
    pub(super) fn add_event(&mut self, event: &notify::Event, target: &Target) {
        let Some(kind) = classify(&event.kind) else {
            return;
        };

        for path in &event.paths {
            let path = normalize_path(path);
            if !target.accepts(&path) {
                continue;
            }

            let recorded = match self.changes.get(&path) {
                Some(&pending) => merge(pending, kind),
                None => kind,
            };
            crate::debug!("watch"; "{} {}: {}", target.label(), recorded.label(), path.display());

            self.changes.insert(path, recorded);
            self.last_event = Some(Instant::now());
        }
    }

    /// Drain the batch once it has been quiet long enough, ordered by path.
    pub(super) fn take_if_ready(&mut self) -> Option<Vec<(PathBuf, ChangeKind)>> {
        if !self.is_ready() {
            return None;
        }

        self.last_event = None;
        let mut batch: Vec<_> = self.changes.drain().collect();
        batch.sort_by(|a, b| a.0.cmp(&b.0));
        Some(batch)
    }

    pub(super) fn is_ready(&self) -> bool {
        self.last_event
            .is_some_and(|at| at.elapsed() >= self.quiet && !self.changes.is_empty())
    }

    /// How long the worker may block before the batch could be ready.
    pub(super) fn sleep_duration(&self) -> Duration {
        match self.last_event {
            Some(at) => self
                .quiet
                .saturating_sub(at.elapsed())
                .max(Duration::from_millis(1)),
            None => IDLE_WAIT,
        }
    }
}

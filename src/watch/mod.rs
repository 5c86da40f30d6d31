//! Change Watcher
//!
//! Observes the content file and, in development mode, the source tree.
//! Each subscription owns a notify watcher and a worker thread:
//!
//! ```text
//! notify --> Debouncer (quiet period) --> Target filter --> on_change(path)
//! ```
//!
//! Subscribing never emits an event by itself; only filesystem activity
//! after the subscription does. [`ChangeWatcher::stop`] returns only after
//! every worker has exited, so no callback runs after it.

use std::path::Path;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};

mod debouncer;
mod error;
mod filter;
mod types;

#[cfg(test)]
mod tests;

use debouncer::Debouncer;
use types::Target;

use crate::utils::path::normalize_path;

pub use error::WatchError;
pub use filter::SourceFilter;

/// One live subscription.
struct Subscription {
    label: &'static str,
    /// Dropping the watcher closes the event channel.
    watcher: Option<RecommendedWatcher>,
    shutdown_tx: Sender<()>,
    worker: Option<JoinHandle<()>>,
}

impl Subscription {
    fn stop(&mut self) {
        drop(self.watcher.take());
        let _ = self.shutdown_tx.send(());
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            crate::log!("watch"; "{} watcher thread panicked", self.label);
        }
    }
}

/// Watches the content file and the source tree.
pub struct ChangeWatcher {
    debounce: Duration,
    subscriptions: Vec<Subscription>,
}

impl ChangeWatcher {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            subscriptions: Vec::new(),
        }
    }

    /// Subscribe to changes of exactly one file.
    ///
    /// The parent directory is watched so editors that save by renaming a
    /// temp file over the original are still seen. A file that does not
    /// exist yet is not an error; it simply produces no events until it does.
    ///
    /// A symlinked file is followed when subscribing: the link's target and
    /// its directory are watched, so edits made through the link are seen.
    /// Re-pointing the link afterwards is not.
    pub fn watch_content<F>(&mut self, path: &Path, on_change: F) -> Result<(), WatchError>
    where
        F: FnMut(&Path) + Send + 'static,
    {
        let Some(name) = path.file_name() else {
            return Err(WatchError::NoFileName(path.to_path_buf()));
        };
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let parent = parent
            .canonicalize()
            .map_err(|e| WatchError::Resolve(parent.to_path_buf(), e))?;

        // Event paths are canonical, so the target must be too.
        let file = normalize_path(&parent.join(name));
        let root = match file.parent() {
            Some(dir) => dir.to_path_buf(),
            None => parent,
        };

        crate::debug!("watch"; "content: {}", file.display());
        self.subscribe(&root, RecursiveMode::NonRecursive, Target::File(file), on_change)
    }

    /// Subscribe to source files anywhere under `dir`.
    pub fn watch_source<F>(
        &mut self,
        dir: &Path,
        filter: SourceFilter,
        on_change: F,
    ) -> Result<(), WatchError>
    where
        F: FnMut(&Path) + Send + 'static,
    {
        let dir = dir
            .canonicalize()
            .map_err(|e| WatchError::Resolve(dir.to_path_buf(), e))?;
        if !dir.is_dir() {
            return Err(WatchError::NotADirectory(dir));
        }

        crate::debug!("watch"; "source: {}", dir.display());
        self.subscribe(&dir, RecursiveMode::Recursive, Target::Source(filter), on_change)
    }

    /// Release every subscription and wait for the workers to exit.
    ///
    /// Safe to call repeatedly and when nothing was ever watched.
    pub fn stop(&mut self) {
        for mut subscription in self.subscriptions.drain(..) {
            subscription.stop();
            crate::debug!("watch"; "{} watcher stopped", subscription.label);
        }
    }

    fn subscribe<F>(
        &mut self,
        root: &Path,
        mode: RecursiveMode,
        target: Target,
        mut on_change: F,
    ) -> Result<(), WatchError>
    where
        F: FnMut(&Path) + Send + 'static,
    {
        let (event_tx, event_rx) = channel::unbounded();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = event_tx.send(res);
        })
        .map_err(|e| WatchError::Notify(root.to_path_buf(), e))?;
        watcher
            .watch(root, mode)
            .map_err(|e| WatchError::Notify(root.to_path_buf(), e))?;

        let (shutdown_tx, shutdown_rx) = channel::bounded(1);
        let label = target.label();
        let debouncer = Debouncer::new(self.debounce);

        let worker = std::thread::Builder::new()
            .name(format!("watch-{label}"))
            .spawn(move || {
                run_worker(event_rx, shutdown_rx, debouncer, &target, &mut on_change);
            })
            .map_err(WatchError::Spawn)?;

        self.subscriptions.push(Subscription {
            label,
            watcher: Some(watcher),
            shutdown_tx,
            worker: Some(worker),
        });
        Ok(())
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Worker loop: collect events, emit each changed path once the quiet
/// period has passed.
fn run_worker(
    event_rx: Receiver<notify::Result<notify::Event>>,
    shutdown_rx: Receiver<()>,
    mut debouncer: Debouncer,
    target: &Target,
    on_change: &mut dyn FnMut(&Path),
) {
    loop {
        channel::select! {
            recv(event_rx) -> msg => match msg {
                Ok(Ok(event)) => debouncer.add_event(&event, target),
                Ok(Err(e)) => crate::log!("watch"; "notify error: {}", e),
                Err(_) => break,
            },
            recv(shutdown_rx) -> _ => break,
            default(debouncer.sleep_duration()) => {}
        }

        if let Some(changes) = debouncer.take_if_ready() {
            for (path, kind) in changes {
                crate::debug!("watch"; "{} {}: {}", target.label(), kind.label(), path.display());
                on_change(&path);
            }
        }
    }
}

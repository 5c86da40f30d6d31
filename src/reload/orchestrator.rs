//! Reload Orchestrator - wires watcher events to reloads and rebuilds
//!
//! ```text
//! ChangeWatcher --ReloadMsg--> loop (current-thread runtime)
//!                                |-- ContentChanged   -> AppContext::apply_content_change
//!                                +-- SourceChanged(p) -> RebuildCoordinator::rebuild
//!                                                          +-- on success: notify_reload
//! ```
//!
//! Watcher callbacks run on watcher threads and only forward messages; all
//! reload decisions happen on the orchestrator's own runtime thread.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use super::context::AppContext;
use super::rebuild::{CommandRebuild, Rebuild, RebuildCoordinator};
use crate::config::{PreviewConfig, WatchConfig};
use crate::watch::{ChangeWatcher, SourceFilter};
use crate::{debug, log};

/// Bounded wait for in-flight rebuild tasks at shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Messages from the watcher to the orchestrator loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadMsg {
    ContentChanged,
    SourceChanged(PathBuf),
}

/// Running orchestrator. Dropping it (or calling [`stop`](Self::stop))
/// shuts everything down in order.
pub struct ReloadOrchestrator {
    watcher: ChangeWatcher,
    tx: Option<mpsc::UnboundedSender<ReloadMsg>>,
    worker: Option<JoinHandle<()>>,
}

impl ReloadOrchestrator {
    /// Start watching with the command-backed rebuild from `config`.
    pub fn start(ctx: Arc<AppContext>, config: &PreviewConfig) -> Result<Self> {
        let rebuild = config
            .watch
            .dev
            .then(|| CommandRebuild::new(config.rebuild.command.clone(), config.root.clone()));
        Self::start_with(ctx, &config.watch, rebuild)
    }

    /// Start watching. The source tree is watched only when `rebuild` is given.
    ///
    /// A target that cannot be watched is reported and skipped; only failing
    /// to start the orchestrator thread itself is an error.
    pub fn start_with<R: Rebuild>(
        ctx: Arc<AppContext>,
        watch: &WatchConfig,
        rebuild: Option<R>,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = ChangeWatcher::new(watch.debounce());

        let content_tx = tx.clone();
        if let Err(e) = watcher.watch_content(ctx.content_path(), move |_| {
            let _ = content_tx.send(ReloadMsg::ContentChanged);
        }) {
            log!("error"; "{:#}", anyhow::Error::from(e));
        }

        let coordinator = rebuild.map(RebuildCoordinator::new);
        if coordinator.is_some() {
            let source_tx = tx.clone();
            let filter = SourceFilter::new(watch.extensions.iter().cloned());
            match watcher.watch_source(&watch.source_dir, filter, move |path| {
                let _ = source_tx.send(ReloadMsg::SourceChanged(path.to_path_buf()));
            }) {
                Ok(()) => log!("watch"; "dev mode: watching {}", watch.source_dir.display()),
                Err(e) => log!("error"; "{:#}", anyhow::Error::from(e)),
            }
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to build reload runtime")?;

        let worker = std::thread::Builder::new()
            .name("reload".into())
            .spawn(move || {
                runtime.block_on(run_loop(ctx, rx, coordinator));
                runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
            })
            .context("Failed to start reload thread")?;

        Ok(Self {
            watcher,
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Stop watching, then drain and join the orchestrator loop.
    ///
    /// An in-flight rebuild is given a bounded wait and is not killed.
    pub fn stop(&mut self) {
        self.watcher.stop();
        drop(self.tx.take());
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            log!("reload"; "orchestrator thread panicked");
        }
    }

    /// Queue a message as if the watcher had sent it.
    #[cfg(test)]
    pub fn send(&self, msg: ReloadMsg) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(msg);
        }
    }
}

impl Drop for ReloadOrchestrator {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_loop<R: Rebuild>(
    ctx: Arc<AppContext>,
    mut rx: mpsc::UnboundedReceiver<ReloadMsg>,
    coordinator: Option<RebuildCoordinator<R>>,
) {
    debug!("reload"; "start");
    while let Some(msg) = rx.recv().await {
        match msg {
            ReloadMsg::ContentChanged => {
                ctx.apply_content_change();
            }
            ReloadMsg::SourceChanged(path) => {
                let Some(coordinator) = &coordinator else {
                    continue;
                };
                debug!("rebuild"; "source changed: {}", path.display());
                let ctx = Arc::clone(&ctx);
                let _ = coordinator.rebuild(move || {
                    ctx.notify_reload();
                });
            }
        }
    }
    debug!("reload"; "stopped");
}

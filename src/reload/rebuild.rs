//! Rebuild coordination for development mode.
//!
//! A source change asks the [`RebuildCoordinator`] to run the external
//! rebuild step. At most one rebuild is in flight; a request that arrives
//! while one is running is dropped, and the next save re-triggers.
//!
//! ```text
//!            rebuild()                 outcome (any)
//!   Idle ------------------> Running ---------------> Idle
//!    ^  rebuild() ignored       |                       |
//!    +--------------------------+       on_success() if Success
//! ```

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;

use crate::logger::{status_error, status_success};
use crate::utils::exec::{Cmd, failure_tail};
use crate::{debug, log};

/// Lines of rebuild output shown when the command fails.
const FAILURE_TAIL_LINES: usize = 20;

/// Result of one rebuild run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildOutcome {
    Success,
    /// Non-zero exit or the command could not be run.
    Failed { reason: String },
}

/// The expensive operation serialized by [`RebuildCoordinator`].
pub trait Rebuild: Send + Sync + 'static {
    fn run(&self) -> impl Future<Output = RebuildOutcome> + Send;
}

/// Runs an external command; exit status 0 is success.
#[derive(Debug, Clone)]
pub struct CommandRebuild {
    command: Vec<String>,
    cwd: PathBuf,
}

impl CommandRebuild {
    pub fn new(command: Vec<String>, cwd: PathBuf) -> Self {
        Self { command, cwd }
    }
}

impl Rebuild for CommandRebuild {
    fn run(&self) -> impl Future<Output = RebuildOutcome> + Send {
        let command = self.command.clone();
        let cwd = self.cwd.clone();

        async move {
            log!("rebuild"; "running `{}`", command.join(" "));

            let result =
                tokio::task::spawn_blocking(move || Cmd::from_slice(&command).cwd(&cwd).run())
                    .await;

            match result {
                Ok(Ok(output)) if output.status.success() => RebuildOutcome::Success,
                Ok(Ok(output)) => RebuildOutcome::Failed {
                    reason: format!(
                        "{}\n{}",
                        output.status,
                        failure_tail(&output, FAILURE_TAIL_LINES)
                    )
                    .trim_end()
                    .to_string(),
                },
                Ok(Err(e)) => RebuildOutcome::Failed {
                    reason: format!("{e:#}"),
                },
                Err(e) => RebuildOutcome::Failed {
                    reason: format!("rebuild task failed: {e}"),
                },
            }
        }
    }
}

struct Inner<R> {
    rebuild: R,
    running: AtomicBool,
}

/// Serializes rebuilds: at most one runs at any instant.
pub struct RebuildCoordinator<R> {
    inner: Arc<Inner<R>>,
}

/// Returns the coordinator to idle when dropped, including on panic.
struct RunningGuard<R>(Arc<Inner<R>>);

impl<R> Drop for RunningGuard<R> {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::Release);
    }
}

impl<R: Rebuild> RebuildCoordinator<R> {
    pub fn new(rebuild: R) -> Self {
        Self {
            inner: Arc::new(Inner {
                rebuild,
                running: AtomicBool::new(false),
            }),
        }
    }

    /// Start a rebuild unless one is already running.
    ///
    /// Returns `None` when the request was dropped. Otherwise the rebuild
    /// runs as a task on the current tokio runtime; `on_success` is called
    /// after the coordinator is idle again, and only for a successful run.
    /// Failures are logged and never propagated.
    pub fn rebuild<F>(&self, on_success: F) -> Option<JoinHandle<RebuildOutcome>>
    where
        F: FnOnce() + Send + 'static,
    {
        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("rebuild"; "already running, change ignored");
            return None;
        }

        let inner = Arc::clone(&self.inner);
        Some(tokio::spawn(async move {
            let guard = RunningGuard(Arc::clone(&inner));
            let outcome = inner.rebuild.run().await;
            drop(guard);

            match &outcome {
                RebuildOutcome::Success => {
                    status_success("rebuild succeeded");
                    on_success();
                }
                RebuildOutcome::Failed { reason } => status_error("rebuild failed", reason),
            }
            outcome
        }))
    }
}

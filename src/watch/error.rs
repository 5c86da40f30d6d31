//! Watcher error types.

use std::path::PathBuf;
use thiserror::Error;

/// A watch target could not be subscribed.
///
/// Only the failing target is affected; other subscriptions keep running.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("cannot watch `{0}`")]
    Notify(PathBuf, #[source] notify::Error),

    #[error("cannot resolve watch path `{0}`")]
    Resolve(PathBuf, #[source] std::io::Error),

    #[error("`{0}` does not name a file")]
    NoFileName(PathBuf),

    #[error("`{0}` is not a directory")]
    NotADirectory(PathBuf),

    #[error("failed to start watch thread")]
    Spawn(#[source] std::io::Error),
}

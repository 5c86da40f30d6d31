use std::path::{Path, PathBuf};

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub(super) fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// Which event paths a subscription cares about.
#[derive(Debug, Clone)]
pub(super) enum Target {
    /// Exactly one file, symlinks resolved.
    File(PathBuf),
    /// Anything under a directory that passes the source filter.
    Source(super::SourceFilter),
}

impl Target {
    pub(super) fn label(&self) -> &'static str {
        match self {
            Self::File(_) => "content",
            Self::Source(_) => "source",
        }
    }

    pub(super) fn accepts(&self, path: &Path) -> bool {
        match self {
            Self::File(file) => path == file,
            Self::Source(filter) => filter.accepts(path),
        }
    }
}

//! Path normalization.

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
///
/// Watch events carry canonical paths on every platform (`/private/var` on
/// macOS), so anything compared against them goes through here first.
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_existing_is_canonical() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("notes.md");
        std::fs::write(&file, "# x").unwrap();

        let dotted = dir.path().join(".").join("notes.md");
        assert_eq!(normalize_path(&dotted), file.canonicalize().unwrap());
    }

    #[test]
    fn test_normalize_missing_absolute_kept() {
        let path = Path::new("/definitely/not/here.md");
        assert_eq!(normalize_path(path), path);
    }
}

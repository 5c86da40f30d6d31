//! Source tree filtering.

use std::path::Path;

/// Decides which files under the source tree count as source.
///
/// A file qualifies when its name does not start with `.` and its
/// extension is on the allow-list. Extensions are compared without the
/// leading dot and case-sensitively.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    extensions: Vec<String>,
}

impl SourceFilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(Into::into)
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect(),
        }
    }

    pub fn accepts(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if name.starts_with('.') {
            return false;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed == ext))
    }
}

impl Default for SourceFilter {
    fn default() -> Self {
        Self::new(["ts", "js"])
    }
}

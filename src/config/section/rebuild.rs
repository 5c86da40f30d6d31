//! `[rebuild]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [rebuild]
//! command = ["npm", "run", "build"]
//! ```

use serde::Deserialize;

/// External rebuild step run when the source tree changes in development mode.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RebuildConfig {
    /// Program followed by its arguments.
    pub command: Vec<String>,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            command: vec!["npm".into(), "run".into(), "build".into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::PreviewConfig;

    #[test]
    fn test_rebuild_command() {
        let config =
            PreviewConfig::from_str("[rebuild]\ncommand = [\"make\", \"assets\"]").unwrap();
        assert_eq!(config.rebuild.command, vec!["make", "assets"]);
    }
}

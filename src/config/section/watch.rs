//! `[watch]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [watch]
//! debounce_ms = 150
//! dev = false                 # MDLIVE_DEV=true also turns this on
//! source_dir = "src"
//! extensions = ["ts", "js"]
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// File watching settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Quiet period after the last filesystem event before a change is emitted.
    pub debounce_ms: u64,

    /// Development mode: also watch the source tree and rebuild on change.
    pub dev: bool,

    /// Source tree watched in development mode.
    pub source_dir: PathBuf,

    /// Extensions (without the dot) that count as source files.
    pub extensions: Vec<String>,
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 150,
            dev: false,
            source_dir: PathBuf::from("src"),
            extensions: vec!["ts".into(), "js".into()],
        }
    }
}

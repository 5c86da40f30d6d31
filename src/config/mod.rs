//! Preview configuration.
//!
//! Resolved in layers, later layers win:
//!
//! 1. built-in defaults
//! 2. optional `mdlive.toml` (see [`section`] for the keys)
//! 3. command-line flags
//! 4. `MDLIVE_DEV=true` in the environment

mod error;
pub mod section;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::Cli;
use crate::log;

pub use error::ConfigError;
pub use section::{RebuildConfig, ServeConfig, WatchConfig};

/// Environment variable selecting development mode.
pub const DEV_ENV_VAR: &str = "MDLIVE_DEV";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Directory the tool was started in; the rebuild command runs here.
    #[serde(skip)]
    pub root: PathBuf,

    /// Absolute path of the markdown file being previewed (from the CLI).
    #[serde(skip)]
    pub content_path: PathBuf,

    /// Development server settings
    pub serve: ServeConfig,

    /// File watching settings
    pub watch: WatchConfig,

    /// External rebuild step for development mode
    pub rebuild: RebuildConfig,
}

impl PreviewConfig {
    /// Load configuration from CLI arguments and the environment.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let config_path = cwd.join(&cli.config);
        let mut config = if config_path.is_file() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };

        config.content_path = cwd.join(&cli.file);
        config.root = cwd.clone();
        config.apply_cli(cli);
        config.apply_dev_env(std::env::var(DEV_ENV_VAR).ok().as_deref());
        config.normalize_paths(&cwd);
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML string
    #[cfg(test)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            log!("warning"; "unknown fields in {} ignored: {}", path.display(), ignored.join(", "));
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::from)?;
        Ok((config, ignored))
    }

    /// Apply command-line overrides.
    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(interface) = cli.interface {
            self.serve.interface = interface;
        }
        if let Some(port) = cli.port {
            self.serve.port = port;
        }
        if let Some(dir) = &cli.vendor_dir {
            self.serve.vendor_dir = dir.clone();
        }
        if let Some(dir) = &cli.source_dir {
            self.watch.source_dir = dir.clone();
        }
        if let Some(exts) = &cli.extensions {
            self.watch.extensions = exts.clone();
        }
    }

    /// Only the literal `"true"` turns development mode on.
    fn apply_dev_env(&mut self, value: Option<&str>) {
        if value == Some("true") {
            self.watch.dev = true;
        }
    }

    /// Make relative paths absolute and strip leading dots from extensions.
    fn normalize_paths(&mut self, cwd: &Path) {
        for path in [&mut self.serve.vendor_dir, &mut self.watch.source_dir] {
            if path.is_relative() {
                *path = cwd.join(&*path);
            }
        }

        self.watch.extensions = self
            .watch
            .extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.watch.dev && self.rebuild.command.is_empty() {
            return Err(ConfigError::Validation(
                "`rebuild.command` must not be empty in development mode".into(),
            ));
        }
        if self.watch.dev && self.watch.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "`watch.extensions` must list at least one extension in development mode".into(),
            ));
        }
        Ok(())
    }
}

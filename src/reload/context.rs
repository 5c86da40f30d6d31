//! Application context shared by the HTTP handlers and the orchestrator.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arc_swap::ArcSwap;

use super::message::RELOAD_EVENT;
use super::registry::ConnectionRegistry;
use crate::logger::{status_error, status_success};
use crate::render::{MarkdownOptions, render_markdown, render_page};

/// Everything one preview instance owns: the content file, the current
/// rendered page and the open event-stream clients.
pub struct AppContext {
    content_path: PathBuf,
    options: MarkdownOptions,
    /// Full HTML document for the current content. Replaced wholesale.
    rendered: ArcSwap<String>,
    registry: ConnectionRegistry,
}

impl AppContext {
    /// Read and render the content file. Failure here is startup-fatal.
    pub fn load(content_path: PathBuf) -> Result<Self> {
        let options = MarkdownOptions::all();
        let page = render_file(&content_path, &options)?;

        Ok(Self {
            content_path,
            options,
            rendered: ArcSwap::from_pointee(page),
            registry: ConnectionRegistry::new(),
        })
    }

    pub fn content_path(&self) -> &Path {
        &self.content_path
    }

    /// Latest fully rendered page.
    pub fn rendered(&self) -> Arc<String> {
        self.rendered.load_full()
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Re-render the content file and swap it in.
    ///
    /// On error the previous page stays in place.
    pub fn reload_content(&self) -> Result<()> {
        let page = render_file(&self.content_path, &self.options)?;
        self.rendered.store(Arc::new(page));
        Ok(())
    }

    /// Tell every open page to reload. Returns the number of clients reached.
    pub fn notify_reload(&self) -> usize {
        self.registry.broadcast(RELOAD_EVENT)
    }

    /// React to a content file change: reload, then broadcast on success.
    ///
    /// A failed reload is reported and nothing is broadcast.
    pub fn apply_content_change(&self) -> bool {
        let name = self.display_name();
        match self.reload_content() {
            Ok(()) => {
                let clients = self.notify_reload();
                status_success(&format!("reloaded: {name} ({clients} clients)"));
                true
            }
            Err(e) => {
                status_error(&format!("reload failed: {name}"), &format!("{e:#}"));
                false
            }
        }
    }

    fn display_name(&self) -> String {
        self.content_path
            .file_name()
            .unwrap_or(self.content_path.as_os_str())
            .to_string_lossy()
            .into_owned()
    }
}

fn render_file(path: &Path, options: &MarkdownOptions) -> Result<String> {
    let source =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let fragment = render_markdown(&source, options);
    Ok(render_page(path, &fragment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::registry::NotificationChannel;
    use parking_lot::Mutex;
    use std::io;
    use tempfile::TempDir;

    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl NotificationChannel for Recorder {
        fn write(&mut self, message: &str) -> io::Result<()> {
            self.0.lock().push(message.to_string());
            Ok(())
        }
    }

    fn setup(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.md");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_renders_page() {
        let (_dir, path) = setup("# Hello");
        let ctx = AppContext::load(path).unwrap();

        let page = ctx.rendered();
        assert!(page.contains("<h1>Hello</h1>"));
        assert!(page.contains("<title>notes.md</title>"));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(AppContext::load(dir.path().join("absent.md")).is_err());
    }

    #[test]
    fn test_content_change_swaps_and_broadcasts() {
        let (_dir, path) = setup("# Hello");
        let ctx = AppContext::load(path.clone()).unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));
        ctx.registry().register(Box::new(Recorder(Arc::clone(&received))));

        fs::write(&path, "# Goodbye").unwrap();
        assert!(ctx.apply_content_change());

        assert!(ctx.rendered().contains("<h1>Goodbye</h1>"));
        assert_eq!(*received.lock(), vec![RELOAD_EVENT]);
    }

    #[test]
    fn test_deleted_content_keeps_previous_page() {
        let (_dir, path) = setup("# Hello");
        let ctx = AppContext::load(path.clone()).unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));
        ctx.registry().register(Box::new(Recorder(Arc::clone(&received))));

        fs::remove_file(&path).unwrap();
        assert!(!ctx.apply_content_change());

        assert!(ctx.rendered().contains("<h1>Hello</h1>"));
        assert!(received.lock().is_empty());
    }

    #[test]
    fn test_readers_keep_old_snapshot() {
        let (_dir, path) = setup("# One");
        let ctx = AppContext::load(path.clone()).unwrap();
        let before = ctx.rendered();

        fs::write(&path, "# Two").unwrap();
        ctx.reload_content().unwrap();

        assert!(before.contains("<h1>One</h1>"));
        assert!(ctx.rendered().contains("<h1>Two</h1>"));
    }
}

//! Content rendering: markdown fragment and the full preview page.

mod markdown;

pub use markdown::{MarkdownOptions, is_diagram, render_markdown};

use std::path::Path;

use crate::embed::serve::{PAGE_HTML, PageVars};
use crate::utils::html::escape;

/// Wrap a rendered fragment in the full preview document.
pub fn render_page(content_path: &Path, fragment: &str) -> String {
    let title = content_path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_else(|| content_path.to_string_lossy());

    PAGE_HTML.render(&PageVars {
        title: &escape(&title),
        content: fragment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_title_from_file_name() {
        let html = render_page(Path::new("/docs/a<b>.md"), "<p>x</p>");
        assert!(html.contains("<title>a&lt;b&gt;.md</title>"));
        assert!(html.contains("<p>x</p>"));
    }
}

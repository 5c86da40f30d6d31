//! Markdown to HTML conversion using pulldown-cmark.
//!
//! Fenced blocks tagged `mermaid` become `<pre class="mermaid">` diagram
//! containers; every other fenced block keeps pulldown-cmark's
//! `<pre><code class="language-X">` output for client-side highlighting.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};

use crate::utils::html::escape;

/// Info-string languages rendered as diagrams.
const DIAGRAM_LANGS: &[&str] = &["mermaid"];

/// Options for markdown conversion
#[derive(Debug, Clone, Default)]
pub struct MarkdownOptions {
    /// Enable tables extension
    pub tables: bool,
    /// Enable footnotes extension
    pub footnotes: bool,
    /// Enable strikethrough extension
    pub strikethrough: bool,
    /// Enable task lists extension
    pub task_lists: bool,
    /// Enable heading attributes extension (e.g., `# Heading {#custom-id}`)
    pub heading_attributes: bool,
}

impl MarkdownOptions {
    /// Create options with all extensions enabled
    pub fn all() -> Self {
        Self {
            tables: true,
            footnotes: true,
            strikethrough: true,
            task_lists: true,
            heading_attributes: true,
        }
    }

    /// Convert to pulldown-cmark Options
    fn to_pulldown_options(&self) -> Options {
        let mut opts = Options::empty();
        if self.tables {
            opts.insert(Options::ENABLE_TABLES);
        }
        if self.footnotes {
            opts.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.strikethrough {
            opts.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.task_lists {
            opts.insert(Options::ENABLE_TASKLISTS);
        }
        if self.heading_attributes {
            opts.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        }
        opts
    }
}

/// Whether a fenced block's info string marks it as a diagram.
///
/// Only the first word counts, so `mermaid title="flow"` is still a diagram.
pub fn is_diagram(info: &str) -> bool {
    info.split_whitespace()
        .next()
        .is_some_and(|lang| DIAGRAM_LANGS.iter().any(|d| lang.eq_ignore_ascii_case(d)))
}

/// Render a markdown document to an HTML fragment.
pub fn render_markdown(source: &str, options: &MarkdownOptions) -> String {
    let parser = Parser::new_ext(source, options.to_pulldown_options());
    let events = rewrite_diagrams(parser);

    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

/// Replace diagram code blocks with a single raw HTML event each.
fn rewrite_diagrams<'a>(events: impl Iterator<Item = Event<'a>>) -> Vec<Event<'a>> {
    let mut out = Vec::new();
    let mut diagram: Option<String> = None;

    for event in events {
        if let Some(body) = diagram.as_mut() {
            match event {
                Event::Text(text) => body.push_str(&text),
                Event::End(TagEnd::CodeBlock) => {
                    let html = format!("<pre class=\"mermaid\">{}</pre>\n", escape(body));
                    out.push(Event::Html(CowStr::from(html)));
                    diagram = None;
                }
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(ref info))) if is_diagram(info) => {
                diagram = Some(String::new());
            }
            event => out.push(event),
        }
    }

    out
}

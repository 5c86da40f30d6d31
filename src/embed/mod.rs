//! Embedded static resources.
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - preview page shell, live client script, stylesheet
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{PAGE_HTML, PageVars};
//!
//! let html = PAGE_HTML.render(&PageVars { title: "notes.md", content: &fragment });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// URL of the embedded live client script.
    pub const LIVE_JS_URL: &str = "/__mdlive/live.js";

    /// URL of the embedded stylesheet.
    pub const STYLE_CSS_URL: &str = "/__mdlive/style.css";

    /// Variables for page.html.
    pub struct PageVars<'a> {
        /// Already escaped document title.
        pub title: &'a str,
        /// Rendered markdown fragment.
        pub content: &'a str,
    }

    impl TemplateVars for PageVars<'_> {
        fn apply(&self, content: &str) -> String {
            // Content goes in last so placeholders inside the document are left alone.
            content
                .replace("__MDLIVE_TITLE__", self.title)
                .replace("__MDLIVE_CONTENT__", self.content)
        }
    }

    /// Preview page shell.
    pub const PAGE_HTML: Template<PageVars<'static>> =
        Template::new(include_str!("serve/page.html"));

    /// Live reload + diagram initialisation script.
    pub const LIVE_JS: &str = include_str!("serve/live.js");

    /// Preview stylesheet.
    pub const STYLE_CSS: &str = include_str!("serve/style.css");
}

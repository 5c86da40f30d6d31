//! Event stream wire format.
//!
//! The push protocol has exactly one event: a `data: reload` line followed
//! by a blank line. Everything else written to the stream is an SSE comment
//! (a line starting with `:`) that browsers ignore.

/// Tells every open page to reload.
pub const RELOAD_EVENT: &str = "data: reload\n\n";

/// Written once right after the response headers.
pub const CONNECTED_COMMENT: &str = ": connected\n\n";

/// Written to idle streams so dead peers are noticed.
pub const KEEP_ALIVE_COMMENT: &str = ": keep-alive\n\n";

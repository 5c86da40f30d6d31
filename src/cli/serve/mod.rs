//! Preview server with live reload support.
//!
//! Routes:
//!
//! | path                  | response                                |
//! |-----------------------|-----------------------------------------|
//! | `/`                   | rendered preview page                   |
//! | `/events`             | event stream (see [`sse`])              |
//! | `/__mdlive/live.js`   | live client script (embedded)           |
//! | `/__mdlive/style.css` | stylesheet (embedded)                   |
//! | `/vendor/<lib>/...`   | vendored front-end libraries (from disk)|
//!
//! Everything else is 404; methods other than GET/HEAD get 405.

mod lifecycle;
mod path;
mod response;
mod sse;


use crate::{
    config::ServeConfig,
    core::register_server,
    embed::serve::{LIVE_JS, LIVE_JS_URL, STYLE_CSS, STYLE_CSS_URL},
    log,
    reload::AppContext,
    utils::mime::types::{CSS, EVENT_STREAM, JAVASCRIPT},
};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tiny_http::{Method, Request, Server};

/// Worker threads for ordinary (short) requests.
const REQUEST_THREADS: usize = 4;

/// Shared state of the request handlers.
pub struct ServeState {
    ctx: Arc<AppContext>,
    vendor_dir: PathBuf,
}

impl ServeState {
    pub fn new(ctx: Arc<AppContext>, vendor_dir: PathBuf) -> Self {
        Self { ctx, vendor_dir }
    }
}

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
}

/// Bind the HTTP server without starting the request loop
///
/// The server is registered for Ctrl+C so the request loop can be unblocked.
pub fn bind_server(config: &ServeConfig) -> Result<BoundServer> {
    let (server, addr) = lifecycle::bind_with_retry(config.interface, config.port)?;
    let server = Arc::new(server);
    register_server(Arc::clone(&server));

    log!("serve"; "http://{}", addr);

    Ok(BoundServer { server })
}

impl BoundServer {
    /// Run the request loop until the server is unblocked.
    pub fn run(self, state: Arc<ServeState>) -> Result<()> {
        run_request_loop(&self.server, state)
    }
}

fn run_request_loop(server: &Server, state: Arc<ServeState>) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(REQUEST_THREADS)
        .thread_name(|i| format!("http-{i}"))
        .build()
        .context("Failed to create request thread pool")?;

    for request in server.incoming_requests() {
        let state = Arc::clone(&state);

        // Event streams live as long as the tab; keep them off the pool.
        if is_event_stream(&request) {
            let spawned = std::thread::Builder::new()
                .name("sse".into())
                .spawn(move || sse::serve_events(request, &state.ctx));
            if let Err(e) = spawned {
                log!("serve"; "failed to start event stream: {e}");
            }
            continue;
        }

        pool.spawn(move || {
            if let Err(e) = handle_request(request, &state) {
                log!("serve"; "request error: {e}");
            }
        });
    }

    Ok(())
}

fn is_event_stream(request: &Request) -> bool {
    request.method() == &Method::Get && route_path(request.url()) == sse::EVENTS_URL
}

/// URL without query string or fragment.
fn route_path(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// Handle a single HTTP request
fn handle_request(request: Request, state: &ServeState) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    if !matches!(request.method(), Method::Get | Method::Head) {
        return response::respond_method_not_allowed(request);
    }

    let url = route_path(request.url()).to_owned();
    match url.as_str() {
        "/" => response::respond_page(request, &state.ctx.rendered()),
        LIVE_JS_URL => response::respond_static(request, JAVASCRIPT, LIVE_JS),
        STYLE_CSS_URL => response::respond_static(request, CSS, STYLE_CSS),
        // HEAD on the stream: headers without holding the connection open.
        sse::EVENTS_URL => response::respond_static(request, EVENT_STREAM, ""),
        _ if url.starts_with(path::VENDOR_PREFIX) => {
            match path::resolve_vendor(&url, &state.vendor_dir) {
                Some(file) => response::respond_file(request, &file),
                None => response::respond_not_found(request),
            }
        }
        _ => response::respond_not_found(request),
    }
}

//! HTTP response helpers.
//!
//! Every response carries [`SECURITY_HEADERS`].

use anyhow::{Context, Result};
use std::io::Read;
use std::{fs, path::Path};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::utils::mime::types::{HTML, PLAIN};

/// Headers attached to every response, including the event stream.
pub const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("X-Content-Type-Options", "nosniff"),
    ("X-Frame-Options", "DENY"),
    ("Referrer-Policy", "no-referrer"),
    (
        "Content-Security-Policy",
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; \
         img-src 'self' data: https:; connect-src 'self'; object-src 'none'",
    ),
];

/// Respond with the rendered preview page.
pub fn respond_page(request: Request, page: &str) -> Result<()> {
    respond_bytes(request, 200, HTML, page.as_bytes().to_vec())
}

/// Respond with an in-memory asset.
pub fn respond_static(request: Request, content_type: &str, body: &str) -> Result<()> {
    respond_bytes(request, 200, content_type, body.as_bytes().to_vec())
}

/// Respond with a file from disk.
pub fn respond_file(request: Request, path: &Path) -> Result<()> {
    let content_type = crate::utils::mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    send_body(request, 200, content_type, body)
}

pub fn respond_not_found(request: Request) -> Result<()> {
    respond_bytes(request, 404, PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 405 for anything but GET/HEAD.
pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    let response = with_headers(
        Response::from_data(b"405 Method Not Allowed".to_vec()).with_status_code(StatusCode(405)),
        &[("Content-Type", PLAIN), ("Allow", "GET, HEAD")],
    );
    request.respond(response)?;
    Ok(())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    respond_bytes(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

pub fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

/// Body for GET, headers only for HEAD.
fn respond_bytes(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, status, content_type);
    }
    send_body(request, status, content_type, body)
}

fn send_head(request: Request, status: u16, content_type: &str) -> Result<()> {
    let response = with_headers(
        Response::empty(StatusCode(status)),
        &[("Content-Type", content_type)],
    );
    request.respond(response)?;
    Ok(())
}

fn send_body(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    let response = with_headers(
        Response::from_data(body).with_status_code(StatusCode(status)),
        &[("Content-Type", content_type)],
    );
    request.respond(response)?;
    Ok(())
}

/// Attach `extra` and the security headers.
fn with_headers<R: Read>(mut response: Response<R>, extra: &[(&str, &str)]) -> Response<R> {
    for (key, value) in extra.iter().chain(SECURITY_HEADERS) {
        if let Ok(header) = Header::from_bytes(key.as_bytes(), value.as_bytes()) {
            response.add_header(header);
        }
    }
    response
}

//! Server-Sent Events endpoint for live reload.
//!
//! Each `/events` client owns one thread that writes whatever the
//! [`SseChannel`] receives to the raw connection. A failed write ends the
//! stream and unregisters the channel.

use std::io::{self, Write};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use tiny_http::Request;

use super::response::SECURITY_HEADERS;
use crate::reload::message::{CONNECTED_COMMENT, KEEP_ALIVE_COMMENT};
use crate::reload::{AppContext, NotificationChannel};
use crate::debug;

/// URL of the event stream.
pub const EVENTS_URL: &str = "/events";

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Registry side of one event-stream client.
pub struct SseChannel {
    tx: Sender<String>,
}

impl NotificationChannel for SseChannel {
    fn write(&mut self, message: &str) -> io::Result<()> {
        self.tx
            .send(message.to_string())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "event stream closed"))
    }
}

/// Serve one event-stream client until it disconnects. Blocks.
pub fn serve_events(request: Request, ctx: &AppContext) {
    let mut writer = request.into_writer();

    let (tx, rx) = channel::unbounded();
    let id = ctx.registry().register(Box::new(SseChannel { tx }));

    let result = write_preamble(&mut writer).and_then(|()| stream_events(&mut writer, &rx));
    if let Err(e) = result {
        debug!("sse"; "stream closed: {}", e);
    }

    ctx.registry().unregister(id);
    debug!("sse"; "client disconnected ({} open)", ctx.registry().count());
}

/// Status line, headers and the initial comment.
fn write_preamble<W: Write + ?Sized>(writer: &mut W) -> io::Result<()> {
    let mut head = String::from(concat!(
        "HTTP/1.1 200 OK\r\n",
        "Content-Type: text/event-stream\r\n",
        "Cache-Control: no-cache\r\n",
        "Connection: keep-alive\r\n",
    ));
    for (key, value) in SECURITY_HEADERS {
        head.push_str(&format!("{key}: {value}\r\n"));
    }
    head.push_str("\r\n");
    head.push_str(CONNECTED_COMMENT);

    send(writer, &head)
}

/// Forward channel messages to the client, with keep-alive comments while idle.
fn stream_events<W: Write + ?Sized>(writer: &mut W, rx: &Receiver<String>) -> io::Result<()> {
    loop {
        match rx.recv_timeout(KEEP_ALIVE_INTERVAL) {
            Ok(message) => send(writer, &message)?,
            Err(RecvTimeoutError::Timeout) => {
                if crate::core::is_shutdown() {
                    return Ok(());
                }
                send(writer, KEEP_ALIVE_COMMENT)?;
            }
            Err(RecvTimeoutError::Disconnected) => return Ok(()),
        }
    }
}

fn send<W: Write + ?Sized>(writer: &mut W, text: &str) -> io::Result<()> {
    writer.write_all(text.as_bytes())?;
    writer.flush()
}

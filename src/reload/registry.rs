//! Connection registry for event-stream clients.
//!
//! Every open `/events` response is one [`NotificationChannel`]. The
//! registry owns them from `register` until `unregister`, and `broadcast`
//! fans a message out to all of them.
//!
//! ```text
//! GET /events --register--> ConnectionRegistry <--broadcast-- ReloadOrchestrator
//!      ^                          |
//!      +------unregister----------+ (stream closed)
//! ```

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// A one-way push connection to a single client.
pub trait NotificationChannel: Send {
    /// Deliver one message. An error means the client is gone.
    fn write(&mut self, message: &str) -> io::Result<()>;
}

/// Identity of a registered channel.
///
/// Issued by [`ConnectionRegistry::register`] and never reused, so two
/// channels are never considered equal even when they look alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(u64);

struct Registered {
    id: ChannelId,
    channel: Box<dyn NotificationChannel>,
}

/// Set of open notification channels, in registration order.
///
/// HTTP handler threads register/unregister while the orchestrator
/// broadcasts, so one mutex guards the whole list.
pub struct ConnectionRegistry {
    channels: Mutex<Vec<Registered>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Add a channel and return its identity.
    pub fn register(&self, channel: Box<dyn NotificationChannel>) -> ChannelId {
        let id = ChannelId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut channels = self.channels.lock();
        channels.push(Registered { id, channel });
        crate::debug!("sse"; "client registered ({} open)", channels.len());
        id
    }

    /// Remove a channel. Unknown or already removed ids are a no-op.
    pub fn unregister(&self, id: ChannelId) {
        self.channels.lock().retain(|entry| entry.id != id);
    }

    /// Write `message` to every registered channel, in registration order.
    ///
    /// A failing channel is skipped; it stays registered until its own
    /// stream notices the disconnect and unregisters it. Returns the number
    /// of successful deliveries.
    pub fn broadcast(&self, message: &str) -> usize {
        let mut channels = self.channels.lock();
        let mut delivered = 0;

        for entry in channels.iter_mut() {
            match entry.channel.write(message) {
                Ok(()) => delivered += 1,
                Err(e) => crate::debug!("sse"; "write to client {} failed: {}", entry.id.0, e),
            }
        }

        crate::debug!("sse"; "broadcast to {}/{} clients", delivered, channels.len());
        delivered
    }

    /// Number of registered channels (diagnostics only).
    pub fn count(&self) -> usize {
        self.channels.lock().len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

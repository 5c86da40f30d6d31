//! Live reload
//!
//! Keeps every open preview tab in sync with the content file (and, in
//! development mode, with rebuilds of the source tree).
//!
//! # Architecture
//!
//! ```text
//! ChangeWatcher -> ReloadOrchestrator -> AppContext (re-render)
//!                        |                   |
//!                        v                   v
//!               RebuildCoordinator -> ConnectionRegistry -> /events clients
//! ```
//!
//! # Modules
//!
//! - `context` - AppContext: content path, rendered page, open clients
//! - `message` - event stream wire format
//! - `orchestrator` - watcher wiring and the reload loop
//! - `rebuild` - at-most-one-at-a-time external rebuild
//! - `registry` - open notification channels and broadcast

mod context;
pub mod message;
mod orchestrator;
mod rebuild;
mod registry;

pub use context::AppContext;
pub use orchestrator::{ReloadMsg, ReloadOrchestrator};
pub use rebuild::{CommandRebuild, Rebuild, RebuildCoordinator, RebuildOutcome};
pub use registry::{ChannelId, ConnectionRegistry, NotificationChannel};

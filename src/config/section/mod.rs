//! Configuration sections of `mdlive.toml`.

mod rebuild;
mod serve;
mod watch;

pub use rebuild::RebuildConfig;
pub use serve::ServeConfig;
pub use watch::WatchConfig;

//! Logging bootstrap
//!
//! Opt-in global `tracing` subscriber for hosts and tools that do not
//! install their own. Library code only emits events; it never installs a
//! subscriber on its own.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install a global subscriber filtered by `RUST_LOG`, defaulting to `info`.
///
/// Does nothing if a subscriber is already installed.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

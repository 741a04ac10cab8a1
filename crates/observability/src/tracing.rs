//! Tracing setup for the workshop API process.
//!
//! One JSON line per event, filtered through `RUST_LOG` (default `info`).
//! The coordinator and stores emit debug/warn events through `tracing`;
//! this is the only place a subscriber is installed.

use tracing_subscriber::EnvFilter;

/// Install the process-wide subscriber.
///
/// Safe to call multiple times (subsequent calls are no-ops), which keeps
/// test binaries that spin up the full app from panicking.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}

//! Tracing setup shared by every binary in the workspace

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// `level` overrides the default filter; `RUST_LOG` takes precedence over
/// both. Safe to call more than once — later calls are ignored.
pub fn init_tracing(level: Option<&str>) {
    let default_filter = level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

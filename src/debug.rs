//! Debug logging setup
//!
//! Diagnostics go through `tracing` and are written to stderr so they never
//! interleave with the phase-tagged build output on stdout. The `--debug`
//! flag turns on `debug` level; otherwise `RUST_LOG` decides, defaulting to
//! warnings only.

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();

/// Initialize logging from the command-line flag
pub fn init_debug(enabled: bool) {
    let _ = DEBUG_ENABLED.set(enabled);

    let filter = if enabled {
        EnvFilter::new("ext_build=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
    {
        eprintln!("[DEBUG] logging already initialized: {err}");
    }
}

/// Check if debug mode is enabled
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.get().copied().unwrap_or(false)
}

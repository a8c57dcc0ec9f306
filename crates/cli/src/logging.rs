//! Tracing subscriber setup. Logs go to stderr so `--json` stdout stays clean.
//!
//! `RUST_LOG` overrides the default level, e.g. `RUST_LOG=shiftrev_recon=debug`.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. `quiet` lowers the default level to `error`.
pub fn init(quiet: bool) {
    let default_level = if quiet { "error" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

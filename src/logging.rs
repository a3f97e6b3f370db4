//! Diagnostics go to stderr; stdout carries only the wrapped tool's output.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (`RUST_LOG` syntax).
pub const LOG_ENV: &str = "CLAUDE_PTY_LOG";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .try_init();
}

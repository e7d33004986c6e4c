//! Structured logging setup.
//!
//! The embedding process calls [`init_tracing`] once with the configured log
//! level.  `RUST_LOG`, when set, overrides it.

use tracing_subscriber::EnvFilter;

/// Installs a global fmt subscriber.
///
/// Returns `false` if a global subscriber was already installed (for example
/// by the embedding process or an earlier call), in which case nothing
/// changes.
pub fn init_tracing(default_level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

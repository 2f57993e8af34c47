//! Tracing bootstrap for binaries and examples. Library code only emits
//! events; installing a subscriber is the embedder's call.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a formatted subscriber honoring `RUST_LOG`, defaulting to
/// `canvasflow=info`. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("canvasflow=info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

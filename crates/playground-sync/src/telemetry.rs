//! Tracing setup

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "playground=info,playground_sync=info";

/// Install a fmt subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
    {
        tracing::debug!("Tracing initialized");
    }
}

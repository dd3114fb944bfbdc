//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,larder_infra=debug";

/// Initialize tracing/logging for the process.
///
/// JSON output, filter from `RUST_LOG` with a debug default for the ledger
/// service. Safe to call multiple times; later calls are no-ops.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_current_span(true)
        .with_target(true)
        .try_init();
}

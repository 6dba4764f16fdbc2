//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Host default: engine lifecycle at `info` (container create/remove,
/// snapshot restore, rollbacks), everything else only from `warn`.
const HOST_FILTER: &str = "warn,stowage_inventory=info,stowage_events=warn";

/// Test default: per-admission `debug` records from the engine.
const TEST_FILTER: &str = "info,stowage_inventory=debug,stowage_events=debug";

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the process-wide subscriber for a host embedding the engine.
///
/// Writes JSON lines. `RUST_LOG` replaces the default directives
/// `warn,stowage_inventory=info,stowage_events=warn`. Repeat calls are no-ops.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(HOST_FILTER))
        .json()
        .with_current_span(false)
        .try_init();
}

/// Compact output captured per test; `RUST_LOG` overrides the
/// `stowage_inventory=debug` default.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(TEST_FILTER))
        .compact()
        .with_test_writer()
        .try_init();
}

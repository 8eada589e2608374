//! Shared helpers for integration tests.

use std::sync::Once;

static INIT: Once = Once::new();

/// Install a test-friendly tracing subscriber once per test binary.
///
/// Output is filtered by `RUST_LOG`, e.g. `RUST_LOG=fnkit=debug cargo test`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

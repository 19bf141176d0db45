use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging for the engine binary.
///
/// Output goes to stderr; stdout carries the JSON protocol. The level comes
/// from `RUST_LOG` (e.g. `RUST_LOG=metropal_engine=debug`), defaulting to
/// `warn`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// Verbose logging captured by the test harness. Safe to call repeatedly.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

//! Process-wide logging setup.

/// Initialize process-wide observability (structured logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    logging::init("info");
}

/// JSON log output filtered by `RUST_LOG`.
pub mod logging;

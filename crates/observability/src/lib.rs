//! Tracing and logging (shared setup).

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::{LogConfig, LogFormat};

/// Initialize process-wide observability with defaults (`info`, JSON).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(&LogConfig::default());
}

/// Initialize process-wide observability from explicit settings.
pub fn init_with(config: &LogConfig) {
    tracing::init(config);
}

//! Console logging for embedding applications and tests
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the caller. `init_logging` is a convenience for binaries and test harnesses.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to `level`
///
/// Calling it again, or after another global subscriber was installed, does
/// nothing.
pub fn init_logging(level: &str) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_filter(filter),
        );
        if subscriber.try_init().is_err() {
            tracing::debug!("global tracing subscriber already initialized");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging("debug");
        init_logging("trace");
        tracing::debug!(field = "x", "still logging");
    }
}

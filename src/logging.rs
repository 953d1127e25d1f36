//! Structured logging for bridge hosts.
//!
//! The bridge emits `tracing` events and spans: one span per operation
//! (`bridge.check`, `bridge.diff`, `bridge.create`, ...) and `debug`/`trace`
//! events from the differ. These helpers install a subscriber that writes to
//! **stderr**, leaving stdout to the host protocol.
//!
//! Filtering follows `RUST_LOG`:
//!
//! ```bash
//! # Per-operation summaries
//! RUST_LOG=info ./my-bridge
//!
//! # Every changed path the differ finds
//! RUST_LOG=hemmer_provider_bridge::diff=trace ./my-bridge
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Level used when `RUST_LOG` is unset.
const DEFAULT_LEVEL: &str = "info";

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn stderr_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer::<S>()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

/// Install the stderr subscriber, defaulting to `info`.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default(DEFAULT_LEVEL);
}

/// Install the stderr subscriber with a custom default level, used when
/// `RUST_LOG` is unset.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    tracing_subscriber::registry()
        .with(filter(default_level))
        .with(stderr_layer())
        .init();
}

/// Install the stderr subscriber unless one is already set.
///
/// Returns whether this call installed it.
pub fn try_init_logging() -> bool {
    tracing_subscriber::registry()
        .with(filter(DEFAULT_LEVEL))
        .with(stderr_layer())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives() {
        assert!(EnvFilter::try_new(DEFAULT_LEVEL).is_ok());
        assert!(EnvFilter::try_new("hemmer_provider_bridge=debug").is_ok());
        assert!(EnvFilter::try_new("warn,hemmer_provider_bridge::diff=trace").is_ok());
    }

    #[test]
    fn test_try_init_is_idempotent() {
        try_init_logging();
        assert!(!try_init_logging());
    }
}

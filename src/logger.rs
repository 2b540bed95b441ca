//! # Logging Infrastructure Module
//!
//! Internal diagnostics of this crate (lazy loads, toggles, persistence
//! failures, subscriber panics) go through the `tracing` ecosystem. So do
//! emitted lines when the default [`crate::sink::TracingSink`] is used.
//!
//! ## Environment Configuration
//!
//! Set the `RUST_LOG` environment variable to control output:
//! - `RUST_LOG=verbosity=debug` - everything from this crate
//! - `RUST_LOG=verbosity::sink=info,warn` - emitted lines and warnings only

use crate::constants::DEFAULT_LOG_FILTER;
use once_cell::sync::Lazy;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static FALLBACK_FILTER: Lazy<Mutex<String>> =
    Lazy::new(|| Mutex::new(DEFAULT_LOG_FILTER.to_string()));

/// Initialize the global logger with the default fallback filter.
///
/// Safe to call several times; only the first call installs a subscriber.
pub fn init_logger() -> Result<(), Box<dyn std::error::Error>> {
    static INIT: Lazy<()> = Lazy::new(|| {
        let fallback = FALLBACK_FILTER
            .lock()
            .map(|f| f.clone())
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

        // try_init so a host that already installed a subscriber keeps it
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(true)
                    .with_level(true)
                    .with_line_number(true),
            )
            .try_init();
    });

    Lazy::force(&INIT);
    Ok(())
}

/// Initialize the global logger, using `filter` when `RUST_LOG` is unset.
///
/// Has no effect on the filter if a logger was already initialized.
pub fn init_logger_with_filter(filter: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Ok(mut fallback) = FALLBACK_FILTER.lock() {
        *fallback = filter.to_string();
    }
    init_logger()
}

/// Convenience re-export of log macros
pub mod log {
    pub use tracing::{debug, error, info, warn};
}

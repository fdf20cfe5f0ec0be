#![forbid(unsafe_code)]

//! Logging bootstrap for hosts embedding the board.
//!
//! Library crates only emit `tracing` events. A host that has no subscriber
//! of its own can call [`init_logging`] once at startup. The filter is read
//! from `PINBOARD_LOG` using `EnvFilter` syntax (for example
//! `PINBOARD_LOG=pinboard.drag=trace,info`).

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "PINBOARD_LOG";

const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a human-readable subscriber.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_logging() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Install a JSON-lines subscriber for production log shipping.
///
/// Returns `false` if a global subscriber was already installed.
#[cfg(feature = "tracing-json")]
pub fn init_json_logging() -> bool {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter())
        .with_current_span(false)
        .try_init()
        .is_ok()
}

// Re-export tracing macros so hosts need not depend on tracing directly.
pub use tracing::{debug, error, info, trace, warn};
